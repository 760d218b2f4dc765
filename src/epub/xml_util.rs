//! Small shared helpers for walking EPUB's XML parts (container, OPF, NCX,
//! nav-XHTML) with `quick_xml`.

use quick_xml::events::BytesStart;

/// Get an attribute's value by local name, namespace-prefix-agnostic.
pub fn get_attribute_ns(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes().flatten().find(|a| a.key.local_name().as_ref() == name.as_bytes()).map(|a| {
        String::from_utf8_lossy(&a.value).to_string()
    })
}

/// Resolve an href relative to a base directory (the OPF's own directory,
/// or a chapter's directory for same-document fragment links), with
/// percent-decoding. Pure lexical resolution — `..`/`.` segments collapse,
/// no filesystem access.
pub fn resolve_relative(base_dir: &str, href: &str) -> String {
    let decoded = percent_decode(href);
    let href_path = decoded.split('#').next().unwrap_or(&decoded);
    if base_dir.is_empty() {
        return normalize_path(href_path);
    }
    normalize_path(&format!("{base_dir}/{href_path}"))
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(hex) = std::str::from_utf8(&bytes[i + 1..i + 3]) {
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).to_string()
}

fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {},
            ".." => {
                parts.pop();
            },
            other => parts.push(other),
        }
    }
    parts.join("/")
}
