//! Small shared helpers for walking OOXML's `quick_xml` event stream.

use quick_xml::events::BytesStart;

/// Get an attribute's value by its local name (namespace prefix-agnostic),
/// the same convention the teacher's DOCX converter uses.
pub fn get_attribute(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes().flatten().find(|a| a.key.local_name().as_ref() == name.as_bytes()).map(|a| {
        String::from_utf8_lossy(&a.value).to_string()
    })
}

/// OOXML's `val`-less-means-true boolean convention (spec §4.9): presence
/// with no `val`, or `val` in `{"true","1",""}`, means true; `{"false","0"}`
/// means false.
pub fn ooxml_bool(e: &BytesStart) -> bool {
    match get_attribute(e, "val") {
        None => true,
        Some(v) => !matches!(v.as_str(), "false" | "0"),
    }
}

/// Twips → points (1440 twips = 1 inch, 20 twips = 1 point).
pub fn twips_to_points(twips: f64) -> f64 {
    twips / 20.0
}

/// Half-points → points (OOXML font-size unit).
pub fn half_points_to_points(half_points: f64) -> f64 {
    half_points / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twips_conversion() {
        assert_eq!(twips_to_points(1440.0), 72.0);
    }

    #[test]
    fn half_points_conversion() {
        assert_eq!(half_points_to_points(28.0), 14.0);
    }
}
