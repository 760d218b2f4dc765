//! `META-INF/container.xml` and OPF package-document parsing (C10): locates
//! the rootfile, then parses metadata, manifest, and spine (spec §4.10).

use indexmap::IndexMap;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::model::Metadata;

use super::xml_util::get_attribute_ns;

/// One `<manifest><item>` entry.
#[derive(Debug, Clone)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub properties: Vec<String>,
}

/// One `<spine><itemref>` entry.
#[derive(Debug, Clone)]
pub struct SpineItem {
    pub idref: String,
    pub linear: bool,
}

/// The parsed OPF package document.
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub metadata: Metadata,
    pub manifest: IndexMap<String, ManifestItem>,
    pub spine: Vec<SpineItem>,
    pub version: String,
}

/// Parse `META-INF/container.xml`, returning the `full-path` of the
/// preferred rootfile: the first whose `media-type` is
/// `application/oebps-package+xml` or empty, else the first rootfile at all.
pub fn parse_container(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut first: Option<String> = None;
    let mut preferred: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"rootfile" {
                    let full_path = get_attribute_ns(&e, "full-path");
                    let media_type = get_attribute_ns(&e, "media-type").unwrap_or_default();
                    if let Some(path) = full_path {
                        if first.is_none() {
                            first = Some(path.clone());
                        }
                        if preferred.is_none() && (media_type == "application/oebps-package+xml" || media_type.is_empty()) {
                            preferred = Some(path);
                        }
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::InvalidStructure(format!("container.xml: {e}"))),
            _ => {},
        }
        buf.clear();
    }

    preferred.or(first).ok_or(Error::MissingRequired("META-INF/container.xml rootfile".to_string()))
}

/// Parse the OPF package document at `opf_xml`.
pub fn parse_opf(xml: &str) -> Result<Package> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut package = Package::default();
    let mut in_metadata = false;
    let mut current_meta_field: Option<&'static str> = None;
    let mut current_meta_is_modified = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                match e.local_name().as_ref() {
                    b"package" => {
                        package.version = get_attribute_ns(&e, "version").unwrap_or_else(|| "2.0".to_string());
                    },
                    b"metadata" => in_metadata = true,
                    b"title" if in_metadata => current_meta_field = Some("title"),
                    b"creator" if in_metadata => current_meta_field = Some("creator"),
                    b"language" if in_metadata => current_meta_field = Some("language"),
                    b"identifier" if in_metadata => current_meta_field = Some("identifier"),
                    b"publisher" if in_metadata => current_meta_field = Some("publisher"),
                    b"date" if in_metadata => current_meta_field = Some("date"),
                    b"description" if in_metadata => current_meta_field = Some("description"),
                    b"subject" if in_metadata => current_meta_field = Some("subject"),
                    b"rights" if in_metadata => current_meta_field = Some("rights"),
                    b"meta" if in_metadata => {
                        let property = get_attribute_ns(&e, "property").unwrap_or_default();
                        current_meta_is_modified = property == "dcterms:modified";
                        current_meta_field = if current_meta_is_modified { Some("modified") } else { None };
                    },
                    b"item" => {
                        if let (Some(id), Some(href)) = (get_attribute_ns(&e, "id"), get_attribute_ns(&e, "href")) {
                            let media_type = get_attribute_ns(&e, "media-type").unwrap_or_default();
                            let properties = get_attribute_ns(&e, "properties")
                                .map(|p| p.split_whitespace().map(|s| s.to_string()).collect())
                                .unwrap_or_default();
                            package.manifest.insert(id.clone(), ManifestItem { id, href, media_type, properties });
                        }
                    },
                    b"itemref" => {
                        if let Some(idref) = get_attribute_ns(&e, "idref") {
                            let linear = get_attribute_ns(&e, "linear").map(|v| v != "no").unwrap_or(true);
                            package.spine.push(SpineItem { idref, linear });
                        }
                    },
                    _ => {},
                }
            },
            Ok(Event::Text(e)) => {
                if let Some(field) = current_meta_field {
                    let text = e.unescape().unwrap_or_default().to_string();
                    apply_metadata_field(&mut package.metadata, field, text);
                }
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"metadata" => in_metadata = false,
                b"title" | b"creator" | b"language" | b"identifier" | b"publisher" | b"date" | b"description"
                | b"subject" | b"rights" | b"meta" => current_meta_field = None,
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::InvalidStructure(format!("OPF package document: {e}"))),
            _ => {},
        }
        buf.clear();
    }

    if package.spine.is_empty() {
        return Err(Error::EmptySpine);
    }

    Ok(package)
}

fn apply_metadata_field(metadata: &mut Metadata, field: &str, text: String) {
    match field {
        "title" => metadata.title = Some(text),
        "creator" => metadata.authors.push(text),
        "language" => metadata.language = Some(text),
        "identifier" => metadata.identifier = Some(text),
        "publisher" => metadata.publisher = Some(text),
        "date" => metadata.created = Some(text),
        "description" => metadata.description = Some(text),
        "subject" => metadata.keywords.push(text),
        "rights" => metadata.rights = Some(text),
        "modified" => metadata.modified = Some(text),
        _ => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_prefers_oebps_package_rootfile() {
        let xml = r#"<container>
            <rootfiles>
                <rootfile full-path="foo.opf" media-type="text/plain"/>
                <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
            </rootfiles>
        </container>"#;
        assert_eq!(parse_container(xml).unwrap(), "OEBPS/content.opf");
    }

    #[test]
    fn container_missing_rootfile_errors() {
        let xml = r#"<container><rootfiles></rootfiles></container>"#;
        assert!(parse_container(xml).is_err());
    }

    #[test]
    fn opf_parses_manifest_and_spine() {
        let xml = r#"<package version="3.0">
            <metadata>
                <dc:title>My Book</dc:title>
                <dc:creator>Jane Doe</dc:creator>
            </metadata>
            <manifest>
                <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
                <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
            </manifest>
            <spine>
                <itemref idref="c1"/>
            </spine>
        </package>"#;
        let package = parse_opf(xml).unwrap();
        assert_eq!(package.metadata.title.as_deref(), Some("My Book"));
        assert_eq!(package.manifest.len(), 2);
        assert_eq!(package.spine.len(), 1);
        assert_eq!(package.spine[0].idref, "c1");
        assert!(package.manifest["nav"].properties.contains(&"nav".to_string()));
    }

    #[test]
    fn opf_empty_spine_errors() {
        let xml = r#"<package version="2.0"><metadata></metadata><manifest></manifest><spine></spine></package>"#;
        assert!(matches!(parse_opf(xml), Err(Error::EmptySpine)));
    }
}
