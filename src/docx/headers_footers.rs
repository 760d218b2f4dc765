//! Header/footer text collection, for the `ExcludeHeaders`/`ExcludeFooters`
//! extraction options (spec §4.9 "Headers/footers exclusion").

use super::document_xml::{parse_body, BodyItem};

/// Collect the plain text of every paragraph in a header or footer part's
/// XML, trimmed, for exact-match exclusion against body paragraphs.
pub fn collect_texts(xml: &str) -> Vec<String> {
    parse_body(xml)
        .into_iter()
        .filter_map(|item| match item {
            BodyItem::Paragraph(p) => {
                let trimmed = p.text.trim().to_string();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed)
                }
            },
            BodyItem::Table(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_non_empty_paragraph_text() {
        let xml = r#"<w:hdr><w:p><w:r><w:t>  Company Confidential  </w:t></w:r></w:p>
            <w:p><w:r><w:t></w:t></w:r></w:p></w:hdr>"#;
        let texts = collect_texts(xml);
        assert_eq!(texts, vec!["Company Confidential".to_string()]);
    }
}
