//! Parses `word/document.xml`'s body into an ordered sequence of items
//! (paragraphs and tables), preserving body order so lists can be grouped
//! and tables interleaved correctly (spec §4.9 "Text rendering").

use quick_xml::events::Event;
use quick_xml::Reader;

use super::table::{parse_table_events, ParsedTable};
use super::xml_util::get_attribute;

/// A parsed paragraph, independent of whether it turns out to be a heading,
/// list item, or plain paragraph — that classification happens downstream
/// once the style sheet and numbering resolver are available.
#[derive(Debug, Clone, Default)]
pub struct RawParagraph {
    pub style_id: Option<String>,
    pub num_id: Option<String>,
    pub ilvl: u32,
    pub text: String,
    /// Largest run font size seen (half-points converted to points), used
    /// only as a heading-detection fallback when no explicit style applies.
    pub max_run_size: Option<f64>,
    pub any_run_bold: bool,
}

/// One item of document body order.
#[derive(Debug, Clone)]
pub enum BodyItem {
    Paragraph(RawParagraph),
    Table(ParsedTable),
}

/// Parse a full `word/document.xml` string into body-order items.
pub fn parse_body(xml: &str) -> Vec<BodyItem> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut items = Vec::new();

    let mut cur_para: Option<RawParagraph> = None;
    let mut in_run = false;
    let mut in_run_text = false;
    let mut cur_run_bold = false;
    let mut cur_run_size: Option<f64> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"tbl" => {
                let mut depth = 1i32;
                let mut table_events: Vec<Event<'static>> = vec![Event::Start(e.into_owned())];
                let mut tbuf = Vec::new();
                loop {
                    match reader.read_event_into(&mut tbuf) {
                        Ok(Event::Eof) => break,
                        Ok(ev) => {
                            match &ev {
                                Event::Start(s) if s.local_name().as_ref() == b"tbl" => depth += 1,
                                Event::End(s) if s.local_name().as_ref() == b"tbl" => depth -= 1,
                                _ => {},
                            }
                            let owned = ev.into_owned();
                            let done = depth <= 0;
                            table_events.push(owned);
                            if done {
                                break;
                            }
                        },
                        Err(_) => break,
                    }
                    tbuf.clear();
                }
                items.push(BodyItem::Table(parse_table_events(table_events.into_iter())));
            },
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                match e.local_name().as_ref() {
                    b"p" => {
                        cur_para = Some(RawParagraph::default());
                    },
                    b"pStyle" => {
                        if let Some(p) = cur_para.as_mut() {
                            p.style_id = get_attribute(&e, "val");
                        }
                    },
                    b"numId" => {
                        if let Some(p) = cur_para.as_mut() {
                            p.num_id = get_attribute(&e, "val");
                        }
                    },
                    b"ilvl" => {
                        if let Some(p) = cur_para.as_mut() {
                            p.ilvl = get_attribute(&e, "val").and_then(|v| v.parse().ok()).unwrap_or(0);
                        }
                    },
                    b"r" => in_run = true,
                    b"b" => {
                        if in_run {
                            cur_run_bold = super::xml_util::ooxml_bool(&e);
                        }
                    },
                    b"sz" => {
                        if in_run {
                            cur_run_size = get_attribute(&e, "val")
                                .and_then(|v| v.parse::<f64>().ok())
                                .map(super::xml_util::half_points_to_points);
                        }
                    },
                    b"t" => in_run_text = true,
                    b"tab" => {
                        if let Some(p) = cur_para.as_mut() {
                            p.text.push('\t');
                        }
                    },
                    b"br" => {
                        if let Some(p) = cur_para.as_mut() {
                            p.text.push('\n');
                        }
                    },
                    _ => {},
                }
            },
            Ok(Event::Text(e)) => {
                if in_run_text {
                    if let Some(p) = cur_para.as_mut() {
                        p.text.push_str(&e.unescape().unwrap_or_default());
                    }
                }
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_run_text = false,
                b"r" => {
                    if let Some(p) = cur_para.as_mut() {
                        if cur_run_bold {
                            p.any_run_bold = true;
                        }
                        if let Some(sz) = cur_run_size {
                            p.max_run_size = Some(p.max_run_size.map_or(sz, |m: f64| m.max(sz)));
                        }
                    }
                    in_run = false;
                    cur_run_bold = false;
                    cur_run_size = None;
                },
                b"p" => {
                    if let Some(p) = cur_para.take() {
                        items.push(BodyItem::Paragraph(p));
                    }
                },
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {},
        }
        buf.clear();
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_paragraph_text_and_style() {
        let xml = r#"<w:document><w:body>
            <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Title</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let items = parse_body(xml);
        assert_eq!(items.len(), 1);
        match &items[0] {
            BodyItem::Paragraph(p) => {
                assert_eq!(p.style_id.as_deref(), Some("Heading1"));
                assert_eq!(p.text, "Title");
            },
            _ => panic!("expected paragraph"),
        }
    }

    #[test]
    fn numbered_paragraphs_carry_num_id_and_level() {
        let xml = r#"<w:document><w:body>
            <w:p><w:pPr><w:numPr><w:ilvl w:val="1"/><w:numId w:val="3"/></w:numPr></w:pPr><w:r><w:t>Item</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let items = parse_body(xml);
        match &items[0] {
            BodyItem::Paragraph(p) => {
                assert_eq!(p.num_id.as_deref(), Some("3"));
                assert_eq!(p.ilvl, 1);
            },
            _ => panic!("expected paragraph"),
        }
    }

    #[test]
    fn table_and_paragraph_interleave_in_body_order() {
        let xml = r#"<w:document><w:body>
            <w:p><w:r><w:t>Before</w:t></w:r></w:p>
            <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
            <w:p><w:r><w:t>After</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let items = parse_body(xml);
        assert_eq!(items.len(), 3);
        assert!(matches!(items[0], BodyItem::Paragraph(_)));
        assert!(matches!(items[1], BodyItem::Table(_)));
        assert!(matches!(items[2], BodyItem::Paragraph(_)));
    }
}
