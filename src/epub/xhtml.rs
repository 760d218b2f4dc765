//! Minimal per-chapter XHTML → document-model transform (C10's delegate to
//! an "HTML document collaborator"). Spec §1 treats full HTML parsing as an
//! external black box; this walks the body's block-level tags with the same
//! `quick_xml` event idiom the DOCX/EPUB readers use elsewhere, producing
//! headings/paragraphs/lists/tables/images — not a general HTML renderer.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::model::{Cell, Element, ListItem};

use super::xml_util::get_attribute_ns;

/// Transform one chapter's XHTML bytes into body elements.
pub fn transform(xml: &str) -> Vec<Element> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    reader.check_end_names(false);
    let mut buf = Vec::new();

    let mut elements = Vec::new();
    let mut text_stack: Vec<String> = vec![String::new()];
    let mut heading_level: Option<u8> = None;
    let mut in_body = false;

    let mut list_stack: Vec<(bool, Vec<ListItem>)> = Vec::new();
    let mut list_item_level = 0usize;

    let mut table_rows: Option<Vec<Vec<Cell>>> = None;
    let mut table_row: Vec<Cell> = Vec::new();
    let mut in_table_header_cell = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                match e.local_name().as_ref() {
                    b"body" => in_body = true,
                    b"h1" => heading_level = Some(1),
                    b"h2" => heading_level = Some(2),
                    b"h3" => heading_level = Some(3),
                    b"h4" => heading_level = Some(4),
                    b"h5" => heading_level = Some(5),
                    b"h6" => heading_level = Some(6),
                    b"p" | b"div" => text_stack.push(String::new()),
                    b"ul" => list_stack.push((false, Vec::new())),
                    b"ol" => list_stack.push((true, Vec::new())),
                    b"li" => {
                        text_stack.push(String::new());
                        list_item_level = list_stack.len().saturating_sub(1);
                    },
                    b"table" => table_rows = Some(Vec::new()),
                    b"tr" => table_row = Vec::new(),
                    b"th" => {
                        in_table_header_cell = true;
                        text_stack.push(String::new());
                    },
                    b"td" => {
                        in_table_header_cell = false;
                        text_stack.push(String::new());
                    },
                    b"img" => {
                        let alt = get_attribute_ns(&e, "alt");
                        elements.push(Element::Image(crate::model::Image {
                            bytes: Vec::new(),
                            format: String::new(),
                            bbox: None,
                            dpi: None,
                            alt_text: alt,
                        }));
                    },
                    b"br" => {
                        if let Some(top) = text_stack.last_mut() {
                            top.push('\n');
                        }
                    },
                    _ => {},
                }
            },
            Ok(Event::Text(e)) | Ok(Event::CData(e)) => {
                if in_body {
                    if let Some(top) = text_stack.last_mut() {
                        top.push_str(&e.unescape().unwrap_or_default().to_string());
                    }
                }
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"h1" | b"h2" | b"h3" | b"h4" | b"h5" | b"h6" => {
                    if let Some(level) = heading_level.take() {
                        let text = text_stack.last_mut().map(std::mem::take).unwrap_or_default();
                        let trimmed = text.trim().to_string();
                        if !trimmed.is_empty() {
                            elements.push(Element::Heading { level, text: trimmed });
                        }
                    }
                },
                b"p" | b"div" => {
                    let text = text_stack.pop().unwrap_or_default();
                    let trimmed = text.trim().to_string();
                    if let Some(parent) = text_stack.last_mut() {
                        if !trimmed.is_empty() && !list_stack.is_empty() {
                            // block inside a <li>; fold into the item text
                            if !parent.is_empty() {
                                parent.push(' ');
                            }
                            parent.push_str(&trimmed);
                            continue;
                        }
                    }
                    if !trimmed.is_empty() && table_rows.is_none() {
                        elements.push(Element::Paragraph(trimmed));
                    }
                },
                b"li" => {
                    let text = text_stack.pop().unwrap_or_default();
                    let trimmed = text.trim().to_string();
                    if let Some((_, items)) = list_stack.last_mut() {
                        items.push(ListItem { text: trimmed, level: list_item_level, bullet: String::new() });
                    }
                },
                b"ul" | b"ol" => {
                    if let Some((ordered, items)) = list_stack.pop() {
                        if !items.is_empty() {
                            elements.push(Element::List { ordered, items });
                        }
                    }
                },
                b"td" | b"th" => {
                    let text = text_stack.pop().unwrap_or_default();
                    let mut cell = Cell::new(text.trim().to_string());
                    cell.is_header = in_table_header_cell;
                    table_row.push(cell);
                },
                b"tr" => {
                    if let Some(rows) = table_rows.as_mut() {
                        rows.push(std::mem::take(&mut table_row));
                    }
                },
                b"table" => {
                    if let Some(rows) = table_rows.take() {
                        if !rows.is_empty() {
                            elements.push(Element::Table { rows, has_grid: true, confidence: 0.8 });
                        }
                    }
                },
                b"body" => in_body = false,
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {},
        }
        buf.clear();
    }

    elements
}
