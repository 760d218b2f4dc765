//! DOCX table parser (C9): grid widths, `gridSpan`, vertical merges, borders,
//! shading, alignment, per spec §4.9.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::xml_util::{get_attribute, twips_to_points};
use crate::model::Cell;

/// One `w:tbl`, parsed into a row/cell grid plus table-level attributes.
#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    pub rows: Vec<Vec<Cell>>,
    pub has_borders: bool,
    pub column_widths: Vec<f64>,
}

/// Parse a single `<w:tbl>...</w:tbl>` fragment (the caller has already
/// isolated the element's outer XML, or hands the whole document and this
/// function is invoked as a sub-reader over the buffered event range).
pub fn parse_table_events<'a, I>(events: I) -> ParsedTable
where
    I: Iterator<Item = Event<'a>>,
{
    let mut table = ParsedTable::default();
    let mut current_row: Vec<RawCell> = Vec::new();
    let mut row_is_header = false;
    let mut in_row = false;

    let mut current_cell: Option<RawCell> = None;
    let mut in_paragraph_text = false;
    let mut cur_para_text = String::new();
    let mut depth_tbl = 0i32;

    let mut all_rows: Vec<(Vec<RawCell>, bool)> = Vec::new();

    for event in events {
        match event {
            Event::Start(e) | Event::Empty(e) => {
                match e.local_name().as_ref() {
                    b"tbl" => depth_tbl += 1,
                    b"gridCol" => {
                        if let Some(w) = get_attribute(&e, "w").and_then(|v| v.parse::<f64>().ok()) {
                            table.column_widths.push(twips_to_points(w));
                        }
                    },
                    b"tblBorders" => {},
                    b"top" | b"bottom" | b"left" | b"right" | b"insideH" | b"insideV" => {
                        if let Some(val) = get_attribute(&e, "val") {
                            if !val.is_empty() && val != "nil" {
                                table.has_borders = true;
                            }
                        }
                    },
                    b"tr" => {
                        in_row = true;
                        current_row = Vec::new();
                        row_is_header = false;
                    },
                    b"tblHeader" => {
                        if in_row {
                            row_is_header = true;
                        }
                    },
                    b"tc" => {
                        current_cell = Some(RawCell::default());
                    },
                    b"gridSpan" => {
                        if let (Some(cell), Some(v)) =
                            (current_cell.as_mut(), get_attribute(&e, "val").and_then(|v| v.parse::<usize>().ok()))
                        {
                            cell.col_span = v.max(1);
                        }
                    },
                    b"vMerge" => {
                        if let Some(cell) = current_cell.as_mut() {
                            cell.v_merge = Some(get_attribute(&e, "val").unwrap_or_default());
                        }
                    },
                    b"shd" => {
                        if let Some(cell) = current_cell.as_mut() {
                            if let Some(fill) = get_attribute(&e, "fill") {
                                if fill != "auto" {
                                    cell.shading = Some(fill);
                                }
                            }
                        }
                    },
                    b"vAlign" => {
                        if let Some(cell) = current_cell.as_mut() {
                            cell.v_align = get_attribute(&e, "val").unwrap_or_else(|| "top".to_string());
                        }
                    },
                    b"tcW" => {
                        if let Some(cell) = current_cell.as_mut() {
                            let ty = get_attribute(&e, "type").unwrap_or_default();
                            let w = get_attribute(&e, "w").and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0);
                            cell.width = match ty.as_str() {
                                "pct" => Some(w / 50.0),
                                "auto" => Some(0.0),
                                _ => Some(twips_to_points(w)),
                            };
                        }
                    },
                    b"t" => in_paragraph_text = true,
                    _ => {},
                }
            },
            Event::Text(e) => {
                if in_paragraph_text {
                    cur_para_text.push_str(&e.unescape().unwrap_or_default());
                }
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_paragraph_text = false,
                b"p" => {
                    if let Some(cell) = current_cell.as_mut() {
                        if !cell.text.is_empty() {
                            cell.text.push('\n');
                        }
                        cell.text.push_str(&cur_para_text);
                    }
                    cur_para_text.clear();
                },
                b"tc" => {
                    if let Some(cell) = current_cell.take() {
                        current_row.push(cell);
                    }
                },
                b"tr" => {
                    in_row = false;
                    all_rows.push((std::mem::take(&mut current_row), row_is_header));
                },
                b"tbl" => {
                    depth_tbl -= 1;
                    if depth_tbl <= 0 {
                        break;
                    }
                },
                _ => {},
            },
            _ => {},
        }
    }

    table.rows = compute_row_spans(all_rows);
    table
}

#[derive(Debug, Clone, Default)]
struct RawCell {
    text: String,
    col_span: usize,
    v_merge: Option<String>,
    shading: Option<String>,
    v_align: String,
    width: Option<f64>,
}

/// Second pass (spec §4.9): track, per column index, the row of the most
/// recent `vMerge="restart"`; each `vMerge`-continuation cell increments
/// that originating cell's `row_span`. Column index advances by `col_span`.
fn compute_row_spans(raw_rows: Vec<(Vec<RawCell>, bool)>) -> Vec<Vec<Cell>> {
    let mut out: Vec<Vec<Cell>> = raw_rows
        .iter()
        .map(|(row, is_header)| {
            row.iter()
                .map(|rc| {
                    let mut cell = Cell::new(rc.text.clone());
                    cell.col_span = rc.col_span.max(1);
                    cell.row_span = 1;
                    cell.is_header = *is_header;
                    if let Some(shading) = &rc.shading {
                        cell.style.insert("shading".to_string(), shading.clone());
                    }
                    cell.style.insert("valign".to_string(), if rc.v_align.is_empty() { "top".to_string() } else { rc.v_align.clone() });
                    if let Some(w) = rc.width {
                        cell.style.insert("width".to_string(), w.to_string());
                    }
                    cell
                })
                .collect::<Vec<_>>()
        })
        .collect();

    // restart_row[col] = (row_idx, cell_idx) of the cell that started the merge.
    let mut restart_at: std::collections::HashMap<usize, (usize, usize)> = std::collections::HashMap::new();

    for (row_idx, (raw_row, _)) in raw_rows.iter().enumerate() {
        let mut col = 0usize;
        for (cell_idx, rc) in raw_row.iter().enumerate() {
            let span = rc.col_span.max(1);
            match rc.v_merge.as_deref() {
                Some("restart") => {
                    restart_at.insert(col, (row_idx, cell_idx));
                },
                Some(_continuation) => {
                    if let Some(&(origin_row, origin_cell)) = restart_at.get(&col) {
                        out[origin_row][origin_cell].row_span += 1;
                    }
                },
                None => {
                    restart_at.remove(&col);
                },
            }
            col += span;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::Reader;

    fn events_of(xml: &str) -> Vec<Event<'static>> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut buf = Vec::new();
        let mut out = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Eof) => break,
                Ok(ev) => out.push(ev.into_owned()),
                Err(_) => break,
            }
            buf.clear();
        }
        out
    }

    #[test]
    fn grid_span_expands_column_count() {
        let xml = r#"<w:tbl>
            <w:tr><w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>A</w:t></w:r></w:p></w:tc>
                   <w:tc><w:p><w:r><w:t>B</w:t></w:r></w:p></w:tc></w:tr>
            <w:tr><w:tc><w:p><w:r><w:t>C</w:t></w:r></w:p></w:tc>
                   <w:tc><w:p><w:r><w:t>D</w:t></w:r></w:p></w:tc>
                   <w:tc><w:p><w:r><w:t>E</w:t></w:r></w:p></w:tc></w:tr>
        </w:tbl>"#;
        let table = parse_table_events(events_of(xml).into_iter());
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0].col_span, 2);
        assert_eq!(table.rows[0][0].text, "A");
        assert_eq!(table.rows[0][1].text, "B");
        assert_eq!(table.rows[1][2].text, "E");
    }

    #[test]
    fn vertical_merge_increments_row_span() {
        let xml = r#"<w:tbl>
            <w:tr><w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p><w:r><w:t>A</w:t></w:r></w:p></w:tc></w:tr>
            <w:tr><w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc></w:tr>
        </w:tbl>"#;
        let table = parse_table_events(events_of(xml).into_iter());
        assert_eq!(table.rows[0][0].row_span, 2);
    }

    #[test]
    fn borders_detected_unless_nil() {
        let xml = r#"<w:tbl><w:tblPr><w:tblBorders><w:top w:val="single"/></w:tblBorders></w:tblPr>
            <w:tr><w:tc><w:p/></w:tc></w:tr></w:tbl>"#;
        let table = parse_table_events(events_of(xml).into_iter());
        assert!(table.has_borders);
    }
}
