//! DOCX style-inheritance resolver (C9): parses `word/styles.xml` into a
//! map of `styleId → StyleDef`, walks each style's `basedOn` chain into a
//! fully-resolved `ResolvedStyle`, and detects headings from the result.
//!
//! Per spec §4.9: defaults are font "Calibri", size 11pt, alignment left,
//! space-after 8pt, line spacing auto; `docDefaults/rPrDefault` may override
//! the default font/size.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::{HashMap, HashSet};

use super::xml_util::{get_attribute, half_points_to_points};

#[derive(Debug, Clone, Default)]
struct StyleDef {
    based_on: Option<String>,
    name: Option<String>,
    outline_level: Option<u8>,
    bold: Option<bool>,
    italic: Option<bool>,
    font_size: Option<f64>,
    alignment: Option<String>,
    space_after: Option<f64>,
}

/// The fully cascaded properties that apply to a paragraph using a style.
#[derive(Debug, Clone)]
pub struct ResolvedStyle {
    pub name: String,
    pub outline_level: Option<u8>,
    pub bold: bool,
    pub italic: bool,
    pub font_size: f64,
    pub alignment: String,
    pub space_after: f64,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        ResolvedStyle {
            name: String::new(),
            outline_level: None,
            bold: false,
            italic: false,
            font_size: 11.0,
            alignment: "left".to_string(),
            space_after: 8.0,
        }
    }
}

/// Parsed `word/styles.xml`: the style table plus document-wide defaults.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    styles: HashMap<String, StyleDef>,
    default_font_size: f64,
}

impl StyleSheet {
    /// Parse a `word/styles.xml` document. Absence/parse failure of this
    /// optional part is handled by the caller (spec §7: swallow, don't fail).
    pub fn parse(xml: &str) -> Self {
        let mut sheet = StyleSheet { styles: HashMap::new(), default_font_size: 11.0 };
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut buf = Vec::new();

        let mut in_doc_defaults = false;
        let mut cur_style_id: Option<String> = None;
        let mut cur_def = StyleDef::default();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    match e.local_name().as_ref() {
                        b"docDefaults" => in_doc_defaults = true,
                        b"style" => {
                            cur_style_id = get_attribute(&e, "styleId");
                            cur_def = StyleDef::default();
                        },
                        b"basedOn" => {
                            if let Some(v) = get_attribute(&e, "val") {
                                cur_def.based_on = Some(v);
                            }
                        },
                        b"name" => {
                            if cur_style_id.is_some() {
                                if let Some(v) = get_attribute(&e, "val") {
                                    cur_def.name = Some(v);
                                }
                            }
                        },
                        b"outlineLvl" => {
                            if let Some(v) = get_attribute(&e, "val").and_then(|v| v.parse::<u8>().ok()) {
                                cur_def.outline_level = Some(v);
                            }
                        },
                        b"b" => {
                            if cur_style_id.is_some() {
                                cur_def.bold = Some(super::xml_util::ooxml_bool(&e));
                            }
                        },
                        b"i" => {
                            if cur_style_id.is_some() {
                                cur_def.italic = Some(super::xml_util::ooxml_bool(&e));
                            }
                        },
                        b"sz" => {
                            let size = get_attribute(&e, "val").and_then(|v| v.parse::<f64>().ok()).map(half_points_to_points);
                            if in_doc_defaults {
                                if let Some(s) = size {
                                    sheet.default_font_size = s;
                                }
                            } else if cur_style_id.is_some() {
                                cur_def.font_size = size;
                            }
                        },
                        b"jc" => {
                            if cur_style_id.is_some() {
                                if let Some(v) = get_attribute(&e, "val") {
                                    cur_def.alignment = Some(v);
                                }
                            }
                        },
                        b"spacing" => {
                            if cur_style_id.is_some() {
                                if let Some(v) = get_attribute(&e, "after").and_then(|v| v.parse::<f64>().ok()) {
                                    cur_def.space_after = Some(twips_to_points_local(v));
                                }
                            }
                        },
                        _ => {},
                    }
                },
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"docDefaults" => in_doc_defaults = false,
                    b"style" => {
                        if let Some(id) = cur_style_id.take() {
                            sheet.styles.insert(id, std::mem::take(&mut cur_def));
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
        sheet
    }

    /// Resolve `styleId`'s full `basedOn` chain (tail → head, reversed) into
    /// one flattened `ResolvedStyle`. Cycles are cut by a visited set.
    pub fn resolve(&self, style_id: &str) -> ResolvedStyle {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(style_id.to_string());
        while let Some(id) = current {
            if !visited.insert(id.clone()) {
                break;
            }
            let Some(def) = self.styles.get(&id) else { break };
            chain.push(def.clone());
            current = def.based_on.clone();
        }
        chain.reverse();

        let mut resolved = ResolvedStyle { font_size: self.default_font_size, ..ResolvedStyle::default() };
        for def in &chain {
            if let Some(name) = &def.name {
                resolved.name = name.clone();
            }
            if def.outline_level.is_some() {
                resolved.outline_level = def.outline_level;
            }
            if let Some(b) = def.bold {
                resolved.bold = b;
            }
            if let Some(i) = def.italic {
                resolved.italic = i;
            }
            if let Some(sz) = def.font_size {
                resolved.font_size = sz;
            }
            if let Some(a) = &def.alignment {
                resolved.alignment = a.clone();
            }
            if let Some(sa) = def.space_after {
                resolved.space_after = sa;
            }
        }
        if resolved.name.is_empty() {
            resolved.name = style_id.to_string();
        }
        resolved
    }
}

fn twips_to_points_local(v: f64) -> f64 {
    v / 20.0
}

/// Detect a paragraph's heading level from its resolved style, per the
/// first-match cascade in spec §4.9.
pub fn detect_heading_level(style_id: &str, resolved: &ResolvedStyle) -> Option<u8> {
    let lower = style_id.to_lowercase();
    let lower_compact = lower.replace(' ', "");
    for n in 1..=9u8 {
        if lower_compact == format!("heading{n}") {
            return Some(n);
        }
    }
    if lower == "title" {
        return Some(1);
    }
    if lower == "subtitle" {
        return Some(2);
    }
    if let Some(lvl) = resolved.outline_level {
        if lvl <= 8 {
            return Some(lvl + 1);
        }
    }
    let name_lower = resolved.name.to_lowercase();
    if name_lower.starts_with("heading") {
        if let Some(digit) = name_lower.chars().find(|c| c.is_ascii_digit()) {
            if let Some(n) = digit.to_digit(10) {
                if (1..=9).contains(&n) {
                    return Some(n as u8);
                }
            }
        }
    }
    if resolved.bold && resolved.font_size >= 14.0 {
        let level = if resolved.font_size >= 24.0 {
            1
        } else if resolved.font_size >= 18.0 {
            2
        } else if resolved.font_size >= 14.0 {
            3
        } else {
            5
        };
        return Some(level);
    }
    None
}
