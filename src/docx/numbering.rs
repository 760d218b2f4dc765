//! Numbering resolver (C9): `numbering.xml` abstract-numbering definitions,
//! per-level format/bullet/start resolution, and ordered-list rendering
//! (decimal, bijective-base-26 letters, Roman numerals), per spec §4.9.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

use super::xml_util::get_attribute;

/// How a numbering level's items should be marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListType {
    Ordered,
    Unordered,
}

/// The default bullet glyphs cycled by nesting level when a level's
/// `lvlText` is unusable (a Wingdings private-use glyph, a `%N` decimal
/// placeholder, or empty).
const DEFAULT_BULLETS: [&str; 8] = ["•", "○", "■", "□", "▪", "▫", "►", "◦"];

#[derive(Debug, Clone)]
struct LevelDef {
    num_fmt: String,
    lvl_text: String,
    start_at: i64,
}

#[derive(Debug, Clone, Default)]
struct AbstractNum {
    levels: HashMap<u32, LevelDef>,
}

/// Resolves `w:numId`/`w:ilvl` pairs from a document body into a rendered
/// list type, bullet/number prefix, and start value.
#[derive(Debug, Clone, Default)]
pub struct NumberingResolver {
    abstract_nums: HashMap<String, AbstractNum>,
    num_to_abstract: HashMap<String, String>,
}

/// The resolved shape of one numbering level, independent of item index.
#[derive(Debug, Clone)]
pub struct ResolvedLevel {
    pub list_type: ListType,
    /// Literal bullet glyph for unordered levels; ignored for ordered ones
    /// (those are rendered per-index by `render_ordinal`).
    pub bullet: String,
    pub start_at: i64,
    pub num_fmt: String,
}

impl NumberingResolver {
    /// Parse a `word/numbering.xml` document.
    pub fn parse(xml: &str) -> Self {
        let mut resolver = NumberingResolver::default();
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut buf = Vec::new();

        let mut cur_abstract_id: Option<String> = None;
        let mut cur_levels: HashMap<u32, LevelDef> = HashMap::new();
        let mut cur_lvl: Option<u32> = None;
        let mut cur_num_fmt = String::new();
        let mut cur_lvl_text = String::new();
        let mut cur_start: i64 = 1;

        let mut cur_num_id: Option<String> = None;
        let mut cur_num_abstract_ref: Option<String> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    match e.local_name().as_ref() {
                        b"abstractNum" => {
                            cur_abstract_id = get_attribute(&e, "abstractNumId");
                            cur_levels = HashMap::new();
                        },
                        b"lvl" => {
                            cur_lvl = get_attribute(&e, "ilvl").and_then(|v| v.parse().ok());
                            cur_num_fmt = String::new();
                            cur_lvl_text = String::new();
                            cur_start = 1;
                        },
                        b"numFmt" => {
                            if let Some(v) = get_attribute(&e, "val") {
                                cur_num_fmt = v;
                            }
                        },
                        b"lvlText" => {
                            if let Some(v) = get_attribute(&e, "val") {
                                cur_lvl_text = v;
                            }
                        },
                        b"start" => {
                            if let Some(v) = get_attribute(&e, "val") {
                                cur_start = v.parse().unwrap_or(1);
                            }
                        },
                        b"num" => {
                            cur_num_id = get_attribute(&e, "numId");
                            cur_num_abstract_ref = None;
                        },
                        b"abstractNumId" => {
                            if let Some(v) = get_attribute(&e, "val") {
                                cur_num_abstract_ref = Some(v);
                            }
                        },
                        _ => {},
                    }
                },
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"lvl" => {
                        if let Some(lvl) = cur_lvl.take() {
                            cur_levels.insert(
                                lvl,
                                LevelDef {
                                    num_fmt: std::mem::take(&mut cur_num_fmt),
                                    lvl_text: std::mem::take(&mut cur_lvl_text),
                                    start_at: cur_start,
                                },
                            );
                        }
                    },
                    b"abstractNum" => {
                        if let Some(id) = cur_abstract_id.take() {
                            resolver.abstract_nums.insert(id, AbstractNum { levels: std::mem::take(&mut cur_levels) });
                        }
                    },
                    b"num" => {
                        if let (Some(num_id), Some(abstract_id)) = (cur_num_id.take(), cur_num_abstract_ref.take()) {
                            resolver.num_to_abstract.insert(num_id, abstract_id);
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

        resolver
    }

    /// Resolve `(numId, ilvl)` to a rendered level shape, per spec §4.9.
    pub fn resolve_level(&self, num_id: &str, ilvl: u32) -> ResolvedLevel {
        let level_def = self
            .num_to_abstract
            .get(num_id)
            .and_then(|abstract_id| self.abstract_nums.get(abstract_id))
            .and_then(|ab| ab.levels.get(&ilvl));

        let Some(def) = level_def else {
            return ResolvedLevel {
                list_type: ListType::Unordered,
                bullet: default_bullet(ilvl),
                start_at: 1,
                num_fmt: "bullet".to_string(),
            };
        };

        let list_type = match def.num_fmt.as_str() {
            "decimal" | "lowerLetter" | "upperLetter" | "lowerRoman" | "upperRoman" => ListType::Ordered,
            _ => ListType::Unordered,
        };

        let bullet = if list_type == ListType::Unordered { resolve_bullet(&def.lvl_text, ilvl) } else { String::new() };

        ResolvedLevel { list_type, bullet, start_at: def.start_at, num_fmt: def.num_fmt.clone() }
    }
}

fn default_bullet(ilvl: u32) -> String {
    DEFAULT_BULLETS[(ilvl as usize) % DEFAULT_BULLETS.len()].to_string()
}

/// A `lvlText` is usable as a literal bullet iff non-empty, contains no `%N`
/// decimal placeholder, and every rune lies outside the Private Use Area and
/// is printable (≥ U+0020). Otherwise fall back to the default palette.
fn resolve_bullet(lvl_text: &str, ilvl: u32) -> String {
    let usable = !lvl_text.is_empty()
        && !lvl_text.contains('%')
        && lvl_text.chars().all(|c| !(0xE000..=0xF8FF).contains(&(c as u32)) && c >= '\u{20}');
    if usable {
        lvl_text.to_string()
    } else {
        default_bullet(ilvl)
    }
}

/// Render the number/letter prefix for an ordered-list item at 1-based
/// ordinal `n` in the given numbering format, followed by `"."`.
pub fn render_ordinal(n: i64, num_fmt: &str) -> String {
    let n = n.max(1);
    match num_fmt {
        "lowerLetter" => format!("{}.", bijective_base26(n, false)),
        "upperLetter" => format!("{}.", bijective_base26(n, true)),
        "lowerRoman" => format!("{}.", to_roman(n).to_lowercase()),
        "upperRoman" => format!("{}.", to_roman(n)),
        _ => format!("{n}."),
    }
}

/// Bijective base-26 numeral: 1→a, 26→z, 27→aa, 28→ab, 52→az, 53→ba.
fn bijective_base26(mut n: i64, upper: bool) -> String {
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'a' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.reverse();
    let s: String = letters.into_iter().collect();
    if upper {
        s.to_uppercase()
    } else {
        s
    }
}

/// Standard subtractive-form Roman numeral, e.g. 1994 → "MCMXCIV".
fn to_roman(mut n: i64) -> String {
    const TABLE: [(i64, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, symbol) in TABLE {
        while n >= value {
            out.push_str(symbol);
            n -= value;
        }
    }
    out
}

/// Build a tiny ordered/unordered pair of abstract-num + num maps directly,
/// for callers (tests) that want to construct a resolver without XML.
#[cfg(test)]
pub fn test_resolver(entries: &[(&str, &str, u32, &str, &str, i64)]) -> NumberingResolver {
    // (numId, abstractNumId, ilvl, numFmt, lvlText, start)
    use indexmap::IndexMap;
    let mut resolver = NumberingResolver::default();
    let mut grouped: IndexMap<String, AbstractNum> = IndexMap::new();
    for (num_id, abstract_id, ilvl, num_fmt, lvl_text, start) in entries {
        resolver.num_to_abstract.insert(num_id.to_string(), abstract_id.to_string());
        let entry = grouped.entry(abstract_id.to_string()).or_default();
        entry.levels.insert(
            *ilvl,
            LevelDef { num_fmt: num_fmt.to_string(), lvl_text: lvl_text.to_string(), start_at: *start },
        );
    }
    for (id, ab) in grouped {
        resolver.abstract_nums.insert(id, ab);
    }
    resolver
}
