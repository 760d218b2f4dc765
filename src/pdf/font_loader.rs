//! Builds a `fonts::Font` from a page's `/Resources /Font` dictionary entry,
//! per spec §4.6.
//!
//! Simple fonts (Type1/TrueType/Type3) resolve `/Widths`, `/Encoding`
//! (including a `/Differences` overlay), and an optional `/ToUnicode` CMap.
//! `Type0` composite fonts resolve the descendant CIDFont's `/DW`/`/W`
//! tables instead, since their widths are indexed by CID, not by code point.

use super::PdfDocument;
use crate::error::{Error, Result};
use crate::fonts::font::standard14_widths;
use crate::fonts::{CMap, CidFont, DifferenceEntry, Encoding, Font, FontSubtype, NamedEncoding};
use crate::object::Object;
use std::collections::HashMap;

/// Upper bound on a single `/W` range's CID span, so a malformed
/// `[lo hi width]` triple cannot force allocation of an unbounded width map.
const MAX_CID_RANGE: u32 = 70_000;

pub(crate) fn load_font(
    doc: &mut PdfDocument,
    name: &str,
    dict: &HashMap<String, Object>,
) -> Result<Font> {
    let subtype = dict.get("Subtype").and_then(|o| o.as_name()).unwrap_or("Type1").to_string();
    let base_font = dict
        .get("BaseFont")
        .and_then(|o| o.as_name())
        .map(|s| s.to_string())
        .unwrap_or_else(|| name.trim_start_matches('/').to_string());

    if subtype == "Type0" {
        return load_type0_font(doc, name, dict, &base_font);
    }

    let font_subtype = if subtype == "TrueType" { FontSubtype::TrueType } else { FontSubtype::Type1 };
    let encoding = parse_encoding(doc, dict, &base_font)?;
    let widths = parse_simple_widths(doc, dict, &encoding)?;
    let to_unicode = parse_to_unicode(doc, dict)?;
    let encoding_tag = match dict.get("Encoding") {
        Some(Object::Name(n)) => n.clone(),
        _ => encoding.name(),
    };

    Ok(Font {
        name: name.to_string(),
        base_font: base_font.clone(),
        subtype: font_subtype,
        encoding_tag,
        widths: if widths.is_empty() { standard14_widths(&base_font) } else { widths },
        to_unicode,
        encoding: Some(encoding),
        descendant: None,
    })
}

/// `/Widths` is indexed from `/FirstChar`, by raw character code. Re-key it
/// by the decoded Unicode rune so it lines up with `Font::width_of`, which
/// looks runes up post-decode.
fn parse_simple_widths(
    doc: &mut PdfDocument,
    dict: &HashMap<String, Object>,
    encoding: &Encoding,
) -> Result<HashMap<u32, f64>> {
    let mut widths = HashMap::new();
    let first_char = match dict.get("FirstChar").and_then(|o| o.as_integer()) {
        Some(n) => n,
        None => return Ok(widths),
    };
    let Some(arr_obj) = dict.get("Widths").cloned() else { return Ok(widths) };
    let Object::Array(items) = doc.deref(arr_obj)? else { return Ok(widths) };

    for (i, raw) in items.into_iter().enumerate() {
        let resolved = doc.deref(raw)?;
        let Some(w) = as_number(&resolved) else { continue };
        let code = first_char + i as i64;
        if (0..=255).contains(&code) {
            let ch = encoding.decode(code as u8);
            widths.insert(ch as u32, w);
        }
    }
    Ok(widths)
}

fn parse_encoding(doc: &mut PdfDocument, dict: &HashMap<String, Object>, base_font: &str) -> Result<Encoding> {
    match dict.get("Encoding").cloned() {
        Some(Object::Name(name)) => Ok(Encoding::Named(NamedEncoding::from_pdf_name(&name))),
        Some(obj @ Object::Reference(_)) => {
            let resolved = doc.deref(obj)?;
            parse_encoding_dict(doc, &resolved, base_font)
        },
        Some(obj @ Object::Dictionary(_)) => parse_encoding_dict(doc, &obj, base_font),
        _ => Ok(Encoding::infer_from_base_font(base_font)),
    }
}

fn parse_encoding_dict(doc: &mut PdfDocument, obj: &Object, base_font: &str) -> Result<Encoding> {
    let Some(dict) = obj.as_dict() else { return Ok(Encoding::infer_from_base_font(base_font)) };
    let base = match dict.get("BaseEncoding").and_then(|o| o.as_name()) {
        Some(name) => NamedEncoding::from_pdf_name(name),
        None => match Encoding::infer_from_base_font(base_font) {
            Encoding::Named(n) => n,
            Encoding::Custom { base, .. } => base,
        },
    };
    let Some(diffs_obj) = dict.get("Differences").cloned() else {
        return Ok(Encoding::Named(base));
    };
    let Object::Array(items) = doc.deref(diffs_obj)? else {
        return Ok(Encoding::Named(base));
    };
    let entries = parse_differences(&items);
    Ok(Encoding::from_differences(base, &entries))
}

fn parse_differences(items: &[Object]) -> Vec<DifferenceEntry> {
    items
        .iter()
        .filter_map(|o| match o {
            Object::Integer(n) => Some(DifferenceEntry::Code(*n)),
            Object::Real(f) => Some(DifferenceEntry::Code(*f as i64)),
            Object::Name(n) => Some(DifferenceEntry::Name(n.clone())),
            _ => None,
        })
        .collect()
}

fn parse_to_unicode(doc: &mut PdfDocument, dict: &HashMap<String, Object>) -> Result<Option<CMap>> {
    let Some(obj) = dict.get("ToUnicode").cloned() else { return Ok(None) };
    let resolved = doc.deref(obj)?;
    if let Object::Stream { .. } = &resolved {
        let data = resolved.decode_stream_data()?;
        return Ok(Some(CMap::parse(&data)));
    }
    Ok(None)
}

fn load_type0_font(
    doc: &mut PdfDocument,
    name: &str,
    dict: &HashMap<String, Object>,
    base_font: &str,
) -> Result<Font> {
    let encoding_tag = dict.get("Encoding").and_then(|o| o.as_name()).unwrap_or("Identity-H").to_string();
    let descendant_obj = dict
        .get("DescendantFonts")
        .cloned()
        .ok_or_else(|| Error::Font(format!("Type0 font {name} missing DescendantFonts")))?;
    let descendant_arr = doc.deref(descendant_obj)?;
    let first = match descendant_arr {
        Object::Array(items) if !items.is_empty() => doc.deref(items[0].clone())?,
        _ => return Err(Error::Font(format!("Type0 font {name} has an empty DescendantFonts array"))),
    };
    let desc_dict = first.as_dict().cloned().unwrap_or_default();

    let default_width = desc_dict.get("DW").and_then(as_number).unwrap_or(1000.0);
    let mut cid_widths = HashMap::new();
    if let Some(w_obj) = desc_dict.get("W").cloned() {
        if let Object::Array(items) = doc.deref(w_obj)? {
            parse_w_array(doc, &items, &mut cid_widths)?;
        }
    }
    let to_unicode = parse_to_unicode(doc, dict)?;

    Ok(Font {
        name: name.to_string(),
        base_font: base_font.to_string(),
        subtype: FontSubtype::Type0,
        encoding_tag,
        widths: HashMap::new(),
        to_unicode,
        encoding: None,
        descendant: Some(CidFont { default_width, cid_widths }),
    })
}

/// Parse a CIDFont `/W` array: a flat mix of `c [w1 w2 ...]` (per-CID list)
/// and `cFirst cLast w` (uniform range) groups, per ISO 32000-1 §9.7.4.3.
fn parse_w_array(doc: &mut PdfDocument, items: &[Object], out: &mut HashMap<u32, f64>) -> Result<()> {
    let mut i = 0;
    while i < items.len() {
        let Some(first) = as_number(&doc.deref(items[i].clone())?) else {
            i += 1;
            continue;
        };
        i += 1;
        if i >= items.len() {
            break;
        }
        match doc.deref(items[i].clone())? {
            Object::Array(widths) => {
                let start = first as u32;
                for (k, w) in widths.into_iter().enumerate() {
                    if let Some(v) = as_number(&doc.deref(w)?) {
                        out.insert(start + k as u32, v);
                    }
                }
                i += 1;
            },
            second_obj => {
                let second = as_number(&second_obj).unwrap_or(first);
                i += 1;
                if i >= items.len() {
                    break;
                }
                let width = as_number(&doc.deref(items[i].clone())?).unwrap_or(1000.0);
                i += 1;
                let (lo, hi) = (first as u32, second as u32);
                if hi >= lo && hi - lo < MAX_CID_RANGE {
                    for cid in lo..=hi {
                        out.insert(cid, width);
                    }
                }
            },
        }
    }
    Ok(())
}

fn as_number(obj: &Object) -> Option<f64> {
    obj.as_real().or_else(|| obj.as_integer().map(|n| n as f64))
}
