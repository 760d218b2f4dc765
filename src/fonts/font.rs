//! Font model: widths, subtype, and the decode-priority chain that turns raw
//! string bytes from a content stream into Unicode text.

use crate::fonts::cmap::CMap;
use crate::fonts::encoding::Encoding;
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// The three font subtypes relevant to text extraction. Type3 and
/// multiple-master variants are treated as `Type1` for width purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSubtype {
    Type1,
    TrueType,
    Type0,
}

/// Default width (1/1000 em) applied to any rune absent from a font's width
/// table, per the Font invariant.
pub const DEFAULT_WIDTH: f64 = 500.0;

/// `DescendantFont` data for a Type0/CIDFont: default width plus CID-indexed
/// ranges, per ISO 32000-1 §9.7.4.3.
#[derive(Debug, Clone, Default)]
pub struct CidFont {
    pub default_width: f64,
    pub cid_widths: HashMap<u32, f64>,
}

impl CidFont {
    pub fn width_for_cid(&self, cid: u32) -> f64 {
        self.cid_widths.get(&cid).copied().unwrap_or(self.default_width)
    }
}

/// A font as registered from a PDF page's `/Resources /Font` dictionary, or
/// the synthetic Helvetica placeholder auto-registered for unresolved `Tf`
/// references.
#[derive(Debug, Clone)]
pub struct Font {
    pub name: String,
    pub base_font: String,
    pub subtype: FontSubtype,
    pub encoding_tag: String,
    pub widths: HashMap<u32, f64>,
    pub to_unicode: Option<CMap>,
    pub encoding: Option<Encoding>,
    pub descendant: Option<CidFont>,
}

impl Font {
    /// A placeholder Helvetica-Type1 font, auto-registered when `Tf`
    /// references an unknown font name so width computation still works.
    pub fn synthetic_helvetica(name: &str) -> Self {
        Font {
            name: name.to_string(),
            base_font: "Helvetica".to_string(),
            subtype: FontSubtype::Type1,
            encoding_tag: "StandardEncoding".to_string(),
            widths: standard14_widths("Helvetica"),
            to_unicode: None,
            encoding: Some(Encoding::infer_from_base_font("Helvetica")),
            descendant: None,
        }
    }

    /// True iff this font is tagged for vertical writing mode, per spec §4.6.
    pub fn is_vertical(&self) -> bool {
        self.encoding_tag == "Identity-V"
    }

    /// Width, in 1/1000 em, of a single decoded rune.
    pub fn width_of(&self, ch: char) -> f64 {
        self.widths.get(&(ch as u32)).copied().unwrap_or(DEFAULT_WIDTH)
    }

    /// Width of a code point as a raw character code (used for Type0/CID
    /// fonts, where the code is a CID rather than a decoded Unicode rune).
    pub fn width_of_code(&self, code: u32) -> f64 {
        if let Some(descendant) = &self.descendant {
            return descendant.width_for_cid(code);
        }
        self.widths.get(&code).copied().unwrap_or(DEFAULT_WIDTH)
    }

    /// Sum of the widths of each rune in `text`, in 1/1000 em.
    pub fn string_width(&self, text: &str) -> f64 {
        text.chars().map(|c| self.width_of(c)).sum()
    }

    /// Decode a raw content-stream string into Unicode text, following the
    /// decode-priority chain from spec §4.5: ToUnicode CMap, then UTF-16 BOM,
    /// then the font's Encoding, then raw Latin-1 bytes. Always NFC-normalized.
    pub fn decode_string(&self, bytes: &[u8]) -> String {
        let decoded = if let Some(cmap) = &self.to_unicode {
            cmap.decode_bytes(bytes)
        } else if bytes.starts_with(&[0xFE, 0xFF]) || bytes.starts_with(&[0xFF, 0xFE]) {
            decode_utf16_bom(bytes)
        } else if let Some(enc) = &self.encoding {
            enc.decode_bytes(bytes)
        } else {
            bytes.iter().map(|&b| b as char).collect()
        };
        decoded.nfc().collect()
    }
}

/// Decode a byte string beginning with a UTF-16 BOM, assembling surrogate
/// pairs and skipping orphan surrogates per spec §4.5.
fn decode_utf16_bom(bytes: &[u8]) -> String {
    let big_endian = bytes.starts_with(&[0xFE, 0xFF]);
    let body = &bytes[2..];
    let mut units = Vec::with_capacity(body.len() / 2);
    let mut chunks = body.chunks_exact(2);
    for chunk in &mut chunks {
        let unit = if big_endian {
            ((chunk[0] as u16) << 8) | chunk[1] as u16
        } else {
            ((chunk[1] as u16) << 8) | chunk[0] as u16
        };
        units.push(unit);
    }

    let mut out = String::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        let unit = units[i];
        if (0xD800..=0xDBFF).contains(&unit) {
            if i + 1 < units.len() && (0xDC00..=0xDFFF).contains(&units[i + 1]) {
                let pair = [unit, units[i + 1]];
                if let Ok(s) = String::from_utf16(&pair) {
                    out.push_str(&s);
                }
                i += 2;
                continue;
            }
            // Orphan high surrogate: skip.
            i += 1;
            continue;
        }
        if (0xDC00..=0xDFFF).contains(&unit) {
            // Orphan low surrogate: skip.
            i += 1;
            continue;
        }
        if let Some(ch) = char::from_u32(unit as u32) {
            out.push(ch);
        }
        i += 1;
    }
    out
}

/// Standard-14 PostScript font metrics, in 1/1000 em, keyed by base-font
/// name. Only the 14 canonical names are populated; anything else falls back
/// to the Helvetica table by convention.
pub fn standard14_widths(base_font: &str) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let family = Standard14Family::from_base_font(base_font);

    let (space_w, period_w, comma_w, hyphen_w) = family.punct_widths();
    widths.insert(' ' as u32, space_w);
    widths.insert('.' as u32, period_w);
    widths.insert(',' as u32, comma_w);
    widths.insert('-' as u32, hyphen_w);
    for (ch, w) in [
        (';', 278.0), ('!', 333.0), ('?', 500.0), ('\'', 222.0), ('"', 400.0), ('(', 333.0),
        (')', 333.0), ('[', 333.0), (']', 333.0), ('{', 333.0), ('}', 333.0), ('/', 278.0),
        ('\\', 278.0), ('@', 800.0), ('#', 556.0), ('$', 556.0), ('%', 889.0), ('^', 500.0),
        ('&', 722.0), ('*', 389.0), ('+', 584.0), ('=', 584.0), ('<', 584.0), ('>', 584.0),
        ('|', 280.0), ('`', 333.0), ('~', 584.0), ('_', 556.0), (':', 278.0),
    ] {
        widths.insert(ch as u32, w);
    }
    for digit in '0'..='9' {
        widths.insert(digit as u32, 556.0);
    }
    for (ch, w) in family.uppercase_widths() {
        widths.insert(*ch as u32, *w);
    }
    for (ch, w) in family.lowercase_widths() {
        widths.insert(*ch as u32, *w);
    }
    widths
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Standard14Family {
    Helvetica,
    HelveticaBold,
    Times,
    TimesBold,
    Courier,
}

impl Standard14Family {
    fn from_base_font(base_font: &str) -> Self {
        let lower = base_font.to_ascii_lowercase();
        let bold = lower.contains("bold");
        if lower.contains("courier") {
            Standard14Family::Courier
        } else if lower.contains("times") {
            if bold { Standard14Family::TimesBold } else { Standard14Family::Times }
        } else if bold {
            Standard14Family::HelveticaBold
        } else {
            Standard14Family::Helvetica
        }
    }

    fn punct_widths(&self) -> (f64, f64, f64, f64) {
        match self {
            Standard14Family::Helvetica | Standard14Family::HelveticaBold => (278.0, 278.0, 278.0, 333.0),
            Standard14Family::Courier => (600.0, 600.0, 600.0, 600.0),
            _ => (250.0, 250.0, 250.0, 333.0),
        }
    }

    fn uppercase_widths(&self) -> &'static [(char, f64)] {
        match self {
            Standard14Family::Helvetica => &[
                ('A', 722.0), ('B', 722.0), ('C', 722.0), ('D', 722.0), ('E', 667.0),
                ('F', 611.0), ('G', 778.0), ('H', 722.0), ('I', 278.0), ('J', 556.0),
                ('K', 722.0), ('L', 611.0), ('M', 833.0), ('N', 722.0), ('O', 778.0),
                ('P', 667.0), ('Q', 778.0), ('R', 722.0), ('S', 667.0), ('T', 611.0),
                ('U', 722.0), ('V', 667.0), ('W', 944.0), ('X', 667.0), ('Y', 667.0),
                ('Z', 611.0),
            ],
            Standard14Family::HelveticaBold => &[
                ('A', 722.0), ('B', 722.0), ('C', 722.0), ('D', 722.0), ('E', 667.0),
                ('F', 611.0), ('G', 778.0), ('H', 722.0), ('I', 278.0), ('J', 556.0),
                ('K', 722.0), ('L', 611.0), ('M', 833.0), ('N', 722.0), ('O', 778.0),
                ('P', 667.0), ('Q', 778.0), ('R', 722.0), ('S', 667.0), ('T', 611.0),
                ('U', 722.0), ('V', 667.0), ('W', 944.0), ('X', 667.0), ('Y', 667.0),
                ('Z', 611.0),
            ],
            Standard14Family::Times => &[
                ('A', 722.0), ('B', 667.0), ('C', 667.0), ('D', 722.0), ('E', 611.0),
                ('F', 556.0), ('G', 722.0), ('H', 722.0), ('I', 333.0), ('J', 389.0),
                ('K', 722.0), ('L', 611.0), ('M', 889.0), ('N', 722.0), ('O', 722.0),
                ('P', 556.0), ('Q', 722.0), ('R', 667.0), ('S', 556.0), ('T', 611.0),
                ('U', 722.0), ('V', 722.0), ('W', 944.0), ('X', 722.0), ('Y', 722.0),
                ('Z', 611.0),
            ],
            Standard14Family::TimesBold => &[
                ('A', 722.0), ('B', 667.0), ('C', 722.0), ('D', 722.0), ('E', 667.0),
                ('F', 611.0), ('G', 778.0), ('H', 778.0), ('I', 389.0), ('J', 500.0),
                ('K', 778.0), ('L', 667.0), ('M', 944.0), ('N', 722.0), ('O', 778.0),
                ('P', 611.0), ('Q', 778.0), ('R', 722.0), ('S', 556.0), ('T', 667.0),
                ('U', 722.0), ('V', 722.0), ('W', 1000.0), ('X', 722.0), ('Y', 722.0),
                ('Z', 667.0),
            ],
            Standard14Family::Courier => &[
                ('A', 600.0), ('B', 600.0), ('C', 600.0), ('D', 600.0), ('E', 600.0),
                ('F', 600.0), ('G', 600.0), ('H', 600.0), ('I', 600.0), ('J', 600.0),
                ('K', 600.0), ('L', 600.0), ('M', 600.0), ('N', 600.0), ('O', 600.0),
                ('P', 600.0), ('Q', 600.0), ('R', 600.0), ('S', 600.0), ('T', 600.0),
                ('U', 600.0), ('V', 600.0), ('W', 600.0), ('X', 600.0), ('Y', 600.0),
                ('Z', 600.0),
            ],
        }
    }

    fn lowercase_widths(&self) -> &'static [(char, f64)] {
        match self {
            Standard14Family::Helvetica => &[
                ('a', 556.0), ('b', 611.0), ('c', 556.0), ('d', 611.0), ('e', 556.0),
                ('f', 278.0), ('g', 611.0), ('h', 611.0), ('i', 222.0), ('j', 222.0),
                ('k', 556.0), ('l', 222.0), ('m', 833.0), ('n', 611.0), ('o', 611.0),
                ('p', 611.0), ('q', 611.0), ('r', 389.0), ('s', 556.0), ('t', 333.0),
                ('u', 611.0), ('v', 556.0), ('w', 778.0), ('x', 556.0), ('y', 556.0),
                ('z', 500.0),
            ],
            Standard14Family::HelveticaBold => &[
                ('a', 556.0), ('b', 611.0), ('c', 556.0), ('d', 611.0), ('e', 556.0),
                ('f', 333.0), ('g', 611.0), ('h', 611.0), ('i', 278.0), ('j', 278.0),
                ('k', 556.0), ('l', 278.0), ('m', 889.0), ('n', 611.0), ('o', 611.0),
                ('p', 611.0), ('q', 611.0), ('r', 389.0), ('s', 556.0), ('t', 333.0),
                ('u', 611.0), ('v', 556.0), ('w', 778.0), ('x', 556.0), ('y', 556.0),
                ('z', 500.0),
            ],
            Standard14Family::Times => &[
                ('a', 444.0), ('b', 500.0), ('c', 444.0), ('d', 500.0), ('e', 444.0),
                ('f', 333.0), ('g', 500.0), ('h', 500.0), ('i', 278.0), ('j', 278.0),
                ('k', 500.0), ('l', 278.0), ('m', 778.0), ('n', 500.0), ('o', 500.0),
                ('p', 500.0), ('q', 500.0), ('r', 333.0), ('s', 389.0), ('t', 278.0),
                ('u', 500.0), ('v', 500.0), ('w', 722.0), ('x', 500.0), ('y', 500.0),
                ('z', 444.0),
            ],
            Standard14Family::TimesBold => &[
                ('a', 500.0), ('b', 556.0), ('c', 444.0), ('d', 556.0), ('e', 444.0),
                ('f', 333.0), ('g', 500.0), ('h', 556.0), ('i', 278.0), ('j', 333.0),
                ('k', 556.0), ('l', 278.0), ('m', 833.0), ('n', 556.0), ('o', 500.0),
                ('p', 556.0), ('q', 556.0), ('r', 444.0), ('s', 389.0), ('t', 333.0),
                ('u', 556.0), ('v', 500.0), ('w', 722.0), ('x', 500.0), ('y', 500.0),
                ('z', 444.0),
            ],
            Standard14Family::Courier => &[
                ('a', 600.0), ('b', 600.0), ('c', 600.0), ('d', 600.0), ('e', 600.0),
                ('f', 600.0), ('g', 600.0), ('h', 600.0), ('i', 600.0), ('j', 600.0),
                ('k', 600.0), ('l', 600.0), ('m', 600.0), ('n', 600.0), ('o', 600.0),
                ('p', 600.0), ('q', 600.0), ('r', 600.0), ('s', 600.0), ('t', 600.0),
                ('u', 600.0), ('v', 600.0), ('w', 600.0), ('x', 600.0), ('y', 600.0),
                ('z', 600.0),
            ],
        }
    }
}

/// TrueType metrics extracted from an embedded font program via `ttf-parser`:
/// units-per-em-normalized ascent/descent/advance widths, used when a font
/// has no PDF-level `/Widths` array.
pub struct TrueTypeMetrics<'a> {
    face: ttf_parser::Face<'a>,
}

impl<'a> TrueTypeMetrics<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        ttf_parser::Face::parse(data, 0).ok().map(|face| TrueTypeMetrics { face })
    }

    /// Advance width of `ch`, scaled to 1/1000 em, or `None` if the font has
    /// no glyph for it.
    pub fn advance_width(&self, ch: char) -> Option<f64> {
        let units_per_em = self.face.units_per_em() as f64;
        let gid = self.face.glyph_index(ch)?;
        let advance = self.face.glyph_hor_advance(gid)? as f64;
        Some(advance / units_per_em * 1000.0)
    }

    pub fn ascender(&self) -> f64 {
        self.face.ascender() as f64 / self.face.units_per_em() as f64 * 1000.0
    }

    pub fn descender(&self) -> f64 {
        self.face.descender() as f64 / self.face.units_per_em() as f64 * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_helvetica_has_default_widths() {
        let font = Font::synthetic_helvetica("/F1");
        assert_eq!(font.base_font, "Helvetica");
        assert_eq!(font.width_of('A'), 722.0);
        // Unregistered rune falls back to the default width invariant.
        assert_eq!(font.width_of('\u{1F600}'), DEFAULT_WIDTH);
    }

    #[test]
    fn vertical_writing_detection() {
        let mut font = Font::synthetic_helvetica("/F1");
        assert!(!font.is_vertical());
        font.encoding_tag = "Identity-V".to_string();
        assert!(font.is_vertical());
        font.encoding_tag = "identity-v".to_string();
        assert!(!font.is_vertical());
    }

    #[test]
    fn decode_priority_prefers_cmap() {
        let mut cmap = CMap::new();
        cmap.insert_char(0x41, "Z".to_string());
        let mut font = Font::synthetic_helvetica("/F1");
        font.to_unicode = Some(cmap);
        assert_eq!(font.decode_string(&[0x41]), "Z");
    }

    #[test]
    fn decode_utf16_bom_with_surrogate_pair() {
        let font = Font::synthetic_helvetica("/F1");
        // U+1F44B waving hand, big-endian BOM + surrogate pair.
        let bytes = [0xFE, 0xFF, 0xD8, 0x3D, 0xDC, 0x4B];
        let decoded = font.decode_string(&bytes);
        assert_eq!(decoded.chars().next(), Some('\u{1F44B}'));
    }

    #[test]
    fn decode_falls_through_to_encoding() {
        let font = Font::synthetic_helvetica("/F1");
        assert_eq!(font.decode_string(b"Hi"), "Hi");
    }

    #[test]
    fn string_width_sums_glyph_widths() {
        let font = Font::synthetic_helvetica("/F1");
        let w = font.string_width("AB");
        assert_eq!(w, 722.0 + 722.0);
    }

    #[test]
    fn cid_font_width_falls_back_to_default() {
        let mut widths = HashMap::new();
        widths.insert(5u32, 1000.0);
        let descendant = CidFont { default_width: 1000.0, cid_widths: widths };
        assert_eq!(descendant.width_for_cid(5), 1000.0);
        assert_eq!(descendant.width_for_cid(6), 1000.0);
    }
}
