//! Single-byte PDF text encodings.
//!
//! A PDF simple font decodes each byte of a string independently through one
//! of the named 256-entry encoding tables below, optionally overlaid with a
//! `Differences` array. Decoding never fails: an unmapped byte falls back to
//! its Latin-1 codepoint.

use crate::fonts::glyph_list::glyph_name_to_unicode;
use std::collections::HashMap;

/// One of the eight built-in single-byte PDF encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedEncoding {
    Standard,
    WinAnsi,
    MacRoman,
    PdfDoc,
    Symbol,
    ZapfDingbats,
}

/// A decode-side character encoding: either one of the named tables, or a
/// named table overlaid with a PDF `Differences` array.
#[derive(Debug, Clone)]
pub enum Encoding {
    Named(NamedEncoding),
    Custom {
        base: NamedEncoding,
        overlay: HashMap<u8, char>,
    },
}

impl Encoding {
    /// Build a `Custom` encoding from a base encoding and a PDF `Differences`
    /// array's already-parsed entries (integers reset the running code; names
    /// assign a glyph and advance it), per spec §4.3.
    pub fn from_differences(base: NamedEncoding, entries: &[DifferenceEntry]) -> Self {
        let mut overlay = HashMap::new();
        let mut code: i64 = 0;
        for entry in entries {
            match entry {
                DifferenceEntry::Code(c) => code = *c,
                DifferenceEntry::Name(name) => {
                    if (0..=255).contains(&code) {
                        if let Some(ch) = glyph_name_to_unicode(name) {
                            overlay.insert(code as u8, ch);
                        }
                    }
                    code += 1;
                },
            }
        }
        Encoding::Custom { base, overlay }
    }

    /// Human-readable name, e.g. `"WinAnsiEncoding"` or `"WinAnsiEncoding+custom"`.
    pub fn name(&self) -> String {
        match self {
            Encoding::Named(n) => n.table_name().to_string(),
            Encoding::Custom { base, .. } => format!("{}+custom", base.table_name()),
        }
    }

    /// Decode a single byte to a rune. Never fails.
    pub fn decode(&self, byte: u8) -> char {
        match self {
            Encoding::Named(n) => n.decode(byte),
            Encoding::Custom { base, overlay } => {
                overlay.get(&byte).copied().unwrap_or_else(|| base.decode(byte))
            },
        }
    }

    /// Decode a byte sequence to a UTF-8 string.
    pub fn decode_bytes(&self, bytes: &[u8]) -> String {
        bytes.iter().map(|&b| self.decode(b)).collect()
    }

    /// Infer an encoding for a font with no explicit `/Encoding` entry, from
    /// substrings of its base-font name, per spec §4.3.
    pub fn infer_from_base_font(base_font: &str) -> Encoding {
        let lower = base_font.to_ascii_lowercase();
        if lower.contains("symbol") || lower.contains("wingdings") {
            return Encoding::Named(NamedEncoding::Symbol);
        }
        if lower.contains("zapfdingbats") {
            return Encoding::Named(NamedEncoding::ZapfDingbats);
        }
        for cjk in ["mincho", "song", "batang", "gothic", "ming"] {
            if lower.contains(cjk) {
                return Encoding::Named(NamedEncoding::WinAnsi);
            }
        }
        if lower.contains("menlo") || lower.contains("monaco") {
            return Encoding::Named(NamedEncoding::MacRoman);
        }
        if lower.contains("helvetica") || lower.contains("times") || lower.contains("courier") {
            return Encoding::Named(NamedEncoding::Standard);
        }
        Encoding::Named(NamedEncoding::WinAnsi)
    }
}

/// One entry of a parsed PDF `Differences` array.
#[derive(Debug, Clone)]
pub enum DifferenceEntry {
    Code(i64),
    Name(String),
}

impl NamedEncoding {
    pub fn table_name(&self) -> &'static str {
        match self {
            NamedEncoding::Standard => "StandardEncoding",
            NamedEncoding::WinAnsi => "WinAnsiEncoding",
            NamedEncoding::MacRoman => "MacRomanEncoding",
            NamedEncoding::PdfDoc => "PDFDocEncoding",
            NamedEncoding::Symbol => "Symbol",
            NamedEncoding::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Parse a PDF `/Encoding` name into a `NamedEncoding`, defaulting to
    /// `Standard` for unrecognized values.
    pub fn from_pdf_name(name: &str) -> Self {
        match name {
            "WinAnsiEncoding" => NamedEncoding::WinAnsi,
            "MacRomanEncoding" => NamedEncoding::MacRoman,
            "MacExpertEncoding" => NamedEncoding::Standard,
            "PDFDocEncoding" => NamedEncoding::PdfDoc,
            "StandardEncoding" => NamedEncoding::Standard,
            _ => NamedEncoding::Standard,
        }
    }

    pub fn decode(&self, byte: u8) -> char {
        table(*self)[byte as usize]
    }
}

/// Build the 256-entry rune table for a named encoding. ASCII (0x20-0x7E) is
/// identical across all of them; each variant overlays its own high range.
fn table(enc: NamedEncoding) -> [char; 256] {
    let mut t = ['\u{FFFD}'; 256];
    // Control range and ASCII printable range: identical across all eight
    // encodings and treated as a Latin-1 identity mapping.
    for (i, slot) in t.iter_mut().enumerate().take(0x7F) {
        *slot = i as u8 as char;
    }
    t[0x7F] = 0x7F as char;

    match enc {
        NamedEncoding::Standard => apply_standard_high(&mut t),
        NamedEncoding::WinAnsi => apply_winansi_high(&mut t),
        NamedEncoding::MacRoman => apply_macroman_high(&mut t),
        NamedEncoding::PdfDoc => apply_pdfdoc_high(&mut t),
        NamedEncoding::Symbol => apply_symbol_high(&mut t),
        NamedEncoding::ZapfDingbats => apply_zapf_high(&mut t),
    }
    t
}

fn apply_standard_high(t: &mut [char; 256]) {
    // Adobe StandardEncoding high range (selected, commonly-seen glyphs).
    let pairs: &[(u8, char)] = &[
        (0xA1, '\u{00A1}'),
        (0xA2, '\u{00A2}'),
        (0xA3, '\u{00A3}'),
        (0xA4, '\u{2044}'),
        (0xA5, '\u{00A5}'),
        (0xA6, '\u{0192}'),
        (0xA7, '\u{00A7}'),
        (0xA8, '\u{00A4}'),
        (0xA9, '\u{0027}'),
        (0xAA, '\u{201C}'),
        (0xAB, '\u{00AB}'),
        (0xAC, '\u{2039}'),
        (0xAD, '\u{203A}'),
        (0xAE, '\u{FB01}'),
        (0xAF, '\u{FB02}'),
        (0xB1, '\u{2013}'),
        (0xB2, '\u{2020}'),
        (0xB3, '\u{2021}'),
        (0xB4, '\u{00B7}'),
        (0xB6, '\u{00B6}'),
        (0xB7, '\u{2022}'),
        (0xB8, '\u{201A}'),
        (0xB9, '\u{201E}'),
        (0xBA, '\u{201D}'),
        (0xBB, '\u{00BB}'),
        (0xBC, '\u{2026}'),
        (0xBD, '\u{2030}'),
        (0xBF, '\u{00BF}'),
        (0xC1, '\u{0060}'),
        (0xC2, '\u{00B4}'),
        (0xC3, '\u{02C6}'),
        (0xC4, '\u{02DC}'),
        (0xC5, '\u{00AF}'),
        (0xC6, '\u{02D8}'),
        (0xC7, '\u{02D9}'),
        (0xC8, '\u{00A8}'),
        (0xCA, '\u{02DA}'),
        (0xCB, '\u{00B8}'),
        (0xCD, '\u{02DD}'),
        (0xCE, '\u{02DB}'),
        (0xCF, '\u{02C7}'),
        (0xD0, '\u{2014}'),
        (0xE1, '\u{00C6}'),
        (0xE3, '\u{00AA}'),
        (0xE8, '\u{0141}'),
        (0xE9, '\u{00D8}'),
        (0xEA, '\u{0152}'),
        (0xEB, '\u{00BA}'),
        (0xF1, '\u{00E6}'),
        (0xF5, '\u{0131}'),
        (0xF8, '\u{0142}'),
        (0xF9, '\u{00F8}'),
        (0xFA, '\u{0153}'),
        (0xFB, '\u{00DF}'),
    ];
    for &(b, c) in pairs {
        t[b as usize] = c;
    }
}

fn apply_winansi_high(t: &mut [char; 256]) {
    // CP1252 (WinAnsiEncoding), 0x80-0x9F special row plus Latin-1 0xA0-0xFF.
    for i in 0xA0..=0xFFu32 {
        t[i as usize] = char::from_u32(i).unwrap();
    }
    let pairs: &[(u8, char)] = &[
        (0x80, '\u{20AC}'), // Euro
        (0x82, '\u{201A}'),
        (0x83, '\u{0192}'),
        (0x84, '\u{201E}'),
        (0x85, '\u{2026}'),
        (0x86, '\u{2020}'),
        (0x87, '\u{2021}'),
        (0x88, '\u{02C6}'),
        (0x89, '\u{2030}'),
        (0x8A, '\u{0160}'),
        (0x8B, '\u{2039}'),
        (0x8C, '\u{0152}'),
        (0x8E, '\u{017D}'),
        (0x91, '\u{2018}'), // left single quote
        (0x92, '\u{2019}'), // right single quote
        (0x93, '\u{201C}'), // left double quote
        (0x94, '\u{201D}'), // right double quote
        (0x95, '\u{2022}'), // bullet
        (0x96, '\u{2013}'), // en dash
        (0x97, '\u{2014}'), // em dash
        (0x98, '\u{02DC}'),
        (0x99, '\u{2122}'), // trademark
        (0x9A, '\u{0161}'),
        (0x9B, '\u{203A}'),
        (0x9C, '\u{0153}'),
        (0x9E, '\u{017E}'),
        (0x9F, '\u{0178}'),
    ];
    for &(b, c) in pairs {
        t[b as usize] = c;
    }
}

fn apply_macroman_high(t: &mut [char; 256]) {
    let table: [char; 128] = [
        '\u{00C4}', '\u{00C5}', '\u{00C7}', '\u{00C9}', '\u{00D1}', '\u{00D6}', '\u{00DC}',
        '\u{00E1}', '\u{00E0}', '\u{00E2}', '\u{00E4}', '\u{00E3}', '\u{00E5}', '\u{00E7}',
        '\u{00E9}', '\u{00E8}', '\u{00EA}', '\u{00EB}', '\u{00ED}', '\u{00EC}', '\u{00EE}',
        '\u{00EF}', '\u{00F1}', '\u{00F3}', '\u{00F2}', '\u{00F4}', '\u{00F6}', '\u{00F5}',
        '\u{00FA}', '\u{00F9}', '\u{00FB}', '\u{00FC}', '\u{2020}', '\u{00B0}', '\u{00A2}',
        '\u{00A3}', '\u{00A7}', '\u{2022}', '\u{00B6}', '\u{00DF}', '\u{00AE}', '\u{00A9}',
        '\u{2122}', '\u{00B4}', '\u{00A8}', '\u{2260}', '\u{00C6}', '\u{00D8}', '\u{221E}',
        '\u{00B1}', '\u{2264}', '\u{2265}', '\u{00A5}', '\u{00B5}', '\u{2202}', '\u{2211}',
        '\u{220F}', '\u{03C0}', '\u{222B}', '\u{00AA}', '\u{00BA}', '\u{03A9}', '\u{00E6}',
        '\u{00F8}', '\u{00BF}', '\u{00A1}', '\u{00AC}', '\u{221A}', '\u{0192}', '\u{2248}',
        '\u{2206}', '\u{00AB}', '\u{00BB}', '\u{2026}', '\u{00A0}', '\u{00C0}', '\u{00C3}',
        '\u{00D5}', '\u{0152}', '\u{0153}', '\u{2013}', '\u{2014}', '\u{201C}', '\u{201D}',
        '\u{2018}', '\u{2019}', '\u{00F7}', '\u{25CA}', '\u{00FF}', '\u{0178}', '\u{2044}',
        '\u{20AC}', '\u{2039}', '\u{203A}', '\u{FB01}', '\u{FB02}', '\u{2021}', '\u{00B7}',
        '\u{201A}', '\u{201E}', '\u{2030}', '\u{00C2}', '\u{00CA}', '\u{00C1}', '\u{00CB}',
        '\u{00C8}', '\u{00CD}', '\u{00CE}', '\u{00CF}', '\u{00CC}', '\u{00D3}', '\u{00D4}',
        '\u{F8FF}', '\u{00D2}', '\u{00DA}', '\u{00DB}', '\u{00D9}', '\u{0131}', '\u{02C6}',
        '\u{02DC}', '\u{00AF}', '\u{02D8}', '\u{02D9}', '\u{02DA}', '\u{00B8}', '\u{02DD}',
        '\u{02DB}', '\u{02C7}',
    ];
    for (i, &ch) in table.iter().enumerate() {
        t[0x80 + i] = ch;
    }
}

fn apply_pdfdoc_high(t: &mut [char; 256]) {
    for i in 0xA0..=0xFFu32 {
        t[i as usize] = char::from_u32(i).unwrap();
    }
    let pairs: &[(u8, char)] = &[
        (0x18, '\u{02D8}'),
        (0x19, '\u{02C7}'),
        (0x1A, '\u{02C6}'),
        (0x1B, '\u{02D9}'),
        (0x1C, '\u{02DD}'),
        (0x1D, '\u{02DB}'),
        (0x1E, '\u{02DA}'),
        (0x1F, '\u{02DC}'),
        (0x80, '\u{2022}'),
        (0x81, '\u{2020}'),
        (0x82, '\u{2021}'),
        (0x83, '\u{2026}'),
        (0x84, '\u{2014}'),
        (0x85, '\u{2013}'),
        (0x86, '\u{0192}'),
        (0x87, '\u{2044}'),
        (0x88, '\u{2039}'),
        (0x89, '\u{203A}'),
        (0x8A, '\u{2212}'),
        (0x8B, '\u{2030}'),
        (0x8C, '\u{201E}'),
        (0x8D, '\u{201C}'),
        (0x8E, '\u{201D}'),
        (0x8F, '\u{2018}'),
        (0x90, '\u{2019}'),
        (0x91, '\u{201A}'),
        (0x92, '\u{2122}'),
        (0x93, '\u{FB01}'),
        (0x94, '\u{FB02}'),
        (0x95, '\u{0141}'),
        (0x96, '\u{0152}'),
        (0x97, '\u{0160}'),
        (0x98, '\u{0178}'),
        (0x99, '\u{017D}'),
        (0x9A, '\u{0131}'),
        (0x9B, '\u{0142}'),
        (0x9C, '\u{0153}'),
        (0x9D, '\u{0161}'),
        (0x9E, '\u{017E}'),
        (0x9F, '\u{FFFD}'),
        (0xA0, '\u{20AC}'),
    ];
    for &(b, c) in pairs {
        t[b as usize] = c;
    }
}

fn apply_symbol_high(t: &mut [char; 256]) {
    // Symbol font: codes map to Greek letters and mathematical symbols, not
    // Latin text. A representative subset covering the common Greek range.
    let pairs: &[(u8, char)] = &[
        (0x41, '\u{0391}'),
        (0x42, '\u{0392}'),
        (0x47, '\u{0393}'),
        (0x44, '\u{0394}'),
        (0x45, '\u{0395}'),
        (0x5A, '\u{0396}'),
        (0x48, '\u{0397}'),
        (0x51, '\u{0398}'),
        (0x49, '\u{0399}'),
        (0x4B, '\u{039A}'),
        (0x4C, '\u{039B}'),
        (0x4D, '\u{039C}'),
        (0x4E, '\u{039D}'),
        (0x58, '\u{039E}'),
        (0x4F, '\u{039F}'),
        (0x50, '\u{03A0}'),
        (0x52, '\u{03A1}'),
        (0x53, '\u{03A3}'),
        (0x54, '\u{03A4}'),
        (0x55, '\u{03A5}'),
        (0x46, '\u{03A6}'),
        (0x43, '\u{03A7}'),
        (0x59, '\u{03A8}'),
        (0x57, '\u{03A9}'),
        (0x61, '\u{03B1}'),
        (0x62, '\u{03B2}'),
        (0x67, '\u{03B3}'),
        (0x64, '\u{03B4}'),
        (0x65, '\u{03B5}'),
        (0x7A, '\u{03B6}'),
        (0x68, '\u{03B7}'),
        (0x71, '\u{03B8}'),
        (0x69, '\u{03B9}'),
        (0x6B, '\u{03BA}'),
        (0x6C, '\u{03BB}'),
        (0x6D, '\u{03BC}'),
        (0x6E, '\u{03BD}'),
        (0x78, '\u{03BE}'),
        (0x6F, '\u{03BF}'),
        (0x70, '\u{03C0}'),
        (0x72, '\u{03C1}'),
        (0x73, '\u{03C3}'),
        (0x74, '\u{03C4}'),
        (0x75, '\u{03C5}'),
        (0x66, '\u{03C6}'),
        (0x63, '\u{03C7}'),
        (0x79, '\u{03C8}'),
        (0x77, '\u{03C9}'),
        (0xA5, '\u{221E}'),
        (0xA3, '\u{2264}'),
        (0xB3, '\u{2265}'),
        (0xD7, '\u{2022}'),
        (0xC5, '\u{2211}'),
    ];
    for &(b, c) in pairs {
        t[b as usize] = c;
    }
}

fn apply_zapf_high(t: &mut [char; 256]) {
    // ZapfDingbats glyphs map into the Unicode Dingbats block (U+2700-27BF).
    for (i, slot) in t.iter_mut().enumerate().skip(0x21).take(0x7E - 0x21 + 1) {
        *slot = char::from_u32(0x2700 + (i as u32 - 0x21)).unwrap_or('\u{FFFD}');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_identity() {
        let e = Encoding::Named(NamedEncoding::WinAnsi);
        assert_eq!(e.decode(b'A'), 'A');
        assert_eq!(e.decode(b' '), ' ');
    }

    #[test]
    fn winansi_smart_quotes_and_euro() {
        let e = Encoding::Named(NamedEncoding::WinAnsi);
        assert_eq!(e.decode(0x80), '\u{20AC}');
        assert_eq!(e.decode(0x91), '\u{2018}');
        assert_eq!(e.decode(0x92), '\u{2019}');
        assert_eq!(e.decode(0x93), '\u{201C}');
        assert_eq!(e.decode(0x94), '\u{201D}');
        assert_eq!(e.decode(0x95), '\u{2022}');
        assert_eq!(e.decode(0x96), '\u{2013}');
        assert_eq!(e.decode(0x97), '\u{2014}');
        assert_eq!(e.decode(0x99), '\u{2122}');
    }

    #[test]
    fn macroman_special_chars() {
        let e = Encoding::Named(NamedEncoding::MacRoman);
        assert_eq!(e.decode(0x80), '\u{00C4}');
        assert_eq!(e.decode(0xA9), '\u{00A9}');
        assert_eq!(e.decode(0xAA), '\u{2122}');
    }

    #[test]
    fn differences_overlay_smart_quotes() {
        // Encoding §9: Differences array [39 /quoteright 96 /quoteleft]
        let entries = vec![
            DifferenceEntry::Code(39),
            DifferenceEntry::Name("quoteright".to_string()),
            DifferenceEntry::Code(96),
            DifferenceEntry::Name("quoteleft".to_string()),
        ];
        let enc = Encoding::from_differences(NamedEncoding::Standard, &entries);
        assert_eq!(enc.decode(39), '\u{2019}');
        assert_eq!(enc.decode(96), '\u{2018}');
        // Unaffected byte still falls through to the base encoding.
        assert_eq!(enc.decode(b'A'), 'A');
    }

    #[test]
    fn differences_sequential_advance() {
        let entries = vec![
            DifferenceEntry::Code(100),
            DifferenceEntry::Name("space".to_string()),
            DifferenceEntry::Name("exclam".to_string()),
        ];
        let enc = Encoding::from_differences(NamedEncoding::Standard, &entries);
        assert_eq!(enc.decode(100), ' ');
        assert_eq!(enc.decode(101), '!');
    }

    #[test]
    fn infer_encoding_heuristic() {
        assert!(matches!(
            Encoding::infer_from_base_font("ABCDEF+Symbol"),
            Encoding::Named(NamedEncoding::Symbol)
        ));
        assert!(matches!(
            Encoding::infer_from_base_font("Menlo-Regular"),
            Encoding::Named(NamedEncoding::MacRoman)
        ));
        assert!(matches!(
            Encoding::infer_from_base_font("Helvetica"),
            Encoding::Named(NamedEncoding::Standard)
        ));
        assert!(matches!(
            Encoding::infer_from_base_font("Arial"),
            Encoding::Named(NamedEncoding::WinAnsi)
        ));
    }

    #[test]
    fn unknown_byte_never_fails() {
        let e = Encoding::Named(NamedEncoding::Symbol);
        // Every byte, even unmapped ones, must decode to *something*.
        for b in 0..=255u8 {
            let _ = e.decode(b);
        }
    }
}
