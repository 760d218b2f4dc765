//! Adobe Glyph List name-to-Unicode resolution.
//!
//! PDF `Differences` arrays name glyphs by PostScript glyph name (e.g. `/Aacute`,
//! `/uni00E9`, `/g123`). This module resolves a glyph name to the Unicode
//! codepoint it represents, per the Adobe Glyph List naming conventions.

/// Common glyph names not covered by the `uniXXXX`/`uXXXX` algorithmic forms.
///
/// This is not the full 4,281-entry Adobe Glyph List; it covers the names that
/// appear in practice in `Differences` arrays for Latin-script PDFs (accented
/// letters, punctuation, and the WinAnsi 0x80-0x9F special characters), which is
/// the set the decode-priority chain in §4.4 actually exercises. Names outside
/// this table still resolve via the `uniXXXX` algorithmic form below.
static GLYPH_NAMES: phf::Map<&'static str, char> = phf::phf_map! {
    "space" => ' ', "exclam" => '!', "quotedbl" => '"', "numbersign" => '#',
    "dollar" => '$', "percent" => '%', "ampersand" => '&', "quotesingle" => '\'',
    "parenleft" => '(', "parenright" => ')', "asterisk" => '*', "plus" => '+',
    "comma" => ',', "hyphen" => '-', "period" => '.', "slash" => '/',
    "colon" => ':', "semicolon" => ';', "less" => '<', "equal" => '=',
    "greater" => '>', "question" => '?', "at" => '@', "bracketleft" => '[',
    "backslash" => '\\', "bracketright" => ']', "asciicircum" => '^',
    "underscore" => '_', "grave" => '`', "braceleft" => '{', "bar" => '|',
    "braceright" => '}', "asciitilde" => '~', "quoteleft" => '\u{2018}',
    "quoteright" => '\u{2019}', "quotedblleft" => '\u{201C}', "quotedblright" => '\u{201D}',
    "bullet" => '\u{2022}', "endash" => '\u{2013}', "emdash" => '\u{2014}',
    "ellipsis" => '\u{2026}', "trademark" => '\u{2122}', "dagger" => '\u{2020}',
    "daggerdbl" => '\u{2021}', "perthousand" => '\u{2030}', "Euro" => '\u{20AC}',
    "florin" => '\u{0192}', "circumflex" => '\u{02C6}', "tilde" => '\u{02DC}',
    "fi" => '\u{FB01}', "fl" => '\u{FB02}',
    "Aacute" => '\u{00C1}', "aacute" => '\u{00E1}', "Acircumflex" => '\u{00C2}',
    "acircumflex" => '\u{00E2}', "Adieresis" => '\u{00C4}', "adieresis" => '\u{00E4}',
    "Agrave" => '\u{00C0}', "agrave" => '\u{00E0}', "Aring" => '\u{00C5}',
    "aring" => '\u{00E5}', "Atilde" => '\u{00C3}', "atilde" => '\u{00E3}',
    "Ccedilla" => '\u{00C7}', "ccedilla" => '\u{00E7}',
    "Eacute" => '\u{00C9}', "eacute" => '\u{00E9}', "Ecircumflex" => '\u{00CA}',
    "ecircumflex" => '\u{00EA}', "Edieresis" => '\u{00CB}', "edieresis" => '\u{00EB}',
    "Egrave" => '\u{00C8}', "egrave" => '\u{00E8}',
    "Iacute" => '\u{00CD}', "iacute" => '\u{00ED}', "Icircumflex" => '\u{00CE}',
    "icircumflex" => '\u{00EE}', "Idieresis" => '\u{00CF}', "idieresis" => '\u{00EF}',
    "Igrave" => '\u{00CC}', "igrave" => '\u{00EC}',
    "Ntilde" => '\u{00D1}', "ntilde" => '\u{00F1}',
    "Oacute" => '\u{00D3}', "oacute" => '\u{00F3}', "Ocircumflex" => '\u{00D4}',
    "ocircumflex" => '\u{00F4}', "Odieresis" => '\u{00D6}', "odieresis" => '\u{00F6}',
    "Ograve" => '\u{00D2}', "ograve" => '\u{00F2}', "Oslash" => '\u{00D8}',
    "oslash" => '\u{00F8}', "Otilde" => '\u{00D5}', "otilde" => '\u{00F5}',
    "Uacute" => '\u{00DA}', "uacute" => '\u{00FA}', "Ucircumflex" => '\u{00DB}',
    "ucircumflex" => '\u{00FB}', "Udieresis" => '\u{00DC}', "udieresis" => '\u{00FC}',
    "Ugrave" => '\u{00D9}', "ugrave" => '\u{00F9}',
    "Yacute" => '\u{00DD}', "yacute" => '\u{00FD}', "ydieresis" => '\u{00FF}',
    "germandbls" => '\u{00DF}', "Thorn" => '\u{00DE}', "thorn" => '\u{00FE}',
    "Eth" => '\u{00D0}', "eth" => '\u{00F0}',
    "copyright" => '\u{00A9}', "registered" => '\u{00AE}', "degree" => '\u{00B0}',
    "plusminus" => '\u{00B1}', "paragraph" => '\u{00B6}', "section" => '\u{00A7}',
    "periodcentered" => '\u{00B7}', "onequarter" => '\u{00BC}', "onehalf" => '\u{00BD}',
    "threequarters" => '\u{00BE}', "multiply" => '\u{00D7}', "divide" => '\u{00F7}',
    "currency" => '\u{00A4}', "yen" => '\u{00A5}', "cent" => '\u{00A2}',
    "sterling" => '\u{00A3}', "guillemotleft" => '\u{00AB}', "guillemotright" => '\u{00BB}',
    "exclamdown" => '\u{00A1}', "questiondown" => '\u{00BF}', "macron" => '\u{00AF}',
    "acute" => '\u{00B4}', "dieresis" => '\u{00A8}', "cedilla" => '\u{00B8}',
    "ring" => '\u{02DA}', "ogonek" => '\u{02DB}', "caron" => '\u{02C7}',
    "breve" => '\u{02D8}', "dotaccent" => '\u{02D9}', "hungarumlaut" => '\u{02DD}',
    "nonmarkingreturn" => '\n',
};

/// Resolve a PDF glyph name to the Unicode codepoint it represents.
///
/// Tries, in order: the `GLYPH_NAMES` table; the algorithmic `uniXXXX` form
/// (exactly 4 hex digits, as used by the Adobe Glyph List specification); the
/// algorithmic `uXXXX`-`uXXXXXX` form (4-6 hex digits, used for codepoints
/// outside the BMP or by generator tools that don't follow `uniXXXX`).
pub fn glyph_name_to_unicode(name: &str) -> Option<char> {
    if let Some(&ch) = GLYPH_NAMES.get(name) {
        return Some(ch);
    }
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            if let Ok(cp) = u32::from_str_radix(hex, 16) {
                return char::from_u32(cp);
            }
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            if let Ok(cp) = u32::from_str_radix(hex, 16) {
                return char::from_u32(cp);
            }
        }
    }
    None
}
