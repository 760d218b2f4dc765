//! Bidirectional text direction detection.
//!
//! Classifies individual runes, whole strings, and assembled lines as
//! left-to-right, right-to-left, or neutral, per the script ranges in
//! spec §4.8.

/// Directionality of a rune, string, or line of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ltr,
    Rtl,
    Neutral,
}

/// Classify a single rune. Digits, punctuation, whitespace, and symbols are
/// tested first and return `Neutral`; known RTL scripts return `Rtl`;
/// everything else (Latin, Cyrillic, Greek, CJK, unknown scripts) is `Ltr`.
pub fn rune_direction(ch: char) -> Direction {
    if !ch.is_alphabetic() {
        // Digits, punctuation, whitespace, and symbols are all Neutral.
        return Direction::Neutral;
    }
    let c = ch as u32;
    let rtl_ranges: &[(u32, u32)] = &[
        (0x0600, 0x06FF), // Arabic
        (0x0750, 0x077F), // Arabic Supplement
        (0x08A0, 0x08FF), // Arabic Extended-A
        (0xFB50, 0xFDFF), // Arabic Presentation Forms-A
        (0xFE70, 0xFEFF), // Arabic Presentation Forms-B
        (0x0590, 0x05FF), // Hebrew
        (0xFB1D, 0xFB4F), // Hebrew presentation forms
        (0x0700, 0x074F), // Syriac
        (0x0780, 0x07BF), // Thaana
        (0x07C0, 0x07FF), // NKo
    ];
    if rtl_ranges.iter().any(|&(lo, hi)| c >= lo && c <= hi) {
        return Direction::Rtl;
    }
    Direction::Ltr
}

/// Classify a whole string by counting strong LTR vs RTL runes. Ties, and
/// strings with no strong runes at all, resolve to `Neutral`... except the
/// per-line variant below, which ties to `Ltr` per spec.
pub fn string_direction(s: &str) -> Direction {
    let (mut ltr, mut rtl) = (0u32, 0u32);
    for ch in s.chars() {
        match rune_direction(ch) {
            Direction::Ltr => ltr += 1,
            Direction::Rtl => rtl += 1,
            Direction::Neutral => {},
        }
    }
    if ltr == 0 && rtl == 0 {
        Direction::Neutral
    } else if rtl > ltr {
        Direction::Rtl
    } else {
        Direction::Ltr
    }
}

/// Classify a line by counting LTR vs RTL *fragments* (not runes). Ties, and
/// all-neutral lines, default to `Ltr`.
pub fn line_direction<'a>(fragment_directions: impl Iterator<Item = &'a Direction>) -> Direction {
    let (mut ltr, mut rtl) = (0u32, 0u32);
    for d in fragment_directions {
        match d {
            Direction::Ltr => ltr += 1,
            Direction::Rtl => rtl += 1,
            Direction::Neutral => {},
        }
    }
    if rtl > ltr {
        Direction::Rtl
    } else {
        Direction::Ltr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_digits_and_punctuation_are_neutral() {
        assert_eq!(rune_direction('5'), Direction::Neutral);
        assert_eq!(rune_direction(' '), Direction::Neutral);
        assert_eq!(rune_direction('.'), Direction::Neutral);
    }

    #[test]
    fn arabic_and_hebrew_are_rtl() {
        assert_eq!(rune_direction('\u{0627}'), Direction::Rtl); // Arabic alef
        assert_eq!(rune_direction('\u{05D0}'), Direction::Rtl); // Hebrew alef
    }

    #[test]
    fn latin_cjk_and_unknown_are_ltr() {
        assert_eq!(rune_direction('A'), Direction::Ltr);
        assert_eq!(rune_direction('\u{4E2D}'), Direction::Ltr); // CJK
        assert_eq!(rune_direction('\u{3042}'), Direction::Ltr); // Hiragana
    }

    #[test]
    fn string_direction_majority_wins() {
        assert_eq!(string_direction("abc"), Direction::Ltr);
        assert_eq!(string_direction("\u{0627}\u{0628}\u{0629}"), Direction::Rtl);
        assert_eq!(string_direction("123 456"), Direction::Neutral);
    }

    #[test]
    fn string_direction_tie_resolves_ltr() {
        assert_eq!(string_direction("a\u{0627}"), Direction::Ltr);
    }

    #[test]
    fn line_direction_defaults_ltr_on_tie_or_neutral() {
        let dirs = vec![Direction::Neutral, Direction::Neutral];
        assert_eq!(line_direction(dirs.iter()), Direction::Ltr);
        let dirs2 = vec![Direction::Ltr, Direction::Rtl];
        assert_eq!(line_direction(dirs2.iter()), Direction::Ltr);
        let dirs3 = vec![Direction::Rtl, Direction::Rtl, Direction::Ltr];
        assert_eq!(line_direction(dirs3.iter()), Direction::Rtl);
    }
}
