//! ToUnicode CMap parser.
//!
//! A ToUnicode CMap stream maps character codes to Unicode, used to recover
//! text from fonts with custom or CID-based encodings. Only the
//! `beginbfchar`/`endbfchar` and `beginbfrange`/`endbfrange` sections are
//! meaningful for text extraction; everything else in the stream (codespace
//! declarations, `usecmap`, comments) is skipped.

use std::collections::HashMap;

/// A single `start..=end -> start_unicode` range mapping.
#[derive(Debug, Clone)]
pub struct RangeMapping {
    pub start: u32,
    pub end: u32,
    pub start_unicode: u32,
}

/// A parsed ToUnicode CMap.
#[derive(Debug, Clone, Default)]
pub struct CMap {
    char_mappings: HashMap<u32, String>,
    range_mappings: Vec<RangeMapping>,
}

impl CMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a decoded CMap stream's bytes.
    pub fn parse(data: &[u8]) -> Self {
        let text = String::from_utf8_lossy(data);
        let mut cmap = CMap::new();
        let mut tokens = Tokenizer::new(&text);

        while let Some(tok) = tokens.next_keyword() {
            match tok.as_str() {
                "beginbfchar" => parse_bfchar_section(&mut tokens, &mut cmap),
                "beginbfrange" => parse_bfrange_section(&mut tokens, &mut cmap),
                _ => {},
            }
        }
        cmap
    }

    /// Direct code -> string mapping, preferred over ranges.
    pub fn lookup(&self, code: u32) -> Option<&str> {
        if let Some(s) = self.char_mappings.get(&code) {
            return Some(s.as_str());
        }
        None
    }

    /// Full lookup per spec §3: direct mapping, then first matching range,
    /// then code-as-scalar fallback, then empty string.
    pub fn lookup_string(&self, code: u32) -> String {
        if let Some(s) = self.char_mappings.get(&code) {
            return s.clone();
        }
        for range in &self.range_mappings {
            if code >= range.start && code <= range.end {
                let unicode = range.start_unicode + (code - range.start);
                if let Some(ch) = char::from_u32(unicode) {
                    return ch.to_string();
                }
                return String::new();
            }
        }
        if let Some(ch) = char::from_u32(code) {
            return ch.to_string();
        }
        String::new()
    }

    /// Decode a byte sequence using the greedy 2-byte-first lookup policy
    /// from spec §4.4.
    pub fn decode_bytes(&self, bytes: &[u8]) -> String {
        let mut out = String::new();
        let mut i = 0;
        while i < bytes.len() {
            if i + 1 < bytes.len() {
                let code2 = ((bytes[i] as u32) << 8) | bytes[i + 1] as u32;
                if self.has_mapping(code2) {
                    out.push_str(&self.lookup_string(code2));
                    i += 2;
                    continue;
                }
            }
            let code1 = bytes[i] as u32;
            if self.has_mapping(code1) {
                out.push_str(&self.lookup_string(code1));
            } else {
                out.push(bytes[i] as char);
            }
            i += 1;
        }
        out
    }

    fn has_mapping(&self, code: u32) -> bool {
        self.char_mappings.contains_key(&code)
            || self.range_mappings.iter().any(|r| code >= r.start && code <= r.end)
    }

    pub fn insert_char(&mut self, code: u32, unicode: String) {
        self.char_mappings.insert(code, unicode);
    }

    pub fn insert_range(&mut self, start: u32, end: u32, start_unicode: u32) {
        self.range_mappings.push(RangeMapping { start, end, start_unicode });
    }

    pub fn is_empty(&self) -> bool {
        self.char_mappings.is_empty() && self.range_mappings.is_empty()
    }
}

/// Decode a hex string like `FEFF0041` as UTF-16BE code units, strip an
/// optional `FEFF` BOM, assemble surrogate pairs, and return the resulting
/// string.
fn decode_utf16be_hex(hex: &str) -> String {
    let bytes = hex_to_bytes(hex);
    let mut units: Vec<u16> = bytes
        .chunks(2)
        .map(|c| if c.len() == 2 { ((c[0] as u16) << 8) | c[1] as u16 } else { (c[0] as u16) << 8 })
        .collect();
    if units.first() == Some(&0xFEFF) {
        units.remove(0);
    }
    String::from_utf16_lossy(&units)
}

/// Decode a hex string as a single big-endian u32, used for `bfrange`
/// destination values and `bfchar` source codes.
fn decode_u32_hex(hex: &str) -> u32 {
    let bytes = hex_to_bytes(hex);
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn hex_to_bytes(hex: &str) -> Vec<u8> {
    let mut hex = hex.to_string();
    if hex.len() % 2 != 0 {
        hex.insert(0, '0');
    }
    let mut out = Vec::with_capacity(hex.len() / 2);
    let chars: Vec<char> = hex.chars().collect();
    for pair in chars.chunks(2) {
        if pair.len() == 2 {
            if let Ok(b) = u8::from_str_radix(&pair.iter().collect::<String>(), 16) {
                out.push(b);
            }
        }
    }
    out
}

/// Minimal tokenizer over CMap PostScript-like syntax: hex tokens `<...>`,
/// array brackets `[`/`]`, and bare keywords. Tolerates tight packing of
/// adjacent hex tokens with no whitespace between them.
struct Tokenizer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    src: &'a str,
}

enum Token {
    Hex(String),
    ArrayStart,
    ArrayEnd,
    Keyword(String),
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Tokenizer { chars: src.char_indices().peekable(), src }
    }

    fn next_token(&mut self) -> Option<Token> {
        loop {
            let &(_, c) = self.chars.peek()?;
            if c.is_whitespace() {
                self.chars.next();
                continue;
            }
            if c == '%' {
                while let Some(&(_, c2)) = self.chars.peek() {
                    if c2 == '\n' {
                        break;
                    }
                    self.chars.next();
                }
                continue;
            }
            break;
        }
        let &(start, c) = self.chars.peek()?;
        match c {
            '<' => {
                self.chars.next();
                let hex_start = start + 1;
                let mut hex_end = hex_start;
                for (idx, ch) in self.chars.by_ref() {
                    if ch == '>' {
                        hex_end = idx;
                        break;
                    }
                }
                Some(Token::Hex(self.src[hex_start..hex_end].to_string()))
            },
            '[' => {
                self.chars.next();
                Some(Token::ArrayStart)
            },
            ']' => {
                self.chars.next();
                Some(Token::ArrayEnd)
            },
            _ => {
                let word_start = start;
                let mut word_end = start;
                while let Some(&(idx, ch)) = self.chars.peek() {
                    if ch.is_whitespace() || ch == '<' || ch == '[' || ch == ']' || ch == '%' {
                        break;
                    }
                    word_end = idx + ch.len_utf8();
                    self.chars.next();
                }
                Some(Token::Keyword(self.src[word_start..word_end].to_string()))
            },
        }
    }

    /// Scan forward for the next bare keyword token, discarding anything
    /// else (used to find section boundaries).
    fn next_keyword(&mut self) -> Option<String> {
        loop {
            match self.next_token()? {
                Token::Keyword(k) => return Some(k),
                _ => continue,
            }
        }
    }

    fn next_hex(&mut self) -> Option<String> {
        match self.next_token()? {
            Token::Hex(h) => Some(h),
            _ => None,
        }
    }
}

fn parse_bfchar_section(tokens: &mut Tokenizer, cmap: &mut CMap) {
    loop {
        let src_hex = match tokens.next_token() {
            Some(Token::Hex(h)) => h,
            Some(Token::Keyword(k)) if k == "endbfchar" => return,
            Some(_) => continue,
            None => return,
        };
        let dst_hex = match tokens.next_token() {
            Some(Token::Hex(h)) => h,
            Some(Token::Keyword(k)) if k == "endbfchar" => return,
            _ => continue,
        };
        let code = decode_u32_hex(&src_hex);
        let unicode = decode_utf16be_hex(&dst_hex);
        cmap.insert_char(code, unicode);
    }
}

fn parse_bfrange_section(tokens: &mut Tokenizer, cmap: &mut CMap) {
    loop {
        let start_hex = match tokens.next_token() {
            Some(Token::Hex(h)) => h,
            Some(Token::Keyword(k)) if k == "endbfrange" => return,
            Some(_) => continue,
            None => return,
        };
        let end_hex = match tokens.next_token() {
            Some(Token::Hex(h)) => h,
            Some(Token::Keyword(k)) if k == "endbfrange" => return,
            _ => continue,
        };
        let start = decode_u32_hex(&start_hex);
        let end = decode_u32_hex(&end_hex);

        match tokens.next_token() {
            Some(Token::Hex(dst_hex)) => {
                let start_unicode = decode_u32_hex(&dst_hex);
                cmap.insert_range(start, end, start_unicode);
            },
            Some(Token::ArrayStart) => {
                let mut code = start;
                loop {
                    match tokens.next_token() {
                        Some(Token::Hex(h)) => {
                            let unicode = decode_utf16be_hex(&h);
                            cmap.insert_char(code, unicode);
                            code += 1;
                        },
                        Some(Token::ArrayEnd) => break,
                        Some(_) => continue,
                        None => break,
                    }
                }
            },
            Some(Token::Keyword(k)) if k == "endbfrange" => return,
            _ => {},
        }
    }
}
