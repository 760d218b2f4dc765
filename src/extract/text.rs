//! Text extractor (C7): drives a sequence of content-stream operators
//! through a graphics-state machine and a font registry, emitting positioned
//! `TextFragment` records.

use crate::content::{GraphicsStateStack, Operator, TextElement};
use crate::extract::direction::{self, Direction};
use crate::fonts::Font;
use crate::geometry::Matrix;
use std::collections::HashMap;

/// A single positioned, decoded run of text, emitted per `Tj`/`'`/`"`.
#[derive(Debug, Clone)]
pub struct TextFragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub font_name: String,
    pub font_size: f64,
    pub direction: Direction,
    /// Font-reported width of U+0020 at this fragment's font size, if known;
    /// used as the word-level space-insertion fallback in `extract::lines`.
    pub space_width: Option<f64>,
}

/// Drives content-stream operators through a `GraphicsState` and font
/// registry, emitting `TextFragment`s.
pub struct TextExtractor {
    gs: GraphicsStateStack,
    in_text_object: bool,
    fonts: HashMap<String, Font>,
    fragments: Vec<TextFragment>,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor {
    pub fn new() -> Self {
        TextExtractor {
            gs: GraphicsStateStack::new(),
            in_text_object: false,
            fonts: HashMap::new(),
            fragments: Vec::new(),
        }
    }

    /// Register a font under both `"name"` and `"/name"`, per spec §4.7's
    /// page-resources registration rule.
    pub fn register_font(&mut self, name: &str, font: Font) {
        let bare = name.trim_start_matches('/').to_string();
        self.fonts.insert(bare.clone(), font.clone());
        self.fonts.insert(format!("/{bare}"), font);
    }

    fn lookup_font(&self, name: &str) -> Option<&Font> {
        self.fonts.get(name).or_else(|| self.fonts.get(name.trim_start_matches('/')))
    }

    /// Process a full operator sequence and return the emitted fragments.
    pub fn extract(mut self, operators: &[Operator]) -> Vec<TextFragment> {
        for op in operators {
            self.apply(op);
        }
        self.fragments
    }

    fn apply(&mut self, op: &Operator) {
        match op {
            Operator::SaveState => self.gs.save(),
            Operator::RestoreState => {
                if self.gs.restore_checked().is_err() {
                    log::warn!("ignoring unbalanced Q operator during text extraction");
                }
            },
            Operator::Cm { a, b, c, d, e, f } => {
                let m = Matrix { a: *a, b: *b, c: *c, d: *d, e: *e, f: *f };
                self.gs.current_mut().ctm = m.multiply(&self.gs.current().ctm);
            },
            Operator::BeginText => {
                self.in_text_object = true;
                self.gs.current_mut().text_matrix = Matrix::identity();
                self.gs.current_mut().text_line_matrix = Matrix::identity();
            },
            Operator::EndText => self.in_text_object = false,
            Operator::Tf { font, size } => {
                if self.lookup_font(font).is_none() {
                    log::debug!("auto-registering synthetic Helvetica for unresolved font {font}");
                    self.register_font(font, Font::synthetic_helvetica(font));
                }
                self.gs.current_mut().font_name = Some(font.clone());
                self.gs.current_mut().font_size = *size;
            },
            Operator::Tc { char_space } => self.gs.current_mut().char_space = *char_space,
            Operator::Tw { word_space } => self.gs.current_mut().word_space = *word_space,
            Operator::Tz { scale } => self.gs.current_mut().horizontal_scaling = *scale,
            Operator::TL { leading } => self.gs.current_mut().leading = *leading,
            Operator::Tr { render } => self.gs.current_mut().render_mode = *render,
            Operator::Ts { rise } => self.gs.current_mut().text_rise = *rise,
            Operator::Tm { a, b, c, d, e, f } => {
                let m = Matrix { a: *a, b: *b, c: *c, d: *d, e: *e, f: *f };
                self.gs.current_mut().text_matrix = m;
                self.gs.current_mut().text_line_matrix = m;
            },
            Operator::Td { tx, ty } => self.translate_text(*tx, *ty),
            Operator::TD { tx, ty } => {
                self.gs.current_mut().leading = -*ty;
                self.translate_text(*tx, *ty);
            },
            Operator::TStar => self.next_line(),
            Operator::Tj { text } => self.show_text(text),
            Operator::TJ { array } => self.show_text_array(array),
            Operator::Quote { text } => {
                self.next_line();
                self.show_text(text);
            },
            Operator::DoubleQuote { word_space, char_space, text } => {
                self.gs.current_mut().word_space = *word_space;
                self.gs.current_mut().char_space = *char_space;
                self.next_line();
                self.show_text(text);
            },
            _ => {},
        }
    }

    fn translate_text(&mut self, tx: f32, ty: f32) {
        let translation = Matrix::translation(tx, ty);
        let new_matrix = translation.multiply(&self.gs.current().text_line_matrix);
        self.gs.current_mut().text_matrix = new_matrix;
        self.gs.current_mut().text_line_matrix = new_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.gs.current().leading;
        self.translate_text(0.0, -leading);
    }

    fn effective_font_size(&self) -> f64 {
        let state = self.gs.current();
        state.font_size as f64 * state.text_matrix.effective_scale() as f64
    }

    fn show_text_array(&mut self, array: &[TextElement]) {
        for elem in array {
            match elem {
                TextElement::String(bytes) => self.show_text(bytes),
                TextElement::Offset(n) => {
                    let font_size = self.gs.current().font_size;
                    let tx = -n * font_size / 1000.0;
                    let translation = Matrix::translation(tx, 0.0);
                    let new_matrix = translation.multiply(&self.gs.current().text_matrix);
                    self.gs.current_mut().text_matrix = new_matrix;
                },
            }
        }
    }

    fn show_text(&mut self, bytes: &[u8]) {
        if !self.in_text_object {
            return;
        }
        let state = self.gs.current().clone();
        let font_name = state.font_name.clone().unwrap_or_default();
        let font = match self.lookup_font(&font_name) {
            Some(f) => f.clone(),
            None => {
                log::warn!("no font registered for {font_name}, skipping Tj");
                return;
            },
        };

        let decoded = font.decode_string(bytes);
        let effective_size = self.effective_font_size();
        let string_width_1000 = font.string_width(&decoded);
        let width = string_width_1000 * effective_size / 1000.0;

        let device_matrix = state.text_matrix.multiply(&state.ctm);
        let origin = device_matrix.transform_point(0.0, 0.0);

        let dir = direction::string_direction(&decoded);
        let space_width = Some(font.width_of(' ') * effective_size / 1000.0);

        if !decoded.is_empty() {
            self.fragments.push(TextFragment {
                text: decoded.clone(),
                x: origin.x as f64,
                y: origin.y as f64,
                width,
                height: effective_size.max(1.0),
                font_name,
                font_size: effective_size,
                direction: dir,
                space_width,
            });
        }

        let n = decoded.chars().count() as f32;
        let space_count = decoded.chars().filter(|&c| c == ' ').count() as f32;
        let tx = (width as f32 + n * state.char_space + space_count * state.word_space)
            * state.horizontal_scaling
            / 100.0;
        let translation = Matrix::translation(tx, 0.0);
        let new_matrix = translation.multiply(&state.text_matrix);
        self.gs.current_mut().text_matrix = new_matrix;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::parse_content_stream;

    #[test]
    fn emits_fragment_for_simple_tj() {
        let data = b"BT /F1 12 Tf 100 700 Td (Hello) Tj ET";
        let ops = parse_content_stream(data).unwrap();
        let extractor = TextExtractor::new();
        let frags = extractor.extract(&ops);
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].text, "Hello");
        assert_eq!(frags[0].font_size, 12.0);
    }

    #[test]
    fn unregistered_font_gets_synthetic_helvetica() {
        let data = b"BT /F9 10 Tf (X) Tj ET";
        let ops = parse_content_stream(data).unwrap();
        let extractor = TextExtractor::new();
        let frags = extractor.extract(&ops);
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].text, "X");
    }

    #[test]
    fn tj_array_applies_adjustment_without_emitting_fragment() {
        let data = b"BT /F1 12 Tf (A) (B) -250 (C) TJ ET";
        let ops = parse_content_stream(data).unwrap();
        let extractor = TextExtractor::new();
        let frags = extractor.extract(&ops);
        // Three strings show as three fragments; the numeric adjustment
        // between B and C does not emit one of its own.
        assert_eq!(frags.len(), 3);
        assert_eq!(frags[0].text, "A");
        assert_eq!(frags[2].text, "C");
    }

    #[test]
    fn quote_operator_moves_to_next_line_then_shows() {
        let data = b"BT /F1 12 Tf 14 TL 100 700 Td (First) Tj (Second) ' ET";
        let ops = parse_content_stream(data).unwrap();
        let extractor = TextExtractor::new();
        let frags = extractor.extract(&ops);
        assert_eq!(frags.len(), 2);
        assert!(frags[1].y < frags[0].y);
    }

    #[test]
    fn text_outside_bt_et_is_ignored() {
        let data = b"/F1 12 Tf (Hello) Tj";
        let ops = parse_content_stream(data).unwrap();
        let extractor = TextExtractor::new();
        let frags = extractor.extract(&ops);
        assert!(frags.is_empty());
    }
}
