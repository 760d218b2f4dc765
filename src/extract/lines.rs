//! Line assembly: grouping positioned text fragments into reading-ordered
//! lines, inferring spaces between fragments, and joining lines into
//! paragraphs, per spec §4.8.

use crate::extract::direction::{self, Direction};
use crate::extract::text::TextFragment;

/// Multiplier applied to `typicalCharGap` in the character-level, explicit-
/// space branch of the space-insertion policy (spec §4.8 step 3).
pub const TYPICAL_GAP_TOLERANCE: f64 = 5.0;

/// A single assembled line: its fragments in reading order and its resolved
/// direction.
#[derive(Debug, Clone)]
pub struct Line {
    pub fragments: Vec<TextFragment>,
    pub direction: Direction,
}

impl Line {
    /// Render this line's text, inserting spaces per the adaptive policy.
    pub fn render(&self) -> String {
        if self.fragments.is_empty() {
            return String::new();
        }
        let metrics = LineMetrics::compute(&self.fragments);
        let mut out = String::new();
        out.push_str(&self.fragments[0].text);
        for pair in self.fragments.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let d = horizontal_distance(a, b, self.direction);
            if should_insert_space(a, b, d, &metrics) {
                out.push(' ');
            }
            out.push_str(&b.text);
        }
        out
    }
}

/// Per-line statistics used to drive the space-insertion policy.
struct LineMetrics {
    avg_fragment_len: f64,
    is_character_level: bool,
    has_explicit_spaces: bool,
    median_gap: f64,
    typical_char_gap: f64,
    #[allow(dead_code)]
    max_non_space_gap: f64,
    #[allow(dead_code)]
    avg_gap: f64,
}

impl LineMetrics {
    fn compute(fragments: &[TextFragment]) -> Self {
        let total_codepoints: usize = fragments.iter().map(|f| f.text.chars().count()).sum();
        let avg_fragment_len = if fragments.is_empty() {
            0.0
        } else {
            total_codepoints as f64 / fragments.len() as f64
        };
        let is_character_level = avg_fragment_len <= 2.0;
        let has_explicit_spaces = fragments
            .iter()
            .any(|f| f.text.chars().all(char::is_whitespace) || f.text.contains(' '));

        let mut gaps: Vec<f64> = Vec::new();
        for pair in fragments.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.text.chars().all(char::is_whitespace) || b.text.chars().all(char::is_whitespace) {
                continue;
            }
            let d = b.x - (a.x + a.width);
            if d > 0.0 {
                gaps.push(d);
            }
        }
        gaps.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let median_gap = percentile(&gaps, 0.10);
        let typical_char_gap = percentile(&gaps, 0.25);
        let max_non_space_gap = gaps.last().copied().unwrap_or(0.0);
        let avg_gap = if gaps.is_empty() { 0.0 } else { gaps.iter().sum::<f64>() / gaps.len() as f64 };

        LineMetrics {
            avg_fragment_len,
            is_character_level,
            has_explicit_spaces,
            median_gap,
            typical_char_gap,
            max_non_space_gap,
            avg_gap,
        }
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Horizontal distance between successive fragments A, B on a line of the
/// given direction, per spec §4.8.
pub fn horizontal_distance(a: &TextFragment, b: &TextFragment, dir: Direction) -> f64 {
    match dir {
        Direction::Rtl => a.x - (b.x + b.width),
        _ => b.x - (a.x + a.width),
    }
}

fn should_insert_space(a: &TextFragment, b: &TextFragment, d: f64, m: &LineMetrics) -> bool {
    if a.text.ends_with(|c: char| c.is_whitespace()) || b.text.starts_with(|c: char| c.is_whitespace()) {
        return false;
    }
    if d < 0.0 || d < a.font_size * 0.05 {
        return false;
    }
    if m.is_character_level && m.has_explicit_spaces {
        if m.typical_char_gap > 0.0 {
            return d >= TYPICAL_GAP_TOLERANCE * m.typical_char_gap;
        }
        return false;
    }
    if m.is_character_level {
        let threshold = (a.font_size * 0.8).max(3.0 * m.median_gap);
        return d >= threshold;
    }
    let space_width = a.space_width.unwrap_or(a.font_size * 0.25);
    d >= 0.5 * space_width
}

/// Group a stream of emitted fragments (in emission order) into lines, per
/// the Δy-threshold rule in spec §4.8.
pub fn group_lines(fragments: Vec<TextFragment>) -> Vec<Line> {
    let mut lines: Vec<Vec<TextFragment>> = Vec::new();
    for frag in fragments {
        let start_new = match lines.last().and_then(|l| l.last()) {
            Some(prev) => (frag.y - prev.y).abs() > 0.5 * prev.height,
            None => true,
        };
        if start_new {
            lines.push(vec![frag]);
        } else {
            lines.last_mut().unwrap().push(frag);
        }
    }

    lines
        .into_iter()
        .map(|mut frags| {
            let dirs: Vec<Direction> = frags.iter().map(|f| f.direction).collect();
            let dir = direction::line_direction(dirs.iter());
            match dir {
                Direction::Rtl => frags.sort_by(|a, b| b.x.partial_cmp(&a.x).unwrap()),
                _ => frags.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap()),
            }
            Line { fragments: frags, direction: dir }
        })
        .collect()
}

/// Join assembled lines into a single string, inserting a paragraph break
/// (`"\n\n"`) when successive lines' Δy exceeds 1.5× the previous line's
/// fragment height, otherwise a simple `"\n"`.
pub fn join_lines(lines: &[Line]) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            let prev = &lines[i - 1];
            let prev_height = prev.fragments.last().map(|f| f.height).unwrap_or(0.0);
            let prev_y = prev.fragments.last().map(|f| f.y).unwrap_or(0.0);
            let this_y = line.fragments.first().map(|f| f.y).unwrap_or(0.0);
            let dy = (this_y - prev_y).abs();
            if prev_height > 0.0 && dy > prev_height * 1.5 {
                out.push_str("\n\n");
            } else {
                out.push('\n');
            }
        }
        out.push_str(&line.render());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, x: f64, y: f64, width: f64, height: f64, font_size: f64) -> TextFragment {
        TextFragment {
            text: text.to_string(),
            x,
            y,
            width,
            height,
            font_name: "/F1".to_string(),
            font_size,
            direction: direction::string_direction(text),
            space_width: None,
        }
    }

    #[test]
    fn groups_by_y_delta() {
        let frags = vec![
            frag("Hello", 0.0, 100.0, 30.0, 10.0, 10.0),
            frag("World", 40.0, 100.0, 30.0, 10.0, 10.0),
            frag("Next", 0.0, 80.0, 30.0, 10.0, 10.0),
        ];
        let lines = group_lines(frags);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].fragments.len(), 2);
        assert_eq!(lines[1].fragments.len(), 1);
    }

    #[test]
    fn word_level_space_inserted_past_half_space_width() {
        let frags = vec![
            frag("Hello", 0.0, 0.0, 30.0, 10.0, 10.0),
            frag("World", 35.0, 0.0, 30.0, 10.0, 10.0),
        ];
        let lines = group_lines(frags);
        let rendered = lines[0].render();
        assert_eq!(rendered, "Hello World");
    }

    #[test]
    fn no_space_when_gap_too_small() {
        let frags = vec![
            frag("Hel", 0.0, 0.0, 15.0, 10.0, 10.0),
            frag("lo", 15.1, 0.0, 10.0, 10.0, 10.0),
        ];
        let lines = group_lines(frags);
        assert_eq!(lines[0].render(), "Hello");
    }

    #[test]
    fn rtl_line_sorts_descending_by_x() {
        let mut a = frag("\u{05D0}", 50.0, 0.0, 10.0, 10.0, 10.0);
        a.direction = Direction::Rtl;
        let mut b = frag("\u{05D1}", 0.0, 0.0, 10.0, 10.0, 10.0);
        b.direction = Direction::Rtl;
        let lines = group_lines(vec![a, b]);
        assert_eq!(lines[0].direction, Direction::Rtl);
        assert_eq!(lines[0].fragments[0].x, 50.0);
    }

    #[test]
    fn paragraph_break_on_large_y_delta() {
        let l1 = Line {
            fragments: vec![frag("A", 0.0, 100.0, 10.0, 10.0, 10.0)],
            direction: Direction::Ltr,
        };
        let l2 = Line {
            fragments: vec![frag("B", 0.0, 70.0, 10.0, 10.0, 10.0)],
            direction: Direction::Ltr,
        };
        let joined = join_lines(&[l1, l2]);
        assert_eq!(joined, "A\n\nB");
    }

    #[test]
    fn simple_line_break_on_small_y_delta() {
        let l1 = Line {
            fragments: vec![frag("A", 0.0, 100.0, 10.0, 10.0, 10.0)],
            direction: Direction::Ltr,
        };
        let l2 = Line {
            fragments: vec![frag("B", 0.0, 88.0, 10.0, 10.0, 10.0)],
            direction: Direction::Ltr,
        };
        let joined = join_lines(&[l1, l2]);
        assert_eq!(joined, "A\nB");
    }
}
