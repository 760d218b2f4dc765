//! Text extraction pipeline (C7/C8): positioned fragments from a PDF content
//! stream, bidi-aware line assembly, and paragraph joining.

pub mod direction;
pub mod lines;
pub mod text;

pub use direction::Direction;
pub use lines::{group_lines, join_lines, Line};
pub use text::{TextExtractor, TextFragment};
