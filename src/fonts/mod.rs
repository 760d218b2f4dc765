//! Font handling and encoding.
//!
//! This module provides the font model, single-byte encoding tables, and
//! ToUnicode CMap parsing needed to decode character codes from a content
//! stream into Unicode text.

pub mod cmap;
pub mod encoding;
pub mod font;
pub mod glyph_list;

pub use cmap::CMap;
pub use encoding::{DifferenceEntry, Encoding, NamedEncoding};
pub use font::{CidFont, Font, FontSubtype, TrueTypeMetrics, DEFAULT_WIDTH};
pub use glyph_list::glyph_name_to_unicode;
