#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::wrong_self_convention)]
#![allow(clippy::explicit_counter_loop)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::redundant_guards)]
#![allow(clippy::match_like_matches_macro)]

//! # Tabula
//!
//! Semantic content extraction from PDF, DOCX (Office Open XML), and EPUB
//! documents: flat text, Markdown, or a structured document model of pages,
//! paragraphs, headings, lists, tables, and images.
//!
//! Three independent readers share one [`model::Document`]:
//!
//! - [`PdfDocument`] — content-stream interpretation, font/encoding
//!   resolution, and line assembly over the object-level PDF container.
//! - [`DocxDocument`] — WordprocessingML style cascade, heading detection,
//!   numbering resolution, and table parsing over a ZIP/XML package.
//! - [`EpubDocument`] — OPF package parsing, per-chapter XHTML delegation,
//!   and EPUB-2/EPUB-3 table-of-contents resolution over a ZIP package.
//!
//! ## Quick start
//!
//! ```no_run
//! use tabula::PdfDocument;
//!
//! # fn main() -> tabula::Result<()> {
//! let mut doc = PdfDocument::open("paper.pdf")?;
//! println!("{}", doc.markdown()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

// Error handling
pub mod error;

// Shared document model and extraction configuration
pub mod config;
pub mod model;

// PDF object-level container (C3/C4/C6/C8)
pub mod decoders;
pub mod geometry;
pub mod lexer;
pub mod object;
pub mod objstm;
pub mod parser;
pub mod parser_config;
pub mod xref;
pub mod xref_reconstruction;

// PDF content-stream interpretation, fonts, and line assembly (C5/C7)
pub mod content;
pub mod extract;
pub mod fonts;

// Format readers (C9/C10/C11)
pub mod docx;
pub mod epub;
pub mod pdf;

// Re-exports: one reader type per format, plus the shared model/config/error
// surface (spec §6 external interfaces).
pub use config::ExtractOptions;
pub use docx::DocxDocument;
pub use epub::EpubDocument;
pub use error::{Error, Result};
pub use model::{Cell, Document, Element, Image, ListItem, Metadata, Page, TocEntry};
pub use pdf::PdfDocument;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
