//! Extraction configuration shared by the PDF, DOCX, and EPUB readers.

/// Knobs that tune `text`/`markdown`/`document` extraction, shared across all
/// three readers even though not every reader honors every field:
/// `exclude_headers`/`exclude_footers` apply to DOCX (section headers/footers)
/// and are ignored by the PDF and EPUB readers; `navigation_exclusion` applies
/// to EPUB (drop a chapter if its spine position matches the nav document)
/// and is ignored elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub exclude_headers: bool,
    pub exclude_footers: bool,
    /// Spine index of the navigation document to exclude from extracted
    /// content, if the caller wants it dropped rather than rendered.
    pub navigation_exclusion: Option<u32>,
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self::default()
    }
}
