//! The uniform in-memory document model shared by the PDF, DOCX, and EPUB
//! readers (spec §3 "Document model" / C2).
//!
//! This module is pure data plus small rendering helpers: Markdown/plain-text
//! rendering of tables and body elements, and table-of-contents aggregation.
//! It has no parsing logic of its own — the PDF, DOCX, and EPUB readers each
//! populate it from their own source format.

/// A single page (PDF) or pseudo-page (DOCX/EPUB treat the whole document,
/// or a chapter, as one page).
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-indexed page number.
    pub number: usize,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees, one of 0/90/180/270.
    pub rotation: u16,
    pub elements: Vec<Element>,
}

impl Page {
    pub fn new(number: usize) -> Self {
        Page { number, width: 0.0, height: 0.0, rotation: 0, elements: Vec::new() }
    }
}

/// A single item within a `List` element.
#[derive(Debug, Clone)]
pub struct ListItem {
    pub text: String,
    pub level: usize,
    pub bullet: String,
}

/// A single cell within a `Table` element.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    pub text: String,
    pub row_span: usize,
    pub col_span: usize,
    pub is_header: bool,
    /// Freeform style hints (shading fill, vertical alignment, …), keyed by
    /// name; left as a grab-bag since DOCX cell styling has no fixed schema
    /// the document model otherwise needs to expose.
    pub style: std::collections::HashMap<String, String>,
}

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Cell { text: text.into(), row_span: 1, col_span: 1, is_header: false, style: Default::default() }
    }
}

/// Image byte capture: no decoding, per spec §1 Non-goal.
#[derive(Debug, Clone)]
pub struct Image {
    pub bytes: Vec<u8>,
    pub format: String,
    pub bbox: Option<crate::geometry::Rect>,
    pub dpi: Option<f64>,
    pub alt_text: Option<String>,
}

/// One element of page/body content.
#[derive(Debug, Clone)]
pub enum Element {
    Paragraph(String),
    Heading {
        level: u8,
        text: String,
    },
    List {
        ordered: bool,
        items: Vec<ListItem>,
    },
    Table {
        rows: Vec<Vec<Cell>>,
        has_grid: bool,
        confidence: f32,
    },
    Image(Image),
}

impl Element {
    /// Column count of a table element, derived from the widest row.
    pub fn table_columns(rows: &[Vec<Cell>]) -> usize {
        rows.iter()
            .map(|row| row.iter().map(|c| c.col_span.max(1)).sum::<usize>())
            .max()
            .unwrap_or(0)
    }
}

/// Document-level metadata, gathered from a PDF `/Info` dictionary, DOCX
/// `docProps/core.xml`, or EPUB OPF `<metadata>`.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub subject: Option<String>,
    pub keywords: Vec<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub language: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub rights: Option<String>,
    pub identifier: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
}

/// A table-of-contents entry, used by the EPUB reader; recursive to mirror
/// nested `<ol>`/`navPoint` structure.
#[derive(Debug, Clone)]
pub struct TocEntry {
    pub title: String,
    pub href: Option<String>,
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    /// Flatten the tree into a pre-order sequence of `(depth, entry)` pairs,
    /// useful for Markdown TOC rendering.
    pub fn flatten(entries: &[TocEntry]) -> Vec<(usize, &TocEntry)> {
        fn walk<'a>(entries: &'a [TocEntry], depth: usize, out: &mut Vec<(usize, &'a TocEntry)>) {
            for e in entries {
                out.push((depth, e));
                walk(&e.children, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        walk(entries, 0, &mut out);
        out
    }
}

/// A complete extracted document: ordered pages plus metadata.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub pages: Vec<Page>,
    pub metadata: Metadata,
}

impl Document {
    pub fn new() -> Self {
        Document::default()
    }

    /// Flat UTF-8 text across all pages, in body order, separated by blank
    /// lines between pages.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| plain_text_elements(&p.elements))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Markdown rendering across all pages.
    pub fn markdown(&self) -> String {
        self.pages
            .iter()
            .map(|p| markdown_elements(&p.elements))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn plain_text_elements(elements: &[Element]) -> String {
    let mut out = Vec::new();
    for el in elements {
        match el {
            Element::Paragraph(text) => out.push(text.clone()),
            Element::Heading { text, .. } => out.push(text.clone()),
            Element::List { ordered, items } => {
                for (i, item) in items.iter().enumerate() {
                    let indent = "  ".repeat(item.level);
                    let prefix = if *ordered && !item.bullet.is_empty() {
                        item.bullet.clone()
                    } else if *ordered {
                        format!("{}.", i + 1)
                    } else {
                        item.bullet.clone()
                    };
                    out.push(format!("{indent}{prefix} {}", item.text));
                }
            },
            Element::Table { rows, .. } => out.push(table_plain_text(rows)),
            Element::Image(img) => {
                if let Some(alt) = &img.alt_text {
                    out.push(format!("[image: {alt}]"));
                }
            },
        }
    }
    out.join("\n")
}

/// Render a table as plain text rows; cells join with a single space and
/// internal newlines are flattened to spaces, per spec §4.9.
pub fn table_plain_text(rows: &[Vec<Cell>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|c| c.text.replace('\n', " "))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn markdown_elements(elements: &[Element]) -> String {
    let mut out = Vec::new();
    for el in elements {
        match el {
            Element::Paragraph(text) => out.push(text.clone()),
            Element::Heading { level, text } => {
                out.push(format!("{} {}", "#".repeat((*level).clamp(1, 6) as usize), text));
            },
            Element::List { ordered, items } => {
                let mut counters: Vec<usize> = Vec::new();
                let mut lines = Vec::new();
                for item in items {
                    while counters.len() <= item.level {
                        counters.push(0);
                    }
                    counters.truncate(item.level + 1);
                    counters[item.level] += 1;
                    let indent = "  ".repeat(item.level);
                    let marker = if *ordered && !item.bullet.is_empty() {
                        item.bullet.clone()
                    } else if *ordered {
                        format!("{}.", counters[item.level])
                    } else {
                        "-".to_string()
                    };
                    lines.push(format!("{indent}{marker} {}", item.text));
                }
                out.push(lines.join("\n"));
            },
            Element::Table { rows, .. } => out.push(table_markdown(rows)),
            Element::Image(img) => {
                let alt = img.alt_text.clone().unwrap_or_default();
                out.push(format!("![{alt}]()"));
            },
        }
    }
    out.join("\n\n")
}

/// Render a table as GitHub-flavored Markdown, escaping `|` in cell text and
/// synthesizing a header-separator row from the first row.
pub fn table_markdown(rows: &[Vec<Cell>]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let cols = Element::table_columns(rows);
    let escape = |s: &str| s.replace('|', "\\|").replace('\n', " ");
    let mut out = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let mut cells: Vec<String> = row.iter().map(|c| escape(&c.text)).collect();
        while cells.len() < cols {
            cells.push(String::new());
        }
        out.push(format!("| {} |", cells.join(" | ")));
        if i == 0 {
            out.push(format!("| {} |", vec!["---"; cols].join(" | ")));
        }
    }
    out.join("\n")
}

/// Render a table as CSV (one of the "small helpers" spec §2/C2 calls for).
pub fn table_csv(rows: &[Vec<Cell>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|c| {
                    let escaped = c.text.replace('"', "\"\"");
                    if escaped.contains(',') || escaped.contains('"') || escaped.contains('\n') {
                        format!("\"{escaped}\"")
                    } else {
                        escaped
                    }
                })
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|s| Cell::new(*s)).collect()
    }

    #[test]
    fn table_columns_accounts_for_colspan() {
        let mut first_row = row(&["a", "b"]);
        first_row[0].col_span = 2;
        let rows = vec![first_row, row(&["c", "d", "e"])];
        assert_eq!(Element::table_columns(&rows), 3);
    }

    #[test]
    fn markdown_table_escapes_pipe() {
        let rows = vec![row(&["a|b"])];
        let md = table_markdown(&rows);
        assert!(md.contains("a\\|b"));
    }

    #[test]
    fn plain_text_table_flattens_newlines() {
        let mut cell = Cell::new("line1\nline2");
        cell.col_span = 1;
        let rows = vec![vec![cell]];
        assert_eq!(table_plain_text(&rows), "line1 line2");
    }

    #[test]
    fn toc_flatten_preserves_depth() {
        let toc = vec![TocEntry {
            title: "One".into(),
            href: Some("c1.xhtml".into()),
            children: vec![TocEntry { title: "One.a".into(), href: None, children: vec![] }],
        }];
        let flat = TocEntry::flatten(&toc);
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[1].0, 1);
    }

    #[test]
    fn document_markdown_joins_pages() {
        let mut doc = Document::new();
        let mut p1 = Page::new(1);
        p1.elements.push(Element::Heading { level: 1, text: "Title".into() });
        let mut p2 = Page::new(2);
        p2.elements.push(Element::Paragraph("Body".into()));
        doc.pages.push(p1);
        doc.pages.push(p2);
        assert_eq!(doc.markdown(), "# Title\n\nBody");
    }
}
