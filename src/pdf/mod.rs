//! External interface for PDF extraction (C11): object loading with
//! cycle/recursion protection, page-tree walking with attribute inheritance,
//! content-stream retrieval, and the `Open`/`Text`/`Markdown`/`Document`/
//! `Metadata` surface.

mod font_loader;

use crate::config::ExtractOptions;
use crate::content::parse_content_stream;
use crate::error::{Error, Result};
use crate::extract::lines::{group_lines, Line};
use crate::extract::text::TextExtractor;
use crate::model::{Document, Element, Metadata, Page};
use crate::object::Object;
use crate::objstm::parse_object_stream;
use crate::parser_config::ParserOptions;
use crate::xref::{find_xref_offset, parse_xref, CrossRefTable, XRefEntryType};
use crate::xref_reconstruction::reconstruct_xref;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

/// Page attributes inherited down the `/Pages` tree (spec §4.17): resources,
/// media box, and rotation all cascade from ancestor `/Pages` nodes unless a
/// leaf `/Page` overrides them.
#[derive(Debug, Clone)]
struct Inherited {
    resources: HashMap<String, Object>,
    media_box: [f64; 4],
    rotate: i64,
}

impl Default for Inherited {
    fn default() -> Self {
        Inherited { resources: HashMap::new(), media_box: [0.0, 0.0, 612.0, 792.0], rotate: 0 }
    }
}

#[derive(Debug, Clone)]
struct PageRecord {
    dict: HashMap<String, Object>,
    inherited: Inherited,
}

/// A parsed PDF document, opened read-only. Required-part parsing (xref,
/// trailer, page tree) happens at `open`/`open_reader` time; content-stream
/// extraction is performed lazily, per call, since it is the expensive part.
pub struct PdfDocument {
    data: Vec<u8>,
    trailer: HashMap<String, Object>,
    options: ParserOptions,
    object_cache: HashMap<u32, Object>,
    objstm_cache: HashMap<u32, HashMap<u32, Object>>,
    xref: CrossRefTable,
    pages: Vec<PageRecord>,
}

impl PdfDocument {
    /// Open a PDF file from a filesystem path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::open_reader(file)
    }

    /// Open a PDF from any seekable reader (an in-memory buffer, a network
    /// stream wrapped in a `Cursor`, etc).
    pub fn open_reader<R: Read + Seek>(mut reader: R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;

        if data.len() < 8 || &data[0..5] != b"%PDF-" {
            let prefix = String::from_utf8_lossy(&data[..data.len().min(8)]).to_string();
            return Err(Error::InvalidHeader(prefix));
        }

        let (xref, trailer) = Self::load_xref(&data)?;

        if trailer.contains_key("Encrypt") {
            return Err(Error::Unsupported("encrypted PDFs are not supported".to_string()));
        }

        let mut doc = PdfDocument {
            data,
            trailer,
            options: ParserOptions::lenient(),
            object_cache: HashMap::new(),
            objstm_cache: HashMap::new(),
            xref,
            pages: Vec::new(),
        };
        doc.pages = doc.walk_page_tree()?;
        Ok(doc)
    }

    fn load_xref(data: &[u8]) -> Result<(CrossRefTable, HashMap<String, Object>)> {
        let mut cursor = Cursor::new(data);
        match find_xref_offset(&mut cursor).and_then(|off| parse_xref(&mut cursor, off)) {
            Ok(table) => {
                let trailer = table.trailer().cloned().unwrap_or_default();
                Ok((table, trailer))
            },
            Err(e) => {
                log::warn!("xref table unreadable ({e}), reconstructing by full-file scan");
                let mut cursor = Cursor::new(data);
                let (table, trailer_obj) = reconstruct_xref(&mut cursor)?;
                let trailer = trailer_obj.as_dict().cloned().unwrap_or_default();
                Ok((table, trailer))
            },
        }
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Flat UTF-8 text across all pages.
    pub fn text(&mut self) -> Result<String> {
        self.text_with_options(&ExtractOptions::default())
    }

    pub fn text_with_options(&mut self, opts: &ExtractOptions) -> Result<String> {
        Ok(self.document_with_options(opts)?.plain_text())
    }

    /// Markdown rendering across all pages.
    pub fn markdown(&mut self) -> Result<String> {
        self.markdown_with_options(&ExtractOptions::default())
    }

    pub fn markdown_with_options(&mut self, opts: &ExtractOptions) -> Result<String> {
        Ok(self.document_with_options(opts)?.markdown())
    }

    /// The full structured document model.
    pub fn document(&mut self) -> Result<Document> {
        self.document_with_options(&ExtractOptions::default())
    }

    pub fn document_with_options(&mut self, _opts: &ExtractOptions) -> Result<Document> {
        let metadata = self.metadata()?;
        let mut pages = Vec::with_capacity(self.pages.len());
        for idx in 0..self.pages.len() {
            pages.push(self.extract_page(idx)?);
        }
        Ok(Document { pages, metadata })
    }

    /// Document-level metadata from the `/Info` dictionary (spec §4.16).
    pub fn metadata(&mut self) -> Result<Metadata> {
        let Some(info_obj) = self.trailer.get("Info").cloned() else {
            return Ok(Metadata::default());
        };
        let resolved = self.deref(info_obj)?;
        let Some(dict) = resolved.as_dict().cloned() else {
            return Ok(Metadata::default());
        };

        let text_field = |o: Option<&Object>| o.and_then(|o| o.as_string()).map(pdf_text_string);

        Ok(Metadata {
            title: text_field(dict.get("Title")),
            authors: text_field(dict.get("Author")).into_iter().collect(),
            subject: text_field(dict.get("Subject")),
            keywords: text_field(dict.get("Keywords"))
                .map(|k| k.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                .unwrap_or_default(),
            creator: text_field(dict.get("Creator")),
            producer: text_field(dict.get("Producer")),
            created: text_field(dict.get("CreationDate")).and_then(|s| parse_pdf_date(&s)),
            modified: text_field(dict.get("ModDate")).and_then(|s| parse_pdf_date(&s)),
            ..Default::default()
        })
    }

    /// Closes the document. Present for interface symmetry with the DOCX and
    /// EPUB readers, which hold an open `ZipArchive` that benefits from an
    /// explicit drop point; a PDF reader holds nothing else to release.
    pub fn close(self) -> Result<()> {
        Ok(())
    }

    fn extract_page(&mut self, idx: usize) -> Result<Page> {
        let record = self.pages[idx].clone();
        let mut page = Page::new(idx + 1);
        let mb = record.inherited.media_box;
        page.width = (mb[2] - mb[0]).abs();
        page.height = (mb[3] - mb[1]).abs();
        page.rotation = normalize_rotation(record.inherited.rotate);

        let fonts = self.load_page_fonts(&record.inherited.resources)?;
        let content = self.page_content_bytes(&record.dict)?;
        let operators = parse_content_stream(&content)?;

        let mut extractor = TextExtractor::new();
        for (name, font) in fonts {
            extractor.register_font(&name, font);
        }
        let fragments = extractor.extract(&operators);
        let lines = group_lines(fragments);
        page.elements = elements_from_lines(&lines);
        Ok(page)
    }

    fn load_page_fonts(&mut self, resources: &HashMap<String, Object>) -> Result<Vec<(String, crate::fonts::Font)>> {
        let Some(font_dict_obj) = resources.get("Font").cloned() else { return Ok(Vec::new()) };
        let font_dict = match self.deref(font_dict_obj)? {
            Object::Dictionary(d) => d,
            _ => return Ok(Vec::new()),
        };

        let mut out = Vec::new();
        for (name, obj) in font_dict {
            let resolved = match self.deref(obj) {
                Ok(o) => o,
                Err(e) => {
                    log::warn!("failed to resolve font {name}: {e}");
                    continue;
                },
            };
            let Some(dict) = resolved.as_dict().cloned() else { continue };
            match font_loader::load_font(self, &name, &dict) {
                Ok(font) => out.push((name, font)),
                Err(e) => log::warn!("failed to load font {name}: {e}"),
            }
        }
        Ok(out)
    }

    fn page_content_bytes(&mut self, dict: &HashMap<String, Object>) -> Result<Vec<u8>> {
        let Some(contents) = dict.get("Contents").cloned() else { return Ok(Vec::new()) };
        let resolved = self.deref(contents)?;
        let mut data = Vec::new();
        match resolved {
            Object::Stream { .. } => data.extend(resolved.decode_stream_data()?),
            Object::Array(items) => {
                for item in items {
                    let stream = self.deref(item)?;
                    if let Object::Stream { .. } = &stream {
                        data.extend(stream.decode_stream_data()?);
                        data.push(b'\n');
                    }
                }
            },
            _ => {},
        }
        Ok(data)
    }

    /// Resolve an `Object` to its final, non-reference value, following
    /// indirect-reference chains with cycle and depth protection.
    pub(crate) fn deref(&mut self, obj: Object) -> Result<Object> {
        let mut current = obj;
        let mut seen = HashSet::new();
        let mut depth = 0u32;
        loop {
            let Object::Reference(r) = current else { return Ok(current) };
            if !seen.insert(r) {
                return Err(Error::CircularReference(r));
            }
            depth += 1;
            if depth > self.options.max_recursion_depth {
                return Err(Error::RecursionLimitExceeded(depth));
            }
            current = self.get_object(r.id, r.gen)?;
        }
    }

    fn get_object(&mut self, id: u32, gen: u16) -> Result<Object> {
        if let Some(obj) = self.object_cache.get(&id) {
            return Ok(obj.clone());
        }
        let entry = self.xref.get(id).cloned().ok_or(Error::ObjectNotFound(id, gen))?;
        let obj = match entry.entry_type {
            XRefEntryType::Free => return Err(Error::ObjectNotFound(id, gen)),
            XRefEntryType::Uncompressed => self.parse_object_at_offset(entry.offset)?,
            XRefEntryType::Compressed => {
                let stream_num = entry.offset as u32;
                if let Some(cached) = self.objstm_cache.get(&stream_num) {
                    cached.get(&id).cloned().ok_or(Error::ObjectNotFound(id, gen))?
                } else {
                    let stream_obj = self.get_object(stream_num, 0)?;
                    let objects = parse_object_stream(&stream_obj)?;
                    let found = objects.get(&id).cloned();
                    self.objstm_cache.insert(stream_num, objects);
                    found.ok_or(Error::ObjectNotFound(id, gen))?
                }
            },
        };
        self.object_cache.insert(id, obj.clone());
        Ok(obj)
    }

    /// Parse the indirect object at a known byte offset: `N G obj <object>
    /// endobj`. Shares the token-skipping pattern the xref-stream parser
    /// uses to unwrap an indirect object header.
    fn parse_object_at_offset(&self, offset: u64) -> Result<Object> {
        let start = offset as usize;
        if start >= self.data.len() {
            return Err(Error::ParseError { offset: start, reason: "object offset past end of file".to_string() });
        }
        let input = &self.data[start..];

        let (rest, _obj_num) = crate::lexer::token(input)
            .map_err(|e| Error::ParseError { offset: start, reason: format!("object number: {e}") })?;
        let (rest, _gen) = crate::lexer::token(rest)
            .map_err(|e| Error::ParseError { offset: start, reason: format!("generation number: {e}") })?;
        let (rest, obj_keyword) = crate::lexer::token(rest)
            .map_err(|e| Error::ParseError { offset: start, reason: format!("'obj' keyword: {e}") })?;
        if !matches!(obj_keyword, crate::lexer::Token::ObjStart) {
            return Err(Error::ParseError { offset: start, reason: "expected 'obj' keyword".to_string() });
        }

        let (_, object) = crate::parser::parse_object(rest)
            .map_err(|e| Error::ParseError { offset: start, reason: format!("object body: {e}") })?;
        Ok(object)
    }

    fn walk_page_tree(&mut self) -> Result<Vec<PageRecord>> {
        let root_obj =
            self.trailer.get("Root").cloned().ok_or_else(|| Error::InvalidPdf("trailer missing /Root".to_string()))?;
        let root = self.deref(root_obj)?;
        let root_dict = root.as_dict().cloned().ok_or_else(|| Error::InvalidPdf("/Root is not a dictionary".to_string()))?;
        let pages_obj = root_dict
            .get("Pages")
            .cloned()
            .ok_or_else(|| Error::InvalidPdf("catalog missing /Pages".to_string()))?;

        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        self.walk_node(pages_obj, Inherited::default(), &mut visited, &mut pages)?;
        Ok(pages)
    }

    fn walk_node(
        &mut self,
        node_obj: Object,
        parent: Inherited,
        visited: &mut HashSet<(u32, u16)>,
        out: &mut Vec<PageRecord>,
    ) -> Result<()> {
        if let Object::Reference(r) = &node_obj {
            if !visited.insert((r.id, r.gen)) {
                log::warn!("cycle detected in page tree at object {r}, skipping");
                return Ok(());
            }
        }
        let node = self.deref(node_obj)?;
        let Some(dict) = node.as_dict().cloned() else { return Ok(()) };

        let inherited = self.merge_inherited(&dict, &parent)?;
        let node_type = dict.get("Type").and_then(|o| o.as_name()).unwrap_or("");

        if node_type == "Pages" || dict.contains_key("Kids") {
            let Some(kids_obj) = dict.get("Kids").cloned() else { return Ok(()) };
            let kids = self.deref(kids_obj)?;
            let Object::Array(items) = kids else { return Ok(()) };
            for kid in items {
                self.walk_node(kid, inherited.clone(), visited, out)?;
            }
        } else {
            out.push(PageRecord { dict, inherited });
        }
        Ok(())
    }

    fn merge_inherited(&mut self, dict: &HashMap<String, Object>, parent: &Inherited) -> Result<Inherited> {
        let resources = if let Some(obj) = dict.get("Resources").cloned() {
            match self.deref(obj)? {
                Object::Dictionary(d) => d,
                _ => parent.resources.clone(),
            }
        } else {
            parent.resources.clone()
        };

        let media_box = if let Some(obj) = dict.get("MediaBox").cloned() {
            self.parse_rect(obj)?.unwrap_or(parent.media_box)
        } else {
            parent.media_box
        };

        let rotate = if let Some(obj) = dict.get("Rotate").cloned() {
            self.deref(obj)?.as_integer().unwrap_or(parent.rotate)
        } else {
            parent.rotate
        };

        Ok(Inherited { resources, media_box, rotate })
    }

    fn parse_rect(&mut self, obj: Object) -> Result<Option<[f64; 4]>> {
        let resolved = self.deref(obj)?;
        let Object::Array(items) = resolved else { return Ok(None) };
        if items.len() != 4 {
            return Ok(None);
        }
        let mut out = [0.0; 4];
        for (i, item) in items.into_iter().enumerate() {
            let resolved = self.deref(item)?;
            out[i] = resolved.as_real().or_else(|| resolved.as_integer().map(|n| n as f64)).unwrap_or(0.0);
        }
        Ok(Some(out))
    }
}

/// Normalize a `/Rotate` angle (which may be negative or a multiple larger
/// than 360) to one of 0/90/180/270.
fn normalize_rotation(rotate: i64) -> u16 {
    (((rotate % 360) + 360) % 360) as u16
}

/// Decode a PDF string object (`/Title (...)`) as either UTF-16BE (BOM
/// `\xFE\xFF`) or PDFDocEncoding (here approximated as Latin-1), per spec
/// §7.9.2.2.
fn pdf_text_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> =
            bytes[2..].chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSS...`) into an ISO-8601 string.
/// Unparsable dates are swallowed, not fatal, per spec §7.
fn parse_pdf_date(s: &str) -> Option<String> {
    let s = s.strip_prefix("D:").unwrap_or(s);
    if s.len() < 14 {
        return None;
    }
    let (y, rest) = s.split_at(4);
    let (mo, rest) = rest.split_at(2);
    let (d, rest) = rest.split_at(2);
    let (h, rest) = rest.split_at(2);
    let (mi, rest) = rest.split_at(2);
    let (se, _) = rest.split_at(2);
    let year: i32 = y.parse().ok()?;
    let month: u32 = mo.parse().ok()?;
    let day: u32 = d.parse().ok()?;
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = mi.parse().ok()?;
    let second: u32 = se.parse().ok()?;
    let date = chrono::NaiveDate::from_ymd_opt(year, month, day)?;
    let time = chrono::NaiveTime::from_hms_opt(hour, minute, second)?;
    Some(chrono::NaiveDateTime::new(date, time).format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// Build paragraph elements from assembled lines: consecutive lines fold into
/// one `Paragraph` (reflowed, joined by a single space); a large Δy between
/// lines (the same threshold `extract::lines::join_lines` uses for `"\n\n"`)
/// starts a new paragraph.
fn elements_from_lines(lines: &[Line]) -> Vec<Element> {
    let mut elements = Vec::new();
    let mut current = String::new();
    for (i, line) in lines.iter().enumerate() {
        let rendered = line.render();
        if rendered.trim().is_empty() {
            continue;
        }
        if !current.is_empty() {
            if i > 0 && is_paragraph_break(&lines[i - 1], line) {
                elements.push(Element::Paragraph(std::mem::take(&mut current)));
            } else {
                current.push(' ');
            }
        }
        current.push_str(&rendered);
    }
    if !current.is_empty() {
        elements.push(Element::Paragraph(current));
    }
    elements
}

fn is_paragraph_break(prev: &Line, next: &Line) -> bool {
    let prev_height = prev.fragments.last().map(|f| f.height).unwrap_or(0.0);
    let prev_y = prev.fragments.last().map(|f| f.y).unwrap_or(0.0);
    let next_y = next.fragments.first().map(|f| f.y).unwrap_or(0.0);
    let dy = (next_y - prev_y).abs();
    prev_height > 0.0 && dy > prev_height * 1.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_pdf(content: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend(b"%PDF-1.4\n");
        let mut offsets = Vec::new();

        offsets.push(out.len());
        out.extend(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        offsets.push(out.len());
        out.extend(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>\nendobj\n");

        offsets.push(out.len());
        out.extend(
            b"3 0 obj\n<< /Type /Page /Parent 2 0 R /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>\nendobj\n",
        );

        offsets.push(out.len());
        out.extend(b"4 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>\nendobj\n");

        offsets.push(out.len());
        let stream_header = format!("5 0 obj\n<< /Length {} >>\nstream\n", content.len());
        out.extend(stream_header.as_bytes());
        out.extend(content);
        out.extend(b"\nendstream\nendobj\n");

        let xref_offset = out.len();
        out.extend(b"xref\n0 6\n0000000000 65535 f \n");
        for off in &offsets {
            out.extend(format!("{:010} 00000 n \n", off).as_bytes());
        }
        out.extend(b"trailer\n<< /Size 6 /Root 1 0 R >>\nstartxref\n");
        out.extend(format!("{xref_offset}\n").as_bytes());
        out.extend(b"%%EOF");
        out
    }

    #[test]
    fn opens_and_counts_pages() {
        let pdf = minimal_pdf(b"BT /F1 12 Tf 72 700 Td (Hello World) Tj ET");
        let mut doc = PdfDocument::open_reader(Cursor::new(pdf)).unwrap();
        assert_eq!(doc.page_count(), 1);
        let text = doc.text().unwrap();
        assert!(text.contains("Hello World"), "got: {text:?}");
    }

    #[test]
    fn rejects_missing_header() {
        let err = PdfDocument::open_reader(Cursor::new(b"not a pdf".to_vec())).unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }

    #[test]
    fn rotation_normalizes_negative_angles() {
        assert_eq!(normalize_rotation(-90), 270);
        assert_eq!(normalize_rotation(450), 90);
        assert_eq!(normalize_rotation(0), 0);
    }

    #[test]
    fn pdf_date_parses_basic_form() {
        let parsed = parse_pdf_date("D:20230615120000").unwrap();
        assert_eq!(parsed, "2023-06-15T12:00:00");
    }
}
