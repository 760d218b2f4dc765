//! EPUB reader (C10): ZIP/OPF traversal, per-chapter XHTML delegation, and
//! EPUB-2/EPUB-3 table-of-contents parsing, assembled into the shared
//! document model (spec §4.10).

mod opf;
mod toc;
mod xhtml;
mod xml_util;

pub use opf::{ManifestItem, Package, SpineItem};

use std::io::{Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use crate::config::ExtractOptions;
use crate::error::{Error, Result};
use crate::model::{Document, Element, Metadata, Page, TocEntry};

use xml_util::resolve_relative;

/// One loaded spine document, in reading order.
#[derive(Debug, Clone)]
pub struct Chapter {
    pub id: String,
    pub href: String,
    pub title: String,
    pub elements: Vec<Element>,
}

/// A parsed EPUB (Open Container Format / OPF package) document.
pub struct EpubDocument {
    package: Package,
    chapters: Vec<Chapter>,
    toc: Vec<TocEntry>,
}

const MIMETYPE_SENTINEL: &str = "application/epub+zip";

impl EpubDocument {
    /// Open an EPUB file from a filesystem path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::open_reader(file)
    }

    /// Open an EPUB from any seekable byte source (the ZIP archive format
    /// requires random access for its central directory).
    pub fn open_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::InvalidArchive(format!("not a valid ZIP/EPUB container: {e}")))?;

        validate_mimetype(&mut archive)?;
        if archive.by_name("META-INF/encryption.xml").is_ok() {
            return Err(Error::DRMDetected);
        }

        let container_xml = read_part(&mut archive, "META-INF/container.xml")
            .ok_or_else(|| Error::MissingRequired("META-INF/container.xml".to_string()))?;
        let opf_path = opf::parse_container(&container_xml)?;

        let opf_xml =
            read_part(&mut archive, &opf_path).ok_or_else(|| Error::MissingRequired(opf_path.clone()))?;
        let package = opf::parse_opf(&opf_xml)?;

        let opf_dir = dirname(&opf_path);

        let mut chapters = Vec::new();
        for spine_item in &package.spine {
            let Some(manifest_item) = package.manifest.get(&spine_item.idref) else { continue };
            let path = resolve_relative(&opf_dir, &manifest_item.href);
            let Some(xhtml) = read_part(&mut archive, &path) else { continue };
            let elements = xhtml::transform(&xhtml);
            let title = chapter_title(&elements).unwrap_or_else(|| spine_item.idref.clone());
            chapters.push(Chapter { id: spine_item.idref.clone(), href: manifest_item.href.clone(), title, elements });
        }
        if chapters.is_empty() {
            return Err(Error::EmptySpine);
        }

        let toc = load_toc(&mut archive, &package, &opf_dir, &chapters);

        Ok(EpubDocument { package, chapters, toc })
    }

    /// An EPUB document is rendered as one pseudo-page per chapter
    /// (spec §3), in spine order.
    pub fn page_count(&self) -> usize {
        self.chapters.len()
    }

    pub fn text(&mut self) -> Result<String> {
        self.text_with_options(&ExtractOptions::default())
    }

    pub fn text_with_options(&mut self, opts: &ExtractOptions) -> Result<String> {
        Ok(self.document_with_options(opts)?.plain_text())
    }

    pub fn markdown(&mut self) -> Result<String> {
        self.markdown_with_options(&ExtractOptions::default())
    }

    pub fn markdown_with_options(&mut self, opts: &ExtractOptions) -> Result<String> {
        Ok(self.document_with_options(opts)?.markdown())
    }

    pub fn document(&mut self) -> Result<Document> {
        self.document_with_options(&ExtractOptions::default())
    }

    pub fn document_with_options(&mut self, opts: &ExtractOptions) -> Result<Document> {
        let nav_idx = self.nav_spine_index();
        let mut pages = Vec::with_capacity(self.chapters.len());
        for (i, chapter) in self.chapters.iter().enumerate() {
            if opts.navigation_exclusion == Some(i as u32) || Some(i) == nav_idx {
                continue;
            }
            let mut page = Page::new(i + 1);
            page.elements = chapter.elements.clone();
            pages.push(page);
        }
        Ok(Document { pages, metadata: self.package.metadata.clone() })
    }

    pub fn metadata(&mut self) -> Result<Metadata> {
        Ok(self.package.metadata.clone())
    }

    /// Every chapter in spine order (spec §6 `Chapters()`).
    pub fn chapters(&mut self) -> Result<Vec<Chapter>> {
        Ok(self.chapters.clone())
    }

    /// The resolved table of contents (spec §6 `TableOfContents()`).
    pub fn table_of_contents(&mut self) -> Result<Vec<TocEntry>> {
        Ok(self.toc.clone())
    }

    /// Idempotent; the archive was consumed into `chapters`/`toc` at `open`
    /// time, so there is nothing left to release here.
    pub fn close(self) -> Result<()> {
        Ok(())
    }

    /// The nav document's own chapter, if the nav XHTML also happens to sit
    /// in the spine (common in practice); excluded from body rendering the
    /// way a table of contents page usually is.
    fn nav_spine_index(&self) -> Option<usize> {
        let nav_href = self
            .package
            .manifest
            .values()
            .find(|item| item.properties.iter().any(|p| p == "nav"))
            .map(|item| item.href.clone())?;
        self.chapters.iter().position(|c| c.href == nav_href)
    }
}

fn validate_mimetype<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<()> {
    let Some(content) = read_part(archive, "mimetype") else { return Ok(()) };
    if content.trim() != MIMETYPE_SENTINEL {
        return Err(Error::InvalidMimetype(content.trim().to_string()));
    }
    Ok(())
}

/// Resolve the table of contents per the cascade in spec §4.10: EPUB-3 nav
/// document, else EPUB-2 NCX, else synthesize one entry per loaded chapter.
fn load_toc<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    package: &Package,
    opf_dir: &str,
    chapters: &[Chapter],
) -> Vec<TocEntry> {
    if let Some(nav_item) = package.manifest.values().find(|item| item.properties.iter().any(|p| p == "nav")) {
        let path = resolve_relative(opf_dir, &nav_item.href);
        if let Some(xml) = read_part(archive, &path) {
            let entries = toc::parse_nav_xhtml(&xml);
            if !entries.is_empty() {
                return entries;
            }
        }
    }

    if let Some(ncx_item) = package.manifest.values().find(|item| item.media_type == "application/x-dtbncx+xml") {
        let path = resolve_relative(opf_dir, &ncx_item.href);
        if let Some(xml) = read_part(archive, &path) {
            let entries = toc::parse_ncx(&xml);
            if !entries.is_empty() {
                return entries;
            }
        }
    }

    chapters
        .iter()
        .map(|c| TocEntry { title: c.title.clone(), href: Some(c.href.clone()), children: Vec::new() })
        .collect()
}

fn chapter_title(elements: &[Element]) -> Option<String> {
    elements.iter().find_map(|e| match e {
        Element::Heading { text, .. } => Some(text.clone()),
        _ => None,
    })
}

fn dirname(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Option<String> {
    let mut file = archive.by_name(name).ok()?;
    let mut content = String::new();
    file.read_to_string(&mut content).ok()?;
    Some(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::{SimpleFileOptions, ZipWriter};

    fn build_epub(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let cursor = Cursor::new(&mut buf);
            let mut zip = ZipWriter::new(cursor);
            let opts = SimpleFileOptions::default();
            for (name, content) in parts {
                zip.start_file(*name, opts.clone()).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    const CONTAINER: &str = r#"<container><rootfiles>
        <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
    </rootfiles></container>"#;

    fn opf(extra_manifest: &str, extra_spine: &str) -> String {
        format!(
            r#"<package version="3.0">
                <metadata><dc:title>Sample Book</dc:title><dc:creator>Author</dc:creator></metadata>
                <manifest>
                    <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
                    {extra_manifest}
                </manifest>
                <spine>
                    <itemref idref="c1"/>
                    {extra_spine}
                </spine>
            </package>"#
        )
    }

    #[test]
    fn opens_minimal_epub_and_extracts_chapter_text() {
        let parts = [
            ("mimetype", "application/epub+zip"),
            ("META-INF/container.xml", CONTAINER),
            ("OEBPS/content.opf", &opf("", "")),
            ("OEBPS/c1.xhtml", "<html><body><h1>Chapter One</h1><p>Hello world.</p></body></html>"),
        ];
        let bytes = build_epub(&parts);
        let mut doc = EpubDocument::open_reader(Cursor::new(bytes)).unwrap();
        let text = doc.text().unwrap();
        assert_eq!(text, "Chapter One\nHello world.");
        let metadata = doc.metadata().unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Sample Book"));
    }

    #[test]
    fn wrong_mimetype_is_fatal() {
        let parts = [
            ("mimetype", "text/plain"),
            ("META-INF/container.xml", CONTAINER),
            ("OEBPS/content.opf", &opf("", "")),
            ("OEBPS/c1.xhtml", "<html><body><p>x</p></body></html>"),
        ];
        let bytes = build_epub(&parts);
        let err = EpubDocument::open_reader(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::InvalidMimetype(_)));
    }

    #[test]
    fn encryption_sentinel_is_fatal() {
        let parts = [
            ("META-INF/container.xml", CONTAINER),
            ("META-INF/encryption.xml", "<encryption/>"),
            ("OEBPS/content.opf", &opf("", "")),
            ("OEBPS/c1.xhtml", "<html><body><p>x</p></body></html>"),
        ];
        let bytes = build_epub(&parts);
        let err = EpubDocument::open_reader(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::DRMDetected));
    }

    #[test]
    fn missing_spine_item_is_skipped_not_fatal() {
        let extra_manifest = r#"<item id="c2" href="c2.xhtml" media-type="application/xhtml+xml"/>"#;
        let extra_spine = r#"<itemref idref="c2"/>"#;
        let parts = [
            ("META-INF/container.xml", CONTAINER),
            ("OEBPS/content.opf", &opf(extra_manifest, extra_spine)),
            ("OEBPS/c1.xhtml", "<html><body><p>only chapter that exists</p></body></html>"),
        ];
        let bytes = build_epub(&parts);
        let mut doc = EpubDocument::open_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(doc.chapters().unwrap().len(), 1);
    }

    #[test]
    fn nav_toc_is_preferred_over_synthesized() {
        let extra_manifest =
            r#"<item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>"#;
        let nav_xhtml = r#"<html><body>
            <nav epub:type="toc"><h2>Contents</h2><ol>
                <li><a href="c1.xhtml">One</a></li>
            </ol></nav>
        </body></html>"#;
        let parts = [
            ("META-INF/container.xml", CONTAINER),
            ("OEBPS/content.opf", &opf(extra_manifest, "")),
            ("OEBPS/c1.xhtml", "<html><body><h1>One</h1><p>Text.</p></body></html>"),
            ("OEBPS/nav.xhtml", nav_xhtml),
        ];
        let bytes = build_epub(&parts);
        let mut doc = EpubDocument::open_reader(Cursor::new(bytes)).unwrap();
        let toc = doc.table_of_contents().unwrap();
        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].title, "One");
        assert_eq!(toc[0].href.as_deref(), Some("c1.xhtml"));
    }
}
