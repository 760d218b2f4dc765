//! DOCX reader (C9): ZIP traversal, per-part XML deserialization, style
//! cascade, heading detection, numbering resolution, list grouping, and
//! table parsing, assembled into the shared document model (spec §4.9).

mod document_xml;
mod headers_footers;
mod numbering;
mod style;
mod table;
mod xml_util;

pub use numbering::{render_ordinal, ListType};
pub use style::ResolvedStyle;
pub use table::ParsedTable;

use std::collections::{HashMap, HashSet};
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::config::ExtractOptions;
use crate::error::{Error, Result};
use crate::model::{Document, Element, ListItem, Metadata, Page};

use document_xml::{parse_body, BodyItem};
use numbering::NumberingResolver;
use style::{detect_heading_level, StyleSheet};

/// A parsed list, independent of the element tree, for the `Lists()`
/// external interface (spec §6).
#[derive(Debug, Clone)]
pub struct ParsedList {
    pub ordered: bool,
    pub items: Vec<ListItem>,
}

/// A parsed DOCX (Office Open XML WordprocessingML) document.
pub struct DocxDocument {
    body: Vec<BodyItem>,
    styles: StyleSheet,
    numbering: NumberingResolver,
    metadata: Metadata,
    header_texts: Vec<String>,
    footer_texts: Vec<String>,
}

impl DocxDocument {
    /// Open a DOCX file from a filesystem path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::open_reader(file)
    }

    /// Open a DOCX from any seekable byte source (the ZIP archive format
    /// requires random access for its central directory).
    pub fn open_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::InvalidArchive(format!("not a valid ZIP/DOCX container: {e}")))?;

        let document_xml = read_part(&mut archive, "word/document.xml")
            .ok_or_else(|| Error::MissingRequired("word/document.xml".to_string()))?;
        let body = parse_body(&document_xml);

        let styles =
            read_part(&mut archive, "word/styles.xml").map(|xml| StyleSheet::parse(&xml)).unwrap_or_default();
        let numbering = read_part(&mut archive, "word/numbering.xml")
            .map(|xml| NumberingResolver::parse(&xml))
            .unwrap_or_default();
        let metadata = read_part(&mut archive, "docProps/core.xml")
            .map(|xml| parse_core_properties(&xml))
            .unwrap_or_default();

        let mut header_texts = Vec::new();
        let mut footer_texts = Vec::new();
        for name in archive_entry_names(&mut archive) {
            if is_header_part(&name) {
                if let Some(xml) = read_part(&mut archive, &name) {
                    header_texts.extend(headers_footers::collect_texts(&xml));
                }
            } else if is_footer_part(&name) {
                if let Some(xml) = read_part(&mut archive, &name) {
                    footer_texts.extend(headers_footers::collect_texts(&xml));
                }
            }
        }

        Ok(DocxDocument { body, styles, numbering, metadata, header_texts, footer_texts })
    }

    /// A DOCX document is rendered as a single pseudo-page (spec §3).
    pub fn page_count(&self) -> usize {
        1
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
        let exclude = self.exclusion_set(opts);
        let (elements, _tables, _lists) = build_elements(&self.body, &self.styles, &self.numbering, &exclude);
        let mut page = Page::new(1);
        page.elements = elements;
        Ok(Document { pages: vec![page], metadata: self.metadata.clone() })
    }

    pub fn metadata(&mut self) -> Result<Metadata> {
        Ok(self.metadata.clone())
    }

    /// Every table in body order (spec §6 `Tables()`).
    pub fn tables(&mut self) -> Result<Vec<ParsedTable>> {
        let exclude = HashSet::new();
        let (_elements, tables, _lists) = build_elements(&self.body, &self.styles, &self.numbering, &exclude);
        Ok(tables)
    }

    /// Every list in body order (spec §6 `Lists()`).
    pub fn lists(&mut self) -> Result<Vec<ParsedList>> {
        let exclude = HashSet::new();
        let (_elements, _tables, lists) = build_elements(&self.body, &self.styles, &self.numbering, &exclude);
        Ok(lists)
    }

    /// Idempotent; the archive was consumed into `body`/`styles`/etc. at
    /// `open` time, so there is nothing left to release here.
    pub fn close(self) -> Result<()> {
        Ok(())
    }

    fn exclusion_set(&self, opts: &ExtractOptions) -> HashSet<String> {
        let mut set = HashSet::new();
        if opts.exclude_headers {
            set.extend(self.header_texts.iter().cloned());
        }
        if opts.exclude_footers {
            set.extend(self.footer_texts.iter().cloned());
        }
        set
    }
}

fn is_header_part(name: &str) -> bool {
    name.starts_with("word/header") && name.ends_with(".xml")
}

fn is_footer_part(name: &str) -> bool {
    name.starts_with("word/footer") && name.ends_with(".xml")
}

fn archive_entry_names<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Vec<String> {
    (0..archive.len()).filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string())).collect()
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Option<String> {
    let mut file = archive.by_name(name).ok()?;
    let mut content = String::new();
    file.read_to_string(&mut content).ok()?;
    Some(content)
}

/// Group raw body items into the document model's element sequence, per
/// spec §4.9: consecutive same-`numId` list items collapse into one `List`;
/// tables are inserted inline; headings are detected via the resolved style
/// cascade (supplemented by direct run formatting); everything else is a
/// plain paragraph.
fn build_elements(
    body: &[BodyItem],
    styles: &StyleSheet,
    numbering: &NumberingResolver,
    exclude: &HashSet<String>,
) -> (Vec<Element>, Vec<ParsedTable>, Vec<ParsedList>) {
    let mut elements = Vec::new();
    let mut tables_out = Vec::new();
    let mut lists_out = Vec::new();

    let mut current_list: Option<(String, bool, Vec<ListItem>)> = None;
    let mut level_counters: HashMap<(String, u32), i64> = HashMap::new();

    let mut flush_list =
        |current_list: &mut Option<(String, bool, Vec<ListItem>)>, elements: &mut Vec<Element>, lists_out: &mut Vec<ParsedList>| {
            if let Some((_, ordered, items)) = current_list.take() {
                if !items.is_empty() {
                    lists_out.push(ParsedList { ordered, items: items.clone() });
                    elements.push(Element::List { ordered, items });
                }
            }
        };

    for item in body {
        match item {
            BodyItem::Table(t) => {
                flush_list(&mut current_list, &mut elements, &mut lists_out);
                let cols = Element::table_columns(&t.rows);
                elements.push(Element::Table { rows: t.rows.clone(), has_grid: t.has_borders, confidence: if cols > 0 { 1.0 } else { 0.0 } });
                tables_out.push(t.clone());
            },
            BodyItem::Paragraph(p) => {
                let trimmed = p.text.trim().to_string();
                if !trimmed.is_empty() && exclude.contains(&trimmed) {
                    continue;
                }

                let is_list_item = p.num_id.as_deref().map(|id| !id.is_empty() && id != "0").unwrap_or(false);
                if is_list_item {
                    let num_id = p.num_id.clone().unwrap();
                    let resolved = numbering.resolve_level(&num_id, p.ilvl);
                    let ordered = matches!(resolved.list_type, numbering::ListType::Ordered);

                    let same_group = current_list.as_ref().map(|(id, _, _)| id == &num_id).unwrap_or(false);
                    if !same_group {
                        flush_list(&mut current_list, &mut elements, &mut lists_out);
                        current_list = Some((num_id.clone(), ordered, Vec::new()));
                    }

                    let key = (num_id.clone(), p.ilvl);
                    let ordinal = *level_counters
                        .entry(key)
                        .and_modify(|v| *v += 1)
                        .or_insert(resolved.start_at);

                    let bullet = if ordered { render_ordinal(ordinal, &resolved.num_fmt) } else { resolved.bullet.clone() };

                    if let Some((_, _, items)) = current_list.as_mut() {
                        items.push(ListItem { text: p.text.clone(), level: p.ilvl as usize, bullet });
                    }
                } else {
                    flush_list(&mut current_list, &mut elements, &mut lists_out);
                    if trimmed.is_empty() {
                        continue;
                    }
                    let style_id = p.style_id.clone().unwrap_or_else(|| "Normal".to_string());
                    let mut resolved_style = styles.resolve(&style_id);
                    if p.any_run_bold {
                        resolved_style.bold = true;
                    }
                    if let Some(sz) = p.max_run_size {
                        resolved_style.font_size = resolved_style.font_size.max(sz);
                    }
                    match detect_heading_level(&style_id, &resolved_style) {
                        Some(level) => elements.push(Element::Heading { level, text: p.text.clone() }),
                        None => elements.push(Element::Paragraph(p.text.clone())),
                    }
                }
            },
        }
    }
    flush_list(&mut current_list, &mut elements, &mut lists_out);

    (elements, tables_out, lists_out)
}

/// Parse Dublin Core metadata from `docProps/core.xml`.
fn parse_core_properties(xml: &str) -> Metadata {
    let mut metadata = Metadata::default();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut current: Option<&'static str> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                current = match e.local_name().as_ref() {
                    b"title" => Some("title"),
                    b"subject" => Some("subject"),
                    b"creator" => Some("creator"),
                    b"description" => Some("description"),
                    b"language" => Some("language"),
                    b"keywords" => Some("keywords"),
                    b"created" => Some("created"),
                    b"modified" => Some("modified"),
                    b"identifier" => Some("identifier"),
                    _ => None,
                };
            },
            Ok(Event::Text(e)) => {
                if let Some(field) = current {
                    let text = e.unescape().unwrap_or_default().to_string();
                    match field {
                        "title" => metadata.title = Some(text),
                        "subject" => metadata.subject = Some(text),
                        "creator" => metadata.authors.push(text),
                        "description" => metadata.description = Some(text),
                        "language" => metadata.language = Some(text),
                        "keywords" => {
                            metadata.keywords = text
                                .split([',', ';'])
                                .map(|s| s.trim().to_string())
                                .filter(|s| !s.is_empty())
                                .collect();
                        },
                        "created" => metadata.created = Some(text),
                        "modified" => metadata.modified = Some(text),
                        "identifier" => metadata.identifier = Some(text),
                        _ => {},
                    }
                }
            },
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {},
        }
        buf.clear();
    }
    metadata
}
