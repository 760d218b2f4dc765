//! End-to-end smoke tests against the public `Open`/`Text`/`Markdown`/
//! `Document`/`Metadata` surface (spec §6), one per format, built from
//! in-memory fixtures rather than checked-in binary files.

use std::io::{Cursor, Write};

use tabula::{DocxDocument, EpubDocument, Element, PdfDocument};

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
fn pdf_round_trip_text_and_markdown() {
    let pdf = minimal_pdf(b"BT /F1 18 Tf 72 700 Td (Report Title) Tj ET BT /F1 12 Tf 72 650 Td (Body copy.) Tj ET");
    let mut doc = PdfDocument::open_reader(Cursor::new(pdf)).unwrap();
    assert_eq!(doc.page_count(), 1);
    let text = doc.text().unwrap();
    assert!(text.contains("Report Title"));
    assert!(text.contains("Body copy."));
    let markdown = doc.markdown().unwrap();
    assert!(markdown.contains("Report Title"));
}

fn build_zip(parts: &[(&str, &str)]) -> Vec<u8> {
    use zip::write::{SimpleFileOptions, ZipWriter};
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

#[test]
fn docx_round_trip_headings_lists_and_tables() {
    let document = r#"<w:document><w:body>
        <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Quarterly Report</w:t></w:r></w:p>
        <w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr><w:r><w:t>Revenue up</w:t></w:r></w:p>
        <w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr><w:r><w:t>Costs down</w:t></w:r></w:p>
        <w:tbl>
            <w:tr><w:tc><w:p><w:r><w:t>Q1</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>100</w:t></w:r></w:p></w:tc></w:tr>
        </w:tbl>
    </w:body></w:document>"#;
    let numbering = r#"<w:numbering>
        <w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/></w:lvl></w:abstractNum>
        <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
    </w:numbering>"#;
    let bytes = build_zip(&[("word/document.xml", document), ("word/numbering.xml", numbering)]);
    let mut doc = DocxDocument::open_reader(Cursor::new(bytes)).unwrap();
    let parsed = doc.document().unwrap();
    assert!(matches!(&parsed.pages[0].elements[0], Element::Heading { level: 1, .. }));
    assert!(matches!(&parsed.pages[0].elements[1], Element::List { ordered: true, .. }));
    let tables = doc.tables().unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].rows[0][1].text, "100");
}

#[test]
fn epub_round_trip_chapters_and_toc() {
    let container = r#"<container><rootfiles>
        <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
    </rootfiles></container>"#;
    let opf = r#"<package version="3.0">
        <metadata><dc:title>Novella</dc:title><dc:creator>Author Name</dc:creator></metadata>
        <manifest>
            <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
            <item id="c2" href="c2.xhtml" media-type="application/xhtml+xml"/>
            <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
        </manifest>
        <spine><itemref idref="c1"/><itemref idref="c2"/></spine>
    </package>"#;
    let nav = r#"<html><body><nav epub:type="toc"><ol>
        <li><a href="c1.xhtml">Beginning</a></li>
        <li><a href="c2.xhtml">End</a></li>
    </ol></nav></body></html>"#;
    let bytes = build_zip(&[
        ("mimetype", "application/epub+zip"),
        ("META-INF/container.xml", container),
        ("OEBPS/content.opf", opf),
        ("OEBPS/c1.xhtml", "<html><body><h1>Beginning</h1><p>Once upon a time.</p></body></html>"),
        ("OEBPS/c2.xhtml", "<html><body><h1>End</h1><p>The end.</p></body></html>"),
        ("OEBPS/nav.xhtml", nav),
    ]);
    let mut doc = EpubDocument::open_reader(Cursor::new(bytes)).unwrap();
    assert_eq!(doc.page_count(), 2);
    let chapters = doc.chapters().unwrap();
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].title, "Beginning");
    let toc = doc.table_of_contents().unwrap();
    assert_eq!(toc.len(), 2);
    assert_eq!(toc[1].title, "End");
    let metadata = doc.metadata().unwrap();
    assert_eq!(metadata.title.as_deref(), Some("Novella"));
}
