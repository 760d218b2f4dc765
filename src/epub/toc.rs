//! Table-of-contents parsing (C10): EPUB-3 nav-XHTML preferred, EPUB-2 NCX
//! fallback, and a synthesized-from-chapters last resort (spec §4.10).

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::model::TocEntry;

use super::xml_util::get_attribute_ns;

/// Parse an EPUB-3 nav document, returning the `<ol>` under the `<nav>`
/// whose `epub:type`/`type` attribute contains `"toc"`, transformed
/// recursively into `TocEntry` nodes.
pub fn parse_nav_xhtml(xml: &str) -> Vec<TocEntry> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    // Stack of open <ol> levels; each holds the sibling entries collected so
    // far at that nesting depth. li_stack holds (title, href, children) for
    // each currently open <li>; a nested <ol> attaches its finished entries
    // to the <li> it's nested inside (the top of li_stack when it closes),
    // not to whatever sibling list happens to be open.
    let mut in_toc_nav = false;
    let mut nav_depth = 0i32;
    let mut ol_stack: Vec<Vec<TocEntry>> = Vec::new();
    let mut li_stack: Vec<(Option<String>, Option<String>, Vec<TocEntry>)> = Vec::new();
    let mut in_anchor = false;
    let mut in_span = false;
    let mut cur_href: Option<String> = None;
    let mut cur_title = String::new();
    let mut found_toc = false;
    let mut result: Vec<TocEntry> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                match e.local_name().as_ref() {
                    b"nav" => {
                        nav_depth += 1;
                        let epub_type = get_attribute_ns(&e, "type").unwrap_or_default();
                        if !found_toc && epub_type.contains("toc") {
                            in_toc_nav = true;
                        }
                    },
                    b"ol" if in_toc_nav => {
                        ol_stack.push(Vec::new());
                    },
                    b"li" if in_toc_nav => {
                        li_stack.push((None, None, Vec::new()));
                    },
                    b"a" if in_toc_nav => {
                        in_anchor = true;
                        cur_href = get_attribute_ns(&e, "href");
                        cur_title.clear();
                    },
                    b"span" if in_toc_nav => {
                        in_span = true;
                        cur_title.clear();
                    },
                    _ => {},
                }
            },
            Ok(Event::Text(e)) => {
                if in_toc_nav && (in_anchor || in_span) {
                    cur_title.push_str(&e.unescape().unwrap_or_default());
                }
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"a" if in_toc_nav => {
                    in_anchor = false;
                    if let Some(top) = li_stack.last_mut() {
                        top.0 = Some(cur_title.trim().to_string());
                        top.1 = cur_href.take();
                    }
                },
                b"span" if in_toc_nav => {
                    in_span = false;
                    if let Some(top) = li_stack.last_mut() {
                        if top.0.is_none() {
                            top.0 = Some(cur_title.trim().to_string());
                        }
                    }
                },
                b"li" if in_toc_nav => {
                    if let Some((title, href, children)) = li_stack.pop() {
                        let entry = TocEntry { title: title.unwrap_or_default(), href, children };
                        if let Some(parent_list) = ol_stack.last_mut() {
                            parent_list.push(entry);
                        }
                    }
                },
                b"ol" if in_toc_nav => {
                    // This <ol> closes: its accumulated entries become the
                    // children of the <li> it's nested inside, if any;
                    // otherwise it's the outermost list and is the result.
                    let finished = ol_stack.pop().unwrap_or_default();
                    if let Some(top) = li_stack.last_mut() {
                        top.2 = finished;
                    } else {
                        result = finished;
                    }
                },
                b"nav" => {
                    nav_depth -= 1;
                    if in_toc_nav {
                        found_toc = true;
                        in_toc_nav = false;
                    }
                },
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {},
        }
        buf.clear();
    }
    let _ = nav_depth;

    result
}

/// Parse an EPUB-2 NCX document's `navMap`, transforming `navPoint` into
/// `TocEntry` recursively.
pub fn parse_ncx(xml: &str) -> Vec<TocEntry> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut stack: Vec<Vec<TocEntry>> = vec![Vec::new()];
    let mut title_stack: Vec<String> = Vec::new();
    let mut href_stack: Vec<Option<String>> = Vec::new();
    let mut in_text = false;
    let mut cur_text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"navPoint" => {
                    stack.push(Vec::new());
                    title_stack.push(String::new());
                    href_stack.push(None);
                },
                b"content" => {
                    if let Some(top) = href_stack.last_mut() {
                        *top = get_attribute_ns(&e, "src");
                    }
                },
                b"text" => {
                    in_text = true;
                    cur_text.clear();
                },
                _ => {},
            },
            Ok(Event::Text(e)) => {
                if in_text {
                    cur_text.push_str(&e.unescape().unwrap_or_default());
                }
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"text" => {
                    in_text = false;
                    if let Some(top) = title_stack.last_mut() {
                        if top.is_empty() {
                            *top = cur_text.trim().to_string();
                        }
                    }
                },
                b"navPoint" => {
                    let children = stack.pop().unwrap_or_default();
                    let title = title_stack.pop().unwrap_or_default();
                    let href = href_stack.pop().unwrap_or(None);
                    if let Some(parent) = stack.last_mut() {
                        parent.push(TocEntry { title, href, children });
                    }
                },
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {},
        }
        buf.clear();
    }

    stack.pop().unwrap_or_default()
}
