// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Storage Format Text Projection
//!
//! Converts Confluence storage markup (XHTML plus `ac:`/`ri:` elements) into
//! plain text for agents: tags are stripped, block-level elements become line
//! breaks, whitespace is collapsed per line and empty lines are dropped.
//! CDATA sections (code macro bodies) are kept verbatim; macro parameters,
//! scripts and styles are dropped. Parsing is done by `quick-xml` in a
//! lenient mode: mismatched or unmatched end tags are tolerated and HTML named
//! entities are resolved.

use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::Event;
use quick_xml::Reader;

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "hr", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "dl", "dt", "dd",
    "table", "thead", "tbody", "tfoot", "tr", "th", "td", "caption", "pre", "blockquote", "section",
    "article", "header", "footer", "ac:layout", "ac:layout-section", "ac:layout-cell",
    "ac:structured-macro", "ac:rich-text-body", "ac:plain-text-body", "ac:task", "ac:task-body",
];

const SKIPPED_TAGS: &[&str] = &["script", "style", "ac:parameter"];

/// Plain-text projection of storage markup.
pub fn storage_to_text(markup: &str) -> String {
    let mut reader = Reader::from_str(markup);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut out = String::with_capacity(markup.len());
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(tag)) => {
                let name = tag_name(tag.name().as_ref());
                if skip_depth > 0 || SKIPPED_TAGS.contains(&name.as_str()) {
                    skip_depth += 1;
                } else if BLOCK_TAGS.contains(&name.as_str()) {
                    out.push('\n');
                }
            }
            Ok(Event::End(tag)) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                } else if BLOCK_TAGS.contains(&tag_name(tag.name().as_ref()).as_str()) {
                    out.push('\n');
                }
            }
            Ok(Event::Empty(tag)) => {
                if skip_depth == 0 && BLOCK_TAGS.contains(&tag_name(tag.name().as_ref()).as_str()) {
                    out.push('\n');
                }
            }
            Ok(Event::Text(text)) if skip_depth == 0 => {
                match text.unescape_with(resolve_html5_entity) {
                    Ok(decoded) => out.push_str(&decoded),
                    Err(_) => out.push_str(&String::from_utf8_lossy(&text)),
                }
            }
            Ok(Event::CData(cdata)) if skip_depth == 0 => {
                out.push_str(&String::from_utf8_lossy(&cdata));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    position = reader.buffer_position(),
                    "Malformed storage markup, keeping text read so far"
                );
                break;
            }
        }
    }

    normalize_lines(&out)
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
