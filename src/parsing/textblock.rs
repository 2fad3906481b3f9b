//! Flat collection of narrative `TextBlock` elements from an XBRL bundle.
//!
//! EDINET instance documents carry each narrative note as one element whose local name
//! ends in `TextBlock` and whose content is escaped XHTML. The collector walks every
//! instance document in a bundle (linkbases excluded), turns each block into plain text
//! with line breaks where the markup had block-level elements, and keeps the blocks long
//! enough to be real narrative.

use crate::error::Result;
use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Blocks whose cleaned text is this many characters or fewer are discarded.
pub const MIN_TEXT_CHARS: usize = 50;

const LINKBASE_SUFFIXES: [&str; 4] = ["_lab", "_pre", "_cal", "_def"];

static SCRIPT_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>").expect("valid regex")
});
static BLOCK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)<br\s*/?>|</?(?:p|div|tr|li|h[1-6]|table|thead|tbody|ul|ol|dl|dt|dd|blockquote|section)\b[^>]*>",
    )
    .expect("valid regex")
});
static CELL_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</t[dh]\s*>").expect("valid regex"));
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static INLINE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s&&[^\n]]+").expect("valid regex"));

/// One narrative element, keyed by its qualified tag name (`jpcrp_cor:BusinessRisksTextBlock`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub name: String,
    pub text: String,
}

impl TextBlock {
    /// Tag name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }
}

/// Text blocks in document order, at most one per tag name.
#[derive(Debug, Clone, Default)]
pub struct TextBlockCollection {
    blocks: Vec<TextBlock>,
    names: HashSet<String>,
}

impl TextBlockCollection {
    /// Adds a block unless one with the same name is already present.
    pub fn insert(&mut self, block: TextBlock) -> bool {
        if self.names.contains(&block.name) {
            return false;
        }
        self.names.insert(block.name.clone());
        self.blocks.push(block);
        true
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextBlock> {
        self.blocks.iter()
    }

    /// First block whose name is `tag` or ends with `tag` (prefix-insensitive match).
    pub fn find_by_suffix(&self, tag: &str) -> Option<&TextBlock> {
        self.blocks
            .iter()
            .find(|b| b.name == tag || b.local_name() == tag || b.name.ends_with(tag))
    }

    /// First block whose name contains `tag`.
    pub fn find_containing(&self, tag: &str) -> Option<&TextBlock> {
        self.blocks.iter().find(|b| b.name.contains(tag))
    }
}

/// Converts escaped narrative markup to plain text, one paragraph per line.
pub fn html_to_text(raw: &str) -> String {
    let text = SCRIPT_STYLE.replace_all(raw, "");
    let text = BLOCK_TAG.replace_all(&text, "\n");
    let text = CELL_END.replace_all(&text, " ");
    let text = ANY_TAG.replace_all(&text, "");
    let text = decode_html_entities(&text);

    text.lines()
        .map(|line| INLINE_SPACE.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn contains_text_block(local_name: &[u8]) -> bool {
    local_name.windows(9).any(|w| w == b"TextBlock")
}

fn is_block_level(local_name: &[u8]) -> bool {
    matches!(
        local_name.to_ascii_lowercase().as_slice(),
        b"p" | b"br" | b"div" | b"tr" | b"li" | b"h1" | b"h2" | b"h3" | b"h4" | b"h5" | b"h6"
            | b"table"
    )
}

fn append_to_open(open: &mut [(String, String)], text: &str) {
    for (_, buffer) in open.iter_mut() {
        buffer.push_str(text);
    }
}

/// Extracts every `TextBlock` element from one instance document, in document order.
///
/// Blocks are returned regardless of length; filtering happens in the collector.
pub fn parse_text_blocks(content: &str) -> Result<Vec<TextBlock>> {
    let mut reader = Reader::from_str(content);
    let mut open: Vec<(String, String)> = Vec::new();
    let mut blocks = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let local = e.local_name();
                if contains_text_block(local.as_ref()) {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    open.push((name, String::new()));
                } else if !open.is_empty() && is_block_level(local.as_ref()) {
                    append_to_open(&mut open, "\n");
                }
            }
            Event::Empty(e) => {
                if !open.is_empty() && is_block_level(e.local_name().as_ref()) {
                    append_to_open(&mut open, "\n");
                }
            }
            Event::End(e) => {
                let local = e.local_name();
                if contains_text_block(local.as_ref()) {
                    if let Some((name, raw)) = open.pop() {
                        blocks.push(TextBlock {
                            name,
                            text: html_to_text(&raw),
                        });
                    }
                } else if !open.is_empty() && is_block_level(local.as_ref()) {
                    append_to_open(&mut open, "\n");
                }
            }
            Event::Text(t) => {
                if !open.is_empty() {
                    let text = t
                        .unescape()
                        .map(|s| s.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                    append_to_open(&mut open, &text);
                }
            }
            Event::CData(c) => {
                if !open.is_empty() {
                    let text = String::from_utf8_lossy(&c).into_owned();
                    append_to_open(&mut open, &text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(blocks)
}

/// `true` for `*.xml` / `*.xbrl` files that are not label, presentation, calculation
/// or definition linkbases.
pub fn is_instance_document(path: &Path) -> bool {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    if !matches!(extension.as_deref(), Some("xml") | Some("xbrl")) {
        return false;
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    !LINKBASE_SUFFIXES.iter().any(|suffix| {
        stem.ends_with(suffix) || stem.contains(&format!("{}-", suffix))
    })
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Cannot read {}: {}", dir.display(), e);
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, files);
        } else if is_instance_document(&path) {
            files.push(path);
        }
    }
}

/// Instance documents under `bundle_dir`, in sorted path order.
pub fn instance_documents(bundle_dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if bundle_dir.is_dir() {
        walk(bundle_dir, &mut files);
    }
    files.sort();
    files
}

/// Collects the narrative blocks of every instance document in a bundle.
///
/// A document that cannot be read or parsed is skipped with a warning. A missing or
/// empty directory gives an empty collection.
pub fn collect_text_blocks(bundle_dir: &Path) -> TextBlockCollection {
    let mut collection = TextBlockCollection::default();

    let files = instance_documents(bundle_dir);
    if files.is_empty() {
        tracing::warn!("No instance documents found in {}", bundle_dir.display());
        return collection;
    }

    for file in files {
        let content = match std::fs::read_to_string(&file) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Skipping unreadable document {}: {}", file.display(), e);
                continue;
            }
        };

        let blocks = match parse_text_blocks(&content) {
            Ok(blocks) => blocks,
            Err(e) => {
                tracing::warn!("Skipping malformed document {}: {}", file.display(), e);
                continue;
            }
        };

        for block in blocks {
            if block.text.chars().count() > MIN_TEXT_CHARS {
                collection.insert(block);
            }
        }
    }

    tracing::debug!(
        "Collected {} text blocks from {}",
        collection.len(),
        bundle_dir.display()
    );
    collection
}
