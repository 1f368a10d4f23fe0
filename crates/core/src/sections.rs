//! Flatten a [`Hierarchy`] into section records.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::catalog::DocumentConfig;
use crate::hierarchy::{Hierarchy, NodeId};
use crate::treatise::{Section, SectionContent, SectionMetadata};

/// Read the chapter number out of a heading like `"Chap. 94"` or `"Capitolo 3"`.
pub fn extract_chapter_number(title: &str) -> Option<u32> {
    static RE_CHAPTER: OnceLock<Regex> = OnceLock::new();
    let re_chapter = RE_CHAPTER.get_or_init(|| {
        Regex::new(r"(?i)(?:chapitre|chap|capitolo|cap)\s*\.?\s*(\d+)").unwrap()
    });
    re_chapter
        .captures(title)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// One section per chapter that has a heading and at least one paragraph.
pub fn map_sections(tree: &Hierarchy, document: &DocumentConfig) -> Vec<Section> {
    tree.chapters()
        .into_iter()
        .filter_map(|chapter| map_chapter(tree, chapter, document))
        .collect()
}

fn map_chapter(tree: &Hierarchy, chapter: NodeId, document: &DocumentConfig) -> Option<Section> {
    let node = tree.node(chapter);
    let title = node.text.trim();
    if title.is_empty() {
        return None;
    }

    let paragraphs: Vec<&str> = tree
        .children(chapter)
        .iter()
        .map(|p| tree.node(*p).text.as_str())
        .filter(|text| !text.trim().is_empty())
        .collect();
    if paragraphs.is_empty() {
        log::debug!("Skipping chapter {:?}: no paragraphs", title);
        return None;
    }

    let number = match extract_chapter_number(title) {
        Some(number) => number,
        None => {
            log::debug!(
                "No chapter number in {:?}, using position {}",
                title,
                node.index
            );
            node.index as u32
        }
    };
    log::debug!("Chapter {:?} -> {}", title, number);

    Some(Section {
        id: format!("{}_l{}_c{}", document.master_id, document.book, number),
        title: title.to_string(),
        metadata: SectionMetadata {
            master: document.master_id.clone(),
            work: document.work.clone(),
            book: document.book,
            chapter: number,
            year: document.year,
        },
        content: SectionContent {
            fr: Some(block_text(&paragraphs)),
            ..SectionContent::default()
        },
        annotation: None,
        extra: BTreeMap::new(),
    })
}

/// Join paragraphs one per line, without trailing spaces on any line.
fn block_text(paragraphs: &[&str]) -> String {
    paragraphs
        .iter()
        .flat_map(|paragraph| paragraph.lines())
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}
