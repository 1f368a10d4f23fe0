//! Document hierarchy reconstruction from positioned words.
//!
//! Font size is the only structural signal available from flat word
//! geometry, so the builder runs a single-pass state machine over the word
//! stream: consecutive words with the same rounded size form a run, and a run
//! is flushed into the tree when the size changes. Heading runs become nodes
//! (title, subtitle, chapter); body runs are split into paragraphs and
//! attached to the current chapter.
//!
//! # Tree shape
//!
//! ```text
//! Title ── Subtitle ── Chapter ── Paragraph
//! ```
//!
//! Every title starts with one vacant sentinel subtitle, and every subtitle
//! with one vacant sentinel chapter, so body text always has a chapter to
//! attach to. Nodes live in an arena; a node refers to its owner by
//! [`NodeId`] instead of holding a live handle.

use std::fmt::Write;

use crate::paragraph::split_paragraphs;

/// A single word emitted by a page-layout source.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    /// Font size as reported by the layout source.
    pub size: f32,
    /// Distance from the top of the document, in layout units.
    pub vertical_offset: f32,
}

impl Word {
    pub fn new(text: impl Into<String>, size: f32, vertical_offset: f32) -> Self {
        Self {
            text: text.into(),
            size,
            vertical_offset,
        }
    }

    /// Font size rounded to the nearest integer, ties to even.
    pub fn rounded_size(&self) -> u32 {
        self.size.round_ties_even().max(0.0) as u32
    }

    fn is_blank_separator(&self) -> bool {
        self.text == " "
    }
}

/// Lexical level of a node in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Title,
    Subtitle,
    Chapter,
    Paragraph,
}

impl Level {
    fn label(&self) -> &'static str {
        match self {
            Level::Title => "Title",
            Level::Subtitle => "Title1",
            Level::Chapter => "Chapter",
            Level::Paragraph => "Paragraph",
        }
    }
}

/// Size class of a run of words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Run {
    Title,
    Subtitle,
    Chapter,
    Body,
}

/// Recognition sizes and the body line-break threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyConfig {
    pub title_size: u32,
    pub subtitle_size: u32,
    pub chapter_size: u32,
    /// Vertical gap to the next word above which a body word ends a line.
    pub line_break_gap: f32,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            title_size: 80,
            subtitle_size: 25,
            chapter_size: 20,
            line_break_gap: 20.0,
        }
    }
}

impl HierarchyConfig {
    pub fn classify(&self, size: u32) -> Run {
        if size == self.title_size {
            Run::Title
        } else if size == self.subtitle_size {
            Run::Subtitle
        } else if size == self.chapter_size {
            Run::Chapter
        } else {
            Run::Body
        }
    }
}

/// What the builder does with a word given the previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// First word of the stream: nothing to flush.
    Seed,
    /// Same rounded size as the previous word: keep accumulating.
    Continue,
    /// Size changed: finalize the buffer of the previous run.
    Flush(Run),
}

/// Transition table keyed by the previous (size, run) and the current size.
pub fn transition(previous: Option<(u32, Run)>, current_size: u32) -> Transition {
    match previous {
        None => Transition::Seed,
        Some((size, _)) if size == current_size => Transition::Continue,
        Some((_, run)) => Transition::Flush(run),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub level: Level,
    pub text: String,
    pub index: usize,
    pub owner: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Arena-backed forest of titles.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    nodes: Vec<Node>,
    titles: Vec<NodeId>,
}

impl Hierarchy {
    fn new() -> Self {
        let mut tree = Hierarchy {
            nodes: Vec::new(),
            titles: Vec::new(),
        };
        let sentinel = tree.new_title(String::new(), 0);
        tree.titles.push(sentinel);
        tree
    }

    pub fn titles(&self) -> &[NodeId] {
        &self.titles
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// The node owning `id`, if any. Titles have no owner.
    pub fn owner(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].owner
    }

    /// A node is vacant when it has no text and no non-vacant descendants.
    pub fn is_vacant(&self, id: NodeId) -> bool {
        let node = self.node(id);
        node.text.is_empty() && node.children.iter().all(|c| self.is_vacant(*c))
    }

    /// All chapters in document order, sentinels included.
    pub fn chapters(&self) -> Vec<NodeId> {
        self.titles
            .iter()
            .flat_map(|t| self.children(*t))
            .flat_map(|s| self.children(*s))
            .copied()
            .collect()
    }

    /// Indented dump of the whole forest, one node per line.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for title in &self.titles {
            self.write_outline(&mut out, *title, 0);
        }
        out
    }

    fn write_outline(&self, out: &mut String, id: NodeId, depth: usize) {
        let node = self.node(id);
        let _ = writeln!(
            out,
            "{}{}: {}",
            "  ".repeat(depth),
            node.level.label(),
            node.text
        );
        for child in &node.children {
            self.write_outline(out, *child, depth + 1);
        }
    }

    fn push_node(
        &mut self,
        level: Level,
        text: String,
        index: usize,
        owner: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            level,
            text,
            index,
            owner,
            children: Vec::new(),
        });
        if let Some(owner) = owner {
            self.nodes[owner.0].children.push(id);
        }
        id
    }

    fn new_title(&mut self, text: String, index: usize) -> NodeId {
        let title = self.push_node(Level::Title, text, index, None);
        self.new_subtitle(title, String::new(), 0);
        title
    }

    fn new_subtitle(&mut self, title: NodeId, text: String, index: usize) -> NodeId {
        let subtitle = self.push_node(Level::Subtitle, text, index, Some(title));
        self.push_node(Level::Chapter, String::new(), 0, Some(subtitle));
        subtitle
    }

    fn rename(&mut self, id: NodeId, text: String, index: usize) {
        let node = &mut self.nodes[id.0];
        node.text = text;
        node.index = index;
    }

    /// The only child of `owner` when that child is a vacant sentinel.
    fn vacant_sentinel(&self, owner: Option<NodeId>) -> Option<NodeId> {
        let siblings = match owner {
            Some(owner) => self.children(owner),
            None => self.titles.as_slice(),
        };
        match siblings {
            [only] if self.is_vacant(*only) => Some(*only),
            _ => None,
        }
    }

    fn first_child(&self, id: NodeId) -> NodeId {
        // Titles and subtitles are created with a sentinel child.
        self.children(id)[0]
    }
}

/// Incremental font-size state machine producing a [`Hierarchy`].
pub struct HierarchyBuilder {
    config: HierarchyConfig,
    tree: Hierarchy,
    current_title: NodeId,
    current_subtitle: NodeId,
    current_chapter: NodeId,
    title_text: String,
    subtitle_text: String,
    chapter_text: String,
    body_text: String,
    previous: Option<(u32, Run)>,
    subtitle_index: usize,
    chapter_index: usize,
}

impl HierarchyBuilder {
    pub fn new(config: HierarchyConfig) -> Self {
        let tree = Hierarchy::new();
        let current_title = tree.titles[0];
        let current_subtitle = tree.first_child(current_title);
        let current_chapter = tree.first_child(current_subtitle);
        Self {
            config,
            tree,
            current_title,
            current_subtitle,
            current_chapter,
            title_text: String::new(),
            subtitle_text: String::new(),
            chapter_text: String::new(),
            body_text: String::new(),
            previous: None,
            subtitle_index: 1,
            chapter_index: 1,
        }
    }

    /// Feed one word. `next` is the following word in the stream, used to
    /// detect body line breaks from the vertical gap.
    pub fn push(&mut self, word: &Word, next: Option<&Word>) {
        if word.is_blank_separator() {
            return;
        }

        let size = word.rounded_size();
        let run = self.config.classify(size);

        match transition(self.previous, size) {
            Transition::Seed | Transition::Continue => {}
            Transition::Flush(previous_run) => self.flush(previous_run),
        }

        match run {
            Run::Title => self.title_text.push_str(&word.text),
            Run::Subtitle => self.subtitle_text.push_str(&word.text),
            Run::Chapter => self.chapter_text.push_str(&word.text),
            Run::Body => {
                self.body_text.push_str(&word.text);
                let breaks_line = next.is_some_and(|n| {
                    (n.vertical_offset - word.vertical_offset).abs() > self.config.line_break_gap
                });
                if breaks_line {
                    let kept = self.body_text.trim_end_matches(' ').len();
                    self.body_text.truncate(kept);
                    self.body_text.push('\n');
                }
            }
        }

        self.previous = Some((size, run));
    }

    /// Flush whatever run is still pending and return the finished tree.
    pub fn finish(mut self) -> Hierarchy {
        if let Some((_, run)) = self.previous {
            let pending = match run {
                Run::Title => &self.title_text,
                Run::Subtitle => &self.subtitle_text,
                Run::Chapter => &self.chapter_text,
                Run::Body => &self.body_text,
            };
            if !pending.trim().is_empty() {
                self.flush(run);
            }
        }
        self.tree
    }

    fn flush(&mut self, run: Run) {
        match run {
            Run::Title => {
                let text = std::mem::take(&mut self.title_text).trim().to_string();
                let title = match self.tree.vacant_sentinel(None) {
                    Some(sentinel) => {
                        self.tree.rename(sentinel, text, 0);
                        sentinel
                    }
                    None => {
                        let index = self.tree.titles.len();
                        let title = self.tree.new_title(text, index);
                        self.tree.titles.push(title);
                        title
                    }
                };
                self.current_title = title;
                self.current_subtitle = self.tree.first_child(title);
                self.current_chapter = self.tree.first_child(self.current_subtitle);
            }
            Run::Subtitle => {
                let text = std::mem::take(&mut self.subtitle_text).trim().to_string();
                let index = self.subtitle_index;
                self.subtitle_index += 1;
                let subtitle = match self.tree.vacant_sentinel(Some(self.current_title)) {
                    Some(sentinel) => {
                        self.tree.rename(sentinel, text, index);
                        sentinel
                    }
                    None => self.tree.new_subtitle(self.current_title, text, index),
                };
                self.current_subtitle = subtitle;
                self.current_chapter = self.tree.first_child(subtitle);
            }
            Run::Chapter => {
                let text = std::mem::take(&mut self.chapter_text).trim().to_string();
                let index = self.chapter_index;
                self.chapter_index += 1;
                let chapter = match self.tree.vacant_sentinel(Some(self.current_subtitle)) {
                    Some(sentinel) => {
                        self.tree.rename(sentinel, text, index);
                        sentinel
                    }
                    None => self.tree.push_node(
                        Level::Chapter,
                        text,
                        index,
                        Some(self.current_subtitle),
                    ),
                };
                self.current_chapter = chapter;
            }
            Run::Body => {
                let text = std::mem::take(&mut self.body_text);
                let start = self.tree.children(self.current_chapter).len() + 1;
                for (offset, paragraph) in split_paragraphs(&text).into_iter().enumerate() {
                    self.tree.push_node(
                        Level::Paragraph,
                        paragraph,
                        start + offset,
                        Some(self.current_chapter),
                    );
                }
            }
        }
    }
}

/// Build a hierarchy from a complete word stream.
pub fn build_hierarchy(words: &[Word], config: &HierarchyConfig) -> Hierarchy {
    let mut builder = HierarchyBuilder::new(config.clone());
    for (i, word) in words.iter().enumerate() {
        builder.push(word, words.get(i + 1));
    }
    builder.finish()
}
