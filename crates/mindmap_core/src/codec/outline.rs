//! Outline (Markdown headings and lists) codec.
//!
//! # Responsibility
//! - Export the tree as headings (depth 1..=6) and indented bullets (deeper).
//! - Import heading/list text into a new tree using a level stack.
//!
//! # Invariants
//! - Export is lossy: position, color and collapse state are dropped.
//! - The first recognized line becomes the root and is never popped, so
//!   later lines always find a parent.
//! - Level jumps are kept as written: a line attaches to the nearest open
//!   line with a strictly smaller level, no intermediate nodes are invented.
//! - Lines inside fenced code blocks are ignored. A block closes only on a
//!   bare fence of the same marker at least as long as the opening one.

use crate::layout::{layout_radial, provisional_spiral, LayoutConfig};
use crate::model::node::{NodeColor, NodeId, Point};
use crate::tree::store::{NodeStore, StoreError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Deepest outline level rendered as a heading.
pub const MAX_HEADING_LEVEL: usize = 6;
/// Spaces per list nesting step.
const LIST_INDENT: usize = 2;

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})[ \t]+(\S.*?)\s*$").expect("valid heading regex"));
static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([ \t]*)[-*+][ \t]+(\S.*?)\s*$").expect("valid bullet regex"));
static NUMBERED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([ \t]*)\d+\.[ \t]+(\S.*?)\s*$").expect("valid numbered regex"));
static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*(`{3,}|~{3,})(.*)$").expect("valid fence regex"));

/// Result type for outline conversion.
pub type OutlineResult<T> = Result<T, OutlineError>;

/// Outline codec errors.
#[derive(Debug)]
pub enum OutlineError {
    /// No heading or list line was found.
    EmptyOutline,
    /// Building the tree failed.
    Store(StoreError),
}

impl Display for OutlineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyOutline => write!(f, "outline contains no headings or list items"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OutlineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EmptyOutline => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for OutlineError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// One recognized outline line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineLine {
    /// Structural level: heading marker count, or `7 + indent / 2` for items.
    pub level: usize,
    pub text: String,
}

/// Color assigned to imported nodes by structural level.
pub fn color_for_level(level: usize) -> NodeColor {
    match level {
        1 => NodeColor::Blue,
        2 => NodeColor::Green,
        3 => NodeColor::Orange,
        4 => NodeColor::Purple,
        5 => NodeColor::Red,
        6 => NodeColor::Teal,
        _ => NodeColor::Default,
    }
}

/// Classifies one line; `None` for anything that is not a heading or item.
pub fn classify_line(line: &str) -> Option<OutlineLine> {
    if let Some(captures) = HEADING_RE.captures(line) {
        return Some(OutlineLine {
            level: captures[1].len(),
            text: captures[2].to_string(),
        });
    }

    let captures = BULLET_RE
        .captures(line)
        .or_else(|| NUMBERED_RE.captures(line))?;
    Some(OutlineLine {
        level: MAX_HEADING_LEVEL + 1 + indent_width(&captures[1]) / LIST_INDENT,
        text: captures[2].to_string(),
    })
}

// Fence character, run length and trailing info text of a fence line.
fn fence_marker(line: &str) -> Option<(char, usize, &str)> {
    let captures = FENCE_RE.captures(line)?;
    let run = captures.get(1)?.as_str();
    let info = captures.get(2).map_or("", |m| m.as_str());
    Some((run.chars().next()?, run.len(), info))
}

// A tab counts as one nesting step.
fn indent_width(indent: &str) -> usize {
    indent
        .chars()
        .map(|c| if c == '\t' { LIST_INDENT } else { 1 })
        .sum()
}

/// Renders the tree as outline text.
///
/// The root becomes a leading `#` title. A node at outline depth `d` (root
/// children = 1) becomes a level-`d` heading followed, after its
/// descendants, by a blank line; past depth 6 it becomes a `- ` bullet
/// indented two spaces per level beyond 7.
pub fn export_outline(store: &NodeStore) -> String {
    enum Step<'a> {
        Enter(&'a NodeId, usize),
        Close,
    }

    let Some(root) = store.root() else {
        return String::new();
    };

    let mut out = String::new();
    out.push_str("# ");
    out.push_str(&single_line(&root.text));
    out.push_str("\n\n");

    let mut stack: Vec<Step<'_>> = root
        .children
        .iter()
        .rev()
        .map(|child| Step::Enter(child, 1))
        .collect();

    while let Some(step) = stack.pop() {
        let (node_id, depth) = match step {
            Step::Close => {
                out.push('\n');
                continue;
            }
            Step::Enter(node_id, depth) => (node_id, depth),
        };
        let Some(node) = store.get(node_id) else {
            continue;
        };

        if depth <= MAX_HEADING_LEVEL {
            out.push_str(&"#".repeat(depth));
            out.push(' ');
            stack.push(Step::Close);
        } else {
            out.push_str(&" ".repeat(LIST_INDENT * (depth - MAX_HEADING_LEVEL - 1)));
            out.push_str("- ");
        }
        out.push_str(&single_line(&node.text));
        out.push('\n');

        for child in node.children.iter().rev() {
            stack.push(Step::Enter(child, depth + 1));
        }
    }

    out
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds a tree from outline text with provisional spiral positions.
///
/// The root sits at `center`; every other node is colored by its level.
pub fn parse_outline(text: &str, center: Point) -> OutlineResult<NodeStore> {
    let mut store = NodeStore::new();
    let mut open: Vec<(usize, NodeId)> = Vec::new();
    let mut fence: Option<(char, usize)> = None;
    let mut placed = 0_usize;

    for line in text.lines() {
        let marker = fence_marker(line);
        if let Some((open_char, open_len)) = fence {
            if marker.is_some_and(|(c, len, info)| {
                c == open_char && len >= open_len && info.trim().is_empty()
            }) {
                fence = None;
            }
            continue;
        }
        if let Some((c, len, _)) = marker {
            fence = Some((c, len));
            continue;
        }
        let Some(entry) = classify_line(line) else {
            continue;
        };

        if store.is_empty() {
            let root = store.create_root_at(&entry.text, center)?;
            open.push((entry.level, root.id));
            continue;
        }

        while open.len() > 1 && open.last().is_some_and(|(level, _)| *level >= entry.level) {
            open.pop();
        }
        let Some((_, parent_id)) = open.last() else {
            continue;
        };

        placed += 1;
        let node = store.add_child_at(
            parent_id,
            &entry.text,
            Some(color_for_level(entry.level)),
            provisional_spiral(center, placed),
        )?;
        open.push((entry.level, node.id));
    }

    if store.is_empty() {
        return Err(OutlineError::EmptyOutline);
    }
    Ok(store)
}

/// Parses outline text and replaces provisional positions with the radial
/// layout.
pub fn import_outline(text: &str, layout: &LayoutConfig) -> OutlineResult<NodeStore> {
    let mut store = parse_outline(text, layout.center)?;
    layout_radial(&mut store, layout)?;
    Ok(store)
}
