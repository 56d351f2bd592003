//! Mind map node domain model.
//!
//! # Responsibility
//! - Define the node, connection and color records owned by the node store.
//! - Provide the depth-tiered style table used by renderers.
//!
//! # Invariants
//! - `NodeId` is stable for the node lifetime and never reused in one store.
//! - `children` order is semantic: it drives outline export and layout.
//! - Size is never stored on a node; it is derived from tree depth.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Text assigned to the root of a fresh document.
pub const DEFAULT_ROOT_TEXT: &str = "Central Topic";
/// Text assigned to nodes created by `add_child` without explicit text.
pub const DEFAULT_CHILD_TEXT: &str = "Child node";
/// Placeholder committed when a label is blank after trim.
pub const PLACEHOLDER_TEXT: &str = "New node";

/// Stable node identifier.
///
/// Generated ids are UUID v4 text. Imported documents keep whatever id
/// strings they carry, so the type is a string newtype rather than `Uuid`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Canvas coordinates in document units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point at `radius` from `self` along `angle` (radians).
    pub fn polar_offset(self, angle: f64, radius: f64) -> Self {
        Self {
            x: self.x + angle.cos() * radius,
            y: self.y + angle.sin() * radius,
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Color tag from the fixed palette plus the `Default` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeColor {
    #[default]
    Default,
    Blue,
    Green,
    Orange,
    Purple,
    Red,
    Teal,
    Yellow,
    Pink,
}

/// Cyclic palette used for automatic child colors.
pub const PALETTE: [NodeColor; 8] = [
    NodeColor::Blue,
    NodeColor::Green,
    NodeColor::Orange,
    NodeColor::Purple,
    NodeColor::Red,
    NodeColor::Teal,
    NodeColor::Yellow,
    NodeColor::Pink,
];

impl NodeColor {
    /// Position inside [`PALETTE`]; `None` for `Default`.
    pub fn palette_index(self) -> Option<usize> {
        PALETTE.iter().position(|color| *color == self)
    }

    /// Automatic color of the child at `sibling_index` (0-based) under a
    /// node with this color: one palette step past the parent, plus one step
    /// per earlier sibling. `Default` (outside the palette) starts at the
    /// first palette entry.
    pub fn for_child(self, sibling_index: usize) -> Self {
        let first = self.palette_index().map_or(0, |index| index + 1);
        PALETTE[(first + sibling_index) % PALETTE.len()]
    }

    /// Wire tag, e.g. `blue`.
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Orange => "orange",
            Self::Purple => "purple",
            Self::Red => "red",
            Self::Teal => "teal",
            Self::Yellow => "yellow",
            Self::Pink => "pink",
        }
    }

    /// Parses a wire tag. Unknown tags return `None`.
    pub fn from_tag(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" => Some(Self::Default),
            "blue" => Some(Self::Blue),
            "green" => Some(Self::Green),
            "orange" => Some(Self::Orange),
            "purple" => Some(Self::Purple),
            "red" => Some(Self::Red),
            "teal" => Some(Self::Teal),
            "yellow" => Some(Self::Yellow),
            "pink" => Some(Self::Pink),
            _ => None,
        }
    }
}

/// One tree entry.
///
/// `parent` and `children` hold ids, never references; traversal always goes
/// back through the owning store.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub position: Point,
    pub text: String,
    pub color: NodeColor,
    pub children: Vec<NodeId>,
    /// `None` only for the root.
    pub parent: Option<NodeId>,
    /// Meaningful only when `children` is non-empty.
    pub collapsed: bool,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        position: Point,
        text: String,
        color: NodeColor,
        parent: Option<NodeId>,
    ) -> Self {
        Self {
            id,
            position,
            text,
            color,
            children: Vec::new(),
            parent,
            collapsed: false,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Parent → child edge. Identity is the id pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub parent: NodeId,
    pub child: NodeId,
}

impl Connection {
    pub fn new(parent: NodeId, child: NodeId) -> Self {
        Self { parent, child }
    }
}

/// Rendered box size and font size for one depth tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeSize {
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
}

const SIZE_TIERS: [NodeSize; 5] = [
    NodeSize {
        width: 180.0,
        height: 60.0,
        font_size: 20.0,
    },
    NodeSize {
        width: 150.0,
        height: 50.0,
        font_size: 16.0,
    },
    NodeSize {
        width: 130.0,
        height: 44.0,
        font_size: 14.0,
    },
    NodeSize {
        width: 120.0,
        height: 40.0,
        font_size: 13.0,
    },
    NodeSize {
        width: 110.0,
        height: 36.0,
        font_size: 12.0,
    },
];

impl NodeSize {
    /// Size tier for a node at `depth` (root = 0). Depth 4 and deeper share
    /// the smallest tier.
    pub fn for_depth(depth: usize) -> Self {
        SIZE_TIERS[depth.min(SIZE_TIERS.len() - 1)]
    }
}

/// Derived presentation attributes for one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeStyle {
    pub depth: usize,
    pub size: NodeSize,
    pub is_leaf: bool,
}

/// Trims a label and substitutes [`PLACEHOLDER_TEXT`] for blank input.
pub fn normalize_text(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        PLACEHOLDER_TEXT.to_string()
    } else {
        trimmed.to_string()
    }
}
