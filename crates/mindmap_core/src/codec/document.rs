//! Structured (JSON) document codec.
//!
//! # Responsibility
//! - Export the full node/connection set plus view state losslessly.
//! - Import a document into a brand-new store, validating every invariant.
//!
//! # Invariants
//! - Import never touches live state; callers swap in the result only on `Ok`.
//! - Ids, parent/child links, colors and collapse flags survive a round trip.
//! - `theme`, `color` and `collapsed` are optional on input; every other
//!   field is required (`parent` must be present, `null` for the root).

use crate::model::node::{normalize_text, Connection, Node, NodeColor, NodeId, Point};
use crate::model::view::{ViewState, DEFAULT_THEME, MAX_SCALE, MIN_SCALE};
use crate::tree::store::NodeStore;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for structured document conversion.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Structured document codec errors.
#[derive(Debug)]
pub enum DocumentError {
    /// Input is not valid JSON, misses required fields, or violates tree
    /// invariants.
    MalformedDocument(String),
    /// Serializing the live state failed.
    Encode(serde_json::Error),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedDocument(message) => write!(f, "malformed document: {message}"),
            Self::Encode(err) => write!(f, "failed to encode document: {err}"),
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedDocument(_) => None,
            Self::Encode(err) => Some(err),
        }
    }
}

/// Store and view state decoded from one structured document.
#[derive(Debug, Clone)]
pub struct ImportedDocument {
    pub store: NodeStore,
    pub view: ViewState,
}

#[derive(Debug, Serialize, Deserialize)]
struct DocumentWire {
    nodes: Vec<NodeWire>,
    connections: Vec<Connection>,
    scale: f64,
    #[serde(rename = "panX")]
    pan_x: f64,
    #[serde(rename = "panY")]
    pan_y: f64,
    #[serde(default = "default_theme")]
    theme: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeWire {
    id: NodeId,
    x: f64,
    y: f64,
    text: String,
    children: Vec<NodeId>,
    #[serde(deserialize_with = "required_nullable")]
    parent: Option<NodeId>,
    #[serde(default = "default_color_tag")]
    color: String,
    #[serde(default)]
    collapsed: bool,
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

fn default_color_tag() -> String {
    NodeColor::Default.as_tag().to_string()
}

// A plain `Option` field would accept a missing key as `None`.
fn required_nullable<'de, D>(deserializer: D) -> Result<Option<NodeId>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NodeId>::deserialize(deserializer)
}

/// Serializes store and view state as pretty-printed JSON.
pub fn export_document(store: &NodeStore, view: &ViewState) -> DocumentResult<String> {
    let wire = DocumentWire {
        nodes: store
            .nodes()
            .map(|node| NodeWire {
                id: node.id.clone(),
                x: node.position.x,
                y: node.position.y,
                text: node.text.clone(),
                children: node.children.clone(),
                parent: node.parent.clone(),
                color: node.color.as_tag().to_string(),
                collapsed: node.collapsed,
            })
            .collect(),
        connections: store.connections().to_vec(),
        scale: view.scale,
        pan_x: view.pan_x,
        pan_y: view.pan_y,
        theme: view.theme.clone(),
    };
    serde_json::to_string_pretty(&wire).map_err(DocumentError::Encode)
}

/// Decodes a structured document into a new, validated store.
///
/// Unknown color tags load as `default`. Scale is clamped into the zoom
/// range.
pub fn import_document(text: &str) -> DocumentResult<ImportedDocument> {
    let wire: DocumentWire = serde_json::from_str(text)
        .map_err(|err| DocumentError::MalformedDocument(err.to_string()))?;

    if !wire.scale.is_finite() || wire.scale <= 0.0 {
        return Err(DocumentError::MalformedDocument(format!(
            "scale must be a positive number, got {}",
            wire.scale
        )));
    }

    let nodes = wire
        .nodes
        .into_iter()
        .map(|node| Node {
            id: node.id,
            position: Point::new(node.x, node.y),
            text: normalize_text(&node.text),
            color: NodeColor::from_tag(&node.color).unwrap_or_default(),
            children: node.children,
            parent: node.parent,
            collapsed: node.collapsed,
        })
        .collect();

    let store = NodeStore::from_parts(nodes, wire.connections, None)
        .map_err(|err| DocumentError::MalformedDocument(err.to_string()))?;

    let view = ViewState {
        scale: wire.scale.clamp(MIN_SCALE, MAX_SCALE),
        pan_x: wire.pan_x,
        pan_y: wire.pan_y,
        theme: wire.theme,
    };

    Ok(ImportedDocument { store, view })
}
