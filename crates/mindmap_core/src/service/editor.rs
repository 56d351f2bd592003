//! Mind map editing use-case facade.
//!
//! # Responsibility
//! - Accept UI commands and route them to the node store.
//! - Commit history, recompute visibility and notify observers after every
//!   committed mutation.
//! - Own view state (zoom, pan, theme) outside of undo history.
//!
//! # Invariants
//! - All tree invariants hold whenever a command returns.
//! - Failed commands and imports leave store, history and view untouched.
//! - Observers only see states that are already committed, except during a
//!   drag, which is committed once by `finish_drag`.

use crate::codec::document::{self, DocumentError};
use crate::codec::outline::{self, OutlineError};
use crate::history::{HistoryManager, DEFAULT_MAX_HISTORY_SIZE};
use crate::layout::LayoutConfig;
use crate::model::node::{
    Connection, NodeColor, NodeId, NodeSize, NodeStyle, Point, DEFAULT_CHILD_TEXT,
    DEFAULT_ROOT_TEXT,
};
use crate::model::view::{ViewState, DEFAULT_THEME};
use crate::tree::store::{NodeStore, StoreError};
use crate::tree::visibility::{self, VisibilityMap};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for editor commands.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors surfaced to the UI layer.
#[derive(Debug)]
pub enum EditorError {
    /// Command referenced a node id that does not exist.
    NodeNotFound(NodeId),
    /// Coordinates are NaN or infinite.
    InvalidPosition { x: f64, y: f64 },
    /// Command would break a tree invariant.
    InvariantViolation(String),
    /// Structured import input is malformed.
    MalformedDocument(String),
    /// Outline import found no headings or list items.
    EmptyOutline,
    /// Structured export failed.
    Encode(serde_json::Error),
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::InvalidPosition { x, y } => write!(f, "invalid node position ({x}, {y})"),
            Self::InvariantViolation(message) => write!(f, "tree invariant violated: {message}"),
            Self::MalformedDocument(message) => write!(f, "malformed document: {message}"),
            Self::EmptyOutline => write!(f, "outline contains no headings or list items"),
            Self::Encode(err) => write!(f, "failed to encode document: {err}"),
        }
    }
}

impl Error for EditorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for EditorError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NodeNotFound(id),
            StoreError::InvalidPosition { x, y } => Self::InvalidPosition { x, y },
            StoreError::InvariantViolation(message) => Self::InvariantViolation(message),
        }
    }
}

impl From<DocumentError> for EditorError {
    fn from(value: DocumentError) -> Self {
        match value {
            DocumentError::MalformedDocument(message) => Self::MalformedDocument(message),
            DocumentError::Encode(err) => Self::Encode(err),
        }
    }
}

impl From<OutlineError> for EditorError {
    fn from(value: OutlineError) -> Self {
        match value {
            OutlineError::EmptyOutline => Self::EmptyOutline,
            OutlineError::Store(err) => err.into(),
        }
    }
}

/// Editor construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub max_history_size: usize,
    pub layout: LayoutConfig,
    pub default_theme: String,
    /// Label of the root in new and reset documents.
    pub root_text: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history_size: DEFAULT_MAX_HISTORY_SIZE,
            layout: LayoutConfig::default(),
            default_theme: DEFAULT_THEME.to_string(),
            root_text: DEFAULT_ROOT_TEXT.to_string(),
        }
    }
}

/// Render-ready view of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    pub id: NodeId,
    pub text: String,
    pub position: Point,
    pub color: NodeColor,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub collapsed: bool,
    pub style: NodeStyle,
    pub visible: bool,
    pub selected: bool,
}

/// Render-ready view of one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConnection {
    pub connection: Connection,
    pub visible: bool,
}

/// Everything a UI needs to draw the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub nodes: Vec<RenderNode>,
    pub connections: Vec<RenderConnection>,
    pub selected: Option<NodeId>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub view: ViewState,
}

/// Receives render state after committed mutations.
pub trait EditorObserver: Send {
    fn on_render(&mut self, state: &RenderState);
}

/// Command facade over one mind map document.
pub struct MindMapEditor {
    config: EditorConfig,
    store: NodeStore,
    history: HistoryManager,
    view: ViewState,
    visibility: VisibilityMap,
    observers: Vec<Box<dyn EditorObserver>>,
    drag_pending: bool,
}

impl Default for MindMapEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl MindMapEditor {
    /// Creates an editor holding a single selected root.
    pub fn new(config: EditorConfig) -> Self {
        let store = fresh_store(&config.root_text);
        let mut history = HistoryManager::new(config.max_history_size);
        history.commit(&store);
        let visibility = visibility::recompute(&store);
        let view = ViewState::with_theme(config.default_theme.clone());
        Self {
            config,
            store,
            history,
            view,
            visibility,
            observers: Vec::new(),
            drag_pending: false,
        }
    }

    /// Registers an observer. It immediately receives the current state.
    pub fn subscribe(&mut self, mut observer: Box<dyn EditorObserver>) {
        observer.on_render(&self.render_state());
        self.observers.push(observer);
    }

    /// Destructive reset to a single root; clears history and view.
    pub fn reset(&mut self, root_text: &str) {
        self.store = fresh_store(root_text);
        self.history.reset(&self.store);
        self.view = ViewState::with_theme(self.config.default_theme.clone());
        self.drag_pending = false;
        self.refresh();
        info!("event=document_reset module=editor status=ok");
    }

    /// Adds a default-labelled child under `parent_id` and selects it.
    pub fn add_child(&mut self, parent_id: &NodeId) -> EditorResult<NodeId> {
        self.add_child_with(parent_id, DEFAULT_CHILD_TEXT, None)
    }

    /// Adds a child with explicit label and optional color, then selects it.
    pub fn add_child_with(
        &mut self,
        parent_id: &NodeId,
        text: &str,
        color: Option<NodeColor>,
    ) -> EditorResult<NodeId> {
        let node = self.store.add_child(parent_id, text, color)?;
        self.store.select(&node.id)?;
        self.commit("add_child");
        Ok(node.id)
    }

    /// Deletes a subtree. Returns removed node count (`0` for the silent
    /// no-op on the root or the last node).
    pub fn delete_subtree(&mut self, node_id: &NodeId) -> EditorResult<usize> {
        let removed = self.store.delete_subtree(node_id)?;
        if removed > 0 {
            self.commit("delete_subtree");
        }
        Ok(removed)
    }

    pub fn set_text(&mut self, node_id: &NodeId, text: &str) -> EditorResult<bool> {
        let changed = self.store.set_text(node_id, text)?;
        if changed {
            self.commit("set_text");
        }
        Ok(changed)
    }

    pub fn set_color(&mut self, node_id: &NodeId, color: NodeColor) -> EditorResult<bool> {
        let changed = self.store.set_color(node_id, color)?;
        if changed {
            self.commit("set_color");
        }
        Ok(changed)
    }

    pub fn set_position(&mut self, node_id: &NodeId, x: f64, y: f64) -> EditorResult<bool> {
        let changed = self.store.set_position(node_id, x, y)?;
        if changed {
            self.drag_pending = false;
            self.commit("set_position");
        }
        Ok(changed)
    }

    /// Flips collapse on a node with children; `false` for a leaf.
    pub fn toggle_collapse(&mut self, node_id: &NodeId) -> EditorResult<bool> {
        let toggled = visibility::toggle_collapse(&mut self.store, node_id)?;
        if toggled {
            self.commit("toggle_collapse");
        }
        Ok(toggled)
    }

    /// Moves the selection. Not an undoable step on its own; the next
    /// committed command records it.
    pub fn select(&mut self, node_id: &NodeId) -> EditorResult<()> {
        self.store.select(node_id)?;
        self.notify();
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.store.clear_selection();
        self.notify();
    }

    /// Moves a node by a viewport-space delta without committing.
    ///
    /// The delta is divided by the zoom scale. Call [`Self::finish_drag`]
    /// when the gesture ends.
    pub fn drag_node_by(&mut self, node_id: &NodeId, dx: f64, dy: f64) -> EditorResult<()> {
        let node = self
            .store
            .get(node_id)
            .ok_or_else(|| EditorError::NodeNotFound(node_id.clone()))?;
        let (dx, dy) = self.view.to_canvas_delta(dx, dy);
        let target = Point::new(node.position.x + dx, node.position.y + dy);
        if self.store.set_position(node_id, target.x, target.y)? {
            self.drag_pending = true;
            self.notify();
        }
        Ok(())
    }

    /// Commits the position changes of an ongoing drag as one step.
    pub fn finish_drag(&mut self) -> bool {
        if !std::mem::take(&mut self.drag_pending) {
            return false;
        }
        self.commit("drag")
    }

    pub fn undo(&mut self) -> bool {
        self.finish_drag();
        let moved = self.history.undo(&mut self.store);
        if moved {
            self.refresh();
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        self.finish_drag();
        let moved = self.history.redo(&mut self.store);
        if moved {
            self.refresh();
        }
        moved
    }

    /// Structured JSON of the current store and view state.
    pub fn export_document(&self) -> EditorResult<String> {
        let text = document::export_document(&self.store, &self.view)?;
        info!(
            "event=document_export module=editor status=ok nodes={} bytes={}",
            self.store.len(),
            text.len()
        );
        Ok(text)
    }

    /// Replaces store and view state with a structured document.
    ///
    /// All-or-nothing: on error nothing changes. On success the import is
    /// one undoable step.
    pub fn import_document(&mut self, text: &str) -> EditorResult<()> {
        let imported = match document::import_document(text) {
            Ok(imported) => imported,
            Err(err) => {
                warn!("event=document_import module=editor status=error error={err}");
                return Err(err.into());
            }
        };
        self.store = imported.store;
        self.view = imported.view;
        self.drag_pending = false;
        self.commit("import_document");
        info!(
            "event=document_import module=editor status=ok nodes={}",
            self.store.len()
        );
        Ok(())
    }

    /// Outline text of the current tree.
    pub fn export_outline(&self) -> String {
        let text = outline::export_outline(&self.store);
        info!(
            "event=outline_export module=editor status=ok nodes={} bytes={}",
            self.store.len(),
            text.len()
        );
        text
    }

    /// Replaces the tree with one parsed from outline text and laid out
    /// radially. View state is kept.
    ///
    /// On `EmptyOutline` nothing changes; callers that want a blank document
    /// instead call [`Self::reset`].
    pub fn import_outline(&mut self, text: &str) -> EditorResult<()> {
        let mut store = match outline::import_outline(text, &self.config.layout) {
            Ok(store) => store,
            Err(err) => {
                warn!("event=outline_import module=editor status=error error={err}");
                return Err(err.into());
            }
        };
        if let Some(root_id) = store.root_id().cloned() {
            store.select(&root_id)?;
        }
        self.store = store;
        self.drag_pending = false;
        self.commit("import_outline");
        info!(
            "event=outline_import module=editor status=ok nodes={}",
            self.store.len()
        );
        Ok(())
    }

    pub fn zoom(&mut self, factor: f64, anchor: Option<Point>) {
        self.view.zoom(factor, anchor);
        self.notify();
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.view.pan_by(dx, dy);
        self.notify();
    }

    pub fn reset_view(&mut self) {
        self.view.reset();
        self.notify();
    }

    pub fn set_theme(&mut self, theme: &str) {
        let theme = theme.trim();
        self.view.theme = if theme.is_empty() {
            self.config.default_theme.clone()
        } else {
            theme.to_string()
        };
        self.notify();
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn visibility(&self) -> &VisibilityMap {
        &self.visibility
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Builds the full render state (nodes in id order).
    pub fn render_state(&self) -> RenderState {
        let mut depths: HashMap<&NodeId, usize> = HashMap::with_capacity(self.store.len());
        if let Some(root_id) = self.store.root_id() {
            if let Ok(order) = self.store.subtree_ids(root_id) {
                for id in order {
                    let depth = self
                        .store
                        .get(&id)
                        .and_then(|node| node.parent.as_ref())
                        .and_then(|parent| depths.get(parent))
                        .map_or(0, |depth| depth + 1);
                    if let Some(node) = self.store.get(&id) {
                        depths.insert(&node.id, depth);
                    }
                }
            }
        }

        let selected = self.store.selected();
        let nodes = self
            .store
            .nodes()
            .map(|node| {
                let depth = depths.get(&node.id).copied().unwrap_or(0);
                RenderNode {
                    id: node.id.clone(),
                    text: node.text.clone(),
                    position: node.position,
                    color: node.color,
                    parent: node.parent.clone(),
                    children: node.children.clone(),
                    collapsed: node.collapsed,
                    style: NodeStyle {
                        depth,
                        size: NodeSize::for_depth(depth),
                        is_leaf: node.is_leaf(),
                    },
                    visible: self.visibility.node_visible(&node.id),
                    selected: selected == Some(&node.id),
                }
            })
            .collect();

        let connections = self
            .visibility
            .connections
            .iter()
            .map(|(connection, visible)| RenderConnection {
                connection: connection.clone(),
                visible: *visible,
            })
            .collect();

        RenderState {
            nodes,
            connections,
            selected: selected.cloned(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            view: self.view.clone(),
        }
    }

    fn commit(&mut self, command: &'static str) -> bool {
        let committed = self.history.commit(&self.store);
        self.visibility = visibility::recompute(&self.store);
        debug!(
            "event=editor_command module=editor command={command} status={} nodes={}",
            if committed { "ok" } else { "noop" },
            self.store.len()
        );
        if committed {
            self.notify();
        }
        committed
    }

    fn refresh(&mut self) {
        self.visibility = visibility::recompute(&self.store);
        self.notify();
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let state = self.render_state();
        for observer in self.observers.iter_mut() {
            observer.on_render(&state);
        }
    }
}

fn fresh_store(root_text: &str) -> NodeStore {
    let mut store = NodeStore::with_root(root_text);
    if let Some(root_id) = store.root_id().cloned() {
        // Root exists: `with_root` just created it.
        let _ = store.select(&root_id);
    }
    store
}
