//! Canonical node/connection arena.
//!
//! # Responsibility
//! - Own every `Node` and `Connection` of one document.
//! - Provide the only create/destroy paths (`create_root`, `add_child`,
//!   `delete_subtree`) and direct field mutations.
//!
//! # Invariants
//! - Exactly one root; every other node's parent exists and lists it once.
//! - The parent/child graph is a tree reachable from the root.
//! - The store is never emptied by a mutation; deleting the sole node or the
//!   root is a silent no-op.
//! - Every connection matches one parent/child link and vice versa.
//! - `collapsed` is cleared whenever a node loses its last child.

use crate::model::node::{
    normalize_text, Connection, Node, NodeColor, NodeId, NodeSize, NodeStyle, Point,
};
use log::debug;
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::f64::consts::FRAC_PI_4;
use std::fmt::{Display, Formatter};

/// Distance between a parent and an interactively added child.
pub const CHILD_RADIUS: f64 = 200.0;
/// Angular step between consecutive interactively added children.
pub const CHILD_ANGLE_STEP: f64 = FRAC_PI_4;
/// Where `create_root` places a fresh root.
pub const DEFAULT_ROOT_POSITION: Point = Point::new(400.0, 300.0);

/// Result type used by node store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from node store operations.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Operation referenced an id absent from the store.
    NotFound(NodeId),
    /// Coordinates are NaN or infinite.
    InvalidPosition { x: f64, y: f64 },
    /// Operation or input data would break a tree invariant.
    InvariantViolation(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "node not found: {id}"),
            Self::InvalidPosition { x, y } => write!(f, "invalid node position ({x}, {y})"),
            Self::InvariantViolation(message) => write!(f, "tree invariant violated: {message}"),
        }
    }
}

impl Error for StoreError {}

fn violation(message: impl Into<String>) -> StoreError {
    StoreError::InvariantViolation(message.into())
}

/// Id-keyed arena holding one mind map tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeStore {
    nodes: BTreeMap<NodeId, Node>,
    connections: Vec<Connection>,
    root: Option<NodeId>,
    selected: Option<NodeId>,
}

impl NodeStore {
    /// Creates an empty store. Only `create_root` is valid on it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding a single root with `text`.
    pub fn with_root(text: &str) -> Self {
        let mut store = Self::new();
        store.insert_root(text, DEFAULT_ROOT_POSITION);
        store
    }

    /// Rebuilds a store from owned parts and validates every tree invariant.
    ///
    /// `collapsed` flags on leaves are cleared and a selection pointing at a
    /// missing id is dropped before validation.
    pub fn from_parts(
        nodes: Vec<Node>,
        connections: Vec<Connection>,
        selected: Option<NodeId>,
    ) -> StoreResult<Self> {
        let mut map = BTreeMap::new();
        for mut node in nodes {
            if node.children.is_empty() {
                node.collapsed = false;
            }
            let id = node.id.clone();
            if map.insert(id.clone(), node).is_some() {
                return Err(violation(format!("duplicate node id `{id}`")));
            }
        }

        let mut store = Self {
            nodes: map,
            connections,
            root: None,
            selected: None,
        };
        store.root = store
            .nodes
            .values()
            .find(|node| node.is_root())
            .map(|node| node.id.clone());
        store.selected = selected.filter(|id| store.nodes.contains_key(id));
        store.check_invariants()?;
        Ok(store)
    }

    /// Replaces all collections without validation. Used by history restore,
    /// whose snapshots were captured from a valid store.
    pub(crate) fn restore_parts(
        &mut self,
        nodes: BTreeMap<NodeId, Node>,
        connections: Vec<Connection>,
        selected: Option<NodeId>,
    ) {
        self.root = nodes
            .values()
            .find(|node| node.is_root())
            .map(|node| node.id.clone());
        self.selected = selected.filter(|id| nodes.contains_key(id));
        self.nodes = nodes;
        self.connections = connections;
    }

    /// Establishes the single root. Only valid on an empty store.
    pub fn create_root(&mut self, text: &str) -> StoreResult<Node> {
        self.create_root_at(text, DEFAULT_ROOT_POSITION)
    }

    /// Same as [`NodeStore::create_root`] with explicit coordinates.
    pub fn create_root_at(&mut self, text: &str, position: Point) -> StoreResult<Node> {
        if !self.nodes.is_empty() {
            return Err(violation("root can only be created in an empty store"));
        }
        ensure_finite(position)?;
        Ok(self.insert_root(text, position))
    }

    fn insert_root(&mut self, text: &str, position: Point) -> Node {
        let node = Node::new(
            NodeId::generate(),
            position,
            normalize_text(text),
            NodeColor::Default,
            None,
        );
        self.root = Some(node.id.clone());
        self.nodes.insert(node.id.clone(), node.clone());
        node
    }

    /// Appends a child under `parent_id` at the default fan-out position.
    ///
    /// The n-th child (0-based) sits at angle `n * π/4`, `CHILD_RADIUS` away
    /// from its parent. Without `color` the child takes
    /// [`NodeColor::for_child`] of the parent's color.
    pub fn add_child(
        &mut self,
        parent_id: &NodeId,
        text: &str,
        color: Option<NodeColor>,
    ) -> StoreResult<Node> {
        let parent = self.require(parent_id)?;
        let angle = parent.children.len() as f64 * CHILD_ANGLE_STEP;
        let position = parent.position.polar_offset(angle, CHILD_RADIUS);
        self.add_child_at(parent_id, text, color, position)
    }

    /// Appends a child under `parent_id` at explicit coordinates.
    pub fn add_child_at(
        &mut self,
        parent_id: &NodeId,
        text: &str,
        color: Option<NodeColor>,
        position: Point,
    ) -> StoreResult<Node> {
        ensure_finite(position)?;
        let parent = self.require(parent_id)?;
        let color = color.unwrap_or_else(|| parent.color.for_child(parent.children.len()));

        let node = Node::new(
            NodeId::generate(),
            position,
            normalize_text(text),
            color,
            Some(parent_id.clone()),
        );
        self.nodes.insert(node.id.clone(), node.clone());
        self.require_mut(parent_id)?.children.push(node.id.clone());
        self.connections
            .push(Connection::new(parent_id.clone(), node.id.clone()));
        Ok(node)
    }

    /// Deletes `node_id` with all of its descendants and their connections.
    ///
    /// Returns the number of removed nodes. Deleting the sole remaining node,
    /// or the root, would leave the store empty and is a silent no-op that
    /// returns `0`.
    pub fn delete_subtree(&mut self, node_id: &NodeId) -> StoreResult<usize> {
        let node = self.require(node_id)?;
        if self.nodes.len() == 1 || node.is_root() {
            debug!("event=node_delete module=store status=noop reason=would_empty_store");
            return Ok(0);
        }
        let parent_id = node.parent.clone();

        // Post-order: descendants are removed before their ancestors.
        let mut doomed = self.subtree_ids(node_id)?;
        doomed.reverse();
        let doomed_set: HashSet<&NodeId> = doomed.iter().collect();

        self.connections.retain(|connection| {
            !doomed_set.contains(&connection.parent) && !doomed_set.contains(&connection.child)
        });
        if self
            .selected
            .as_ref()
            .is_some_and(|selected| doomed_set.contains(selected))
        {
            self.selected = None;
        }
        for id in &doomed {
            self.nodes.remove(id);
        }

        if let Some(parent_id) = parent_id {
            let parent = self.require_mut(&parent_id)?;
            parent.children.retain(|child| child != node_id);
            if parent.children.is_empty() {
                parent.collapsed = false;
            }
        }

        Ok(doomed.len())
    }

    /// Sets a node label; blank input becomes the placeholder.
    ///
    /// Returns whether the stored text changed.
    pub fn set_text(&mut self, node_id: &NodeId, text: &str) -> StoreResult<bool> {
        let normalized = normalize_text(text);
        let node = self.require_mut(node_id)?;
        if node.text == normalized {
            return Ok(false);
        }
        node.text = normalized;
        Ok(true)
    }

    pub fn set_color(&mut self, node_id: &NodeId, color: NodeColor) -> StoreResult<bool> {
        let node = self.require_mut(node_id)?;
        if node.color == color {
            return Ok(false);
        }
        node.color = color;
        Ok(true)
    }

    pub fn set_position(&mut self, node_id: &NodeId, x: f64, y: f64) -> StoreResult<bool> {
        let position = Point::new(x, y);
        ensure_finite(position)?;
        let node = self.require_mut(node_id)?;
        if node.position == position {
            return Ok(false);
        }
        node.position = position;
        Ok(true)
    }

    /// Collapse flag writer for the visibility engine. Leaves stay expanded.
    pub(crate) fn set_collapsed(&mut self, node_id: &NodeId, collapsed: bool) -> StoreResult<bool> {
        let node = self.require_mut(node_id)?;
        if node.children.is_empty() || node.collapsed == collapsed {
            return Ok(false);
        }
        node.collapsed = collapsed;
        Ok(true)
    }

    /// Distance from the root (root = 0), walking parent links.
    pub fn depth_of(&self, node_id: &NodeId) -> StoreResult<usize> {
        let mut depth = 0;
        let mut cursor = self.require(node_id)?;
        while let Some(parent_id) = cursor.parent.as_ref() {
            depth += 1;
            if depth > self.nodes.len() {
                return Err(violation(format!("parent cycle above `{node_id}`")));
            }
            cursor = self.require(parent_id)?;
        }
        Ok(depth)
    }

    pub fn is_leaf(&self, node_id: &NodeId) -> StoreResult<bool> {
        Ok(self.require(node_id)?.is_leaf())
    }

    pub fn size_of(&self, node_id: &NodeId) -> StoreResult<NodeSize> {
        Ok(NodeSize::for_depth(self.depth_of(node_id)?))
    }

    /// Derived size tier and leaf flag for one node.
    pub fn style_of(&self, node_id: &NodeId) -> StoreResult<NodeStyle> {
        let depth = self.depth_of(node_id)?;
        Ok(NodeStyle {
            depth,
            size: NodeSize::for_depth(depth),
            is_leaf: self.is_leaf(node_id)?,
        })
    }

    /// `node_id` followed by all of its descendants in pre-order.
    pub fn subtree_ids(&self, node_id: &NodeId) -> StoreResult<Vec<NodeId>> {
        let mut ordered = Vec::new();
        let mut stack = vec![node_id.clone()];
        while let Some(current) = stack.pop() {
            let node = self.require(&current)?;
            for child in node.children.iter().rev() {
                stack.push(child.clone());
            }
            ordered.push(current);
            if ordered.len() > self.nodes.len() {
                return Err(violation(format!("child cycle below `{node_id}`")));
            }
        }
        Ok(ordered)
    }

    pub fn get(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes ordered by id.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Connections in creation order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn root_id(&self) -> Option<&NodeId> {
        self.root.as_ref()
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref().and_then(|id| self.nodes.get(id))
    }

    pub fn children_of(&self, node_id: &NodeId) -> StoreResult<&[NodeId]> {
        Ok(self.require(node_id)?.children.as_slice())
    }

    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    pub fn select(&mut self, node_id: &NodeId) -> StoreResult<()> {
        self.require(node_id)?;
        self.selected = Some(node_id.clone());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub(crate) fn raw_nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    /// Verifies every tree invariant, reporting the first violation found.
    pub fn check_invariants(&self) -> StoreResult<()> {
        if self.nodes.is_empty() {
            return Err(violation("store has no nodes"));
        }

        let roots: Vec<&NodeId> = self
            .nodes
            .values()
            .filter(|node| node.is_root())
            .map(|node| &node.id)
            .collect();
        let root_id = match roots.as_slice() {
            [root] => *root,
            [] => return Err(violation("store has no root")),
            _ => return Err(violation(format!("store has {} roots", roots.len()))),
        };
        if self.root.as_ref() != Some(root_id) {
            return Err(violation("cached root does not match parentless node"));
        }

        for node in self.nodes.values() {
            if let Some(parent_id) = node.parent.as_ref() {
                let parent = self.nodes.get(parent_id).ok_or_else(|| {
                    violation(format!("node `{}` has missing parent `{parent_id}`", node.id))
                })?;
                let listed = parent.children.iter().filter(|id| **id == node.id).count();
                if listed != 1 {
                    return Err(violation(format!(
                        "node `{}` listed {listed} times by parent `{parent_id}`",
                        node.id
                    )));
                }
            }
            for child_id in &node.children {
                let child = self.nodes.get(child_id).ok_or_else(|| {
                    violation(format!("node `{}` lists missing child `{child_id}`", node.id))
                })?;
                if child.parent.as_ref() != Some(&node.id) {
                    return Err(violation(format!(
                        "child `{child_id}` does not point back to `{}`",
                        node.id
                    )));
                }
            }
            if node.collapsed && node.children.is_empty() {
                return Err(violation(format!("leaf `{}` is collapsed", node.id)));
            }
        }

        let mut reached = HashSet::new();
        let mut stack = vec![root_id];
        while let Some(current) = stack.pop() {
            if !reached.insert(current) {
                return Err(violation(format!("node `{current}` reached twice")));
            }
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter());
            }
        }
        if reached.len() != self.nodes.len() {
            return Err(violation(format!(
                "{} node(s) unreachable from root",
                self.nodes.len() - reached.len()
            )));
        }

        let mut seen = HashSet::new();
        for connection in &self.connections {
            let linked = self
                .nodes
                .get(&connection.child)
                .is_some_and(|child| child.parent.as_ref() == Some(&connection.parent));
            if !linked || !self.nodes.contains_key(&connection.parent) {
                return Err(violation(format!(
                    "connection `{}` -> `{}` does not match a tree link",
                    connection.parent, connection.child
                )));
            }
            if !seen.insert(connection) {
                return Err(violation(format!(
                    "duplicate connection `{}` -> `{}`",
                    connection.parent, connection.child
                )));
            }
        }
        if self.connections.len() != self.nodes.len() - 1 {
            return Err(violation(format!(
                "{} connection(s) for {} tree link(s)",
                self.connections.len(),
                self.nodes.len() - 1
            )));
        }

        if let Some(selected) = self.selected.as_ref() {
            if !self.nodes.contains_key(selected) {
                return Err(violation(format!("selection `{selected}` does not exist")));
            }
        }

        Ok(())
    }

    fn require(&self, node_id: &NodeId) -> StoreResult<&Node> {
        self.nodes
            .get(node_id)
            .ok_or_else(|| StoreError::NotFound(node_id.clone()))
    }

    fn require_mut(&mut self, node_id: &NodeId) -> StoreResult<&mut Node> {
        self.nodes
            .get_mut(node_id)
            .ok_or_else(|| StoreError::NotFound(node_id.clone()))
    }
}

fn ensure_finite(position: Point) -> StoreResult<()> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(StoreError::InvalidPosition {
            x: position.x,
            y: position.y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeStore, StoreError, CHILD_RADIUS};
    use crate::model::node::{NodeColor, NodeId};

    #[test]
    fn first_child_is_placed_to_the_right_of_parent() {
        let mut store = NodeStore::with_root("Center");
        let root = store.root().unwrap().clone();
        let child = store.add_child(&root.id, "a", None).unwrap();
        assert!((child.position.x - (root.position.x + CHILD_RADIUS)).abs() < 1e-9);
        assert!((child.position.y - root.position.y).abs() < 1e-9);
    }

    #[test]
    fn third_child_is_placed_below_parent() {
        let mut store = NodeStore::with_root("Center");
        let root = store.root().unwrap().clone();
        store.add_child(&root.id, "a", None).unwrap();
        store.add_child(&root.id, "b", None).unwrap();
        let third = store.add_child(&root.id, "c", None).unwrap();
        assert!((third.position.x - root.position.x).abs() < 1e-9);
        assert!((third.position.y - (root.position.y + CHILD_RADIUS)).abs() < 1e-9);
    }

    #[test]
    fn non_finite_position_is_rejected() {
        let mut store = NodeStore::with_root("Center");
        let root_id = store.root_id().unwrap().clone();
        let err = store.set_position(&root_id, f64::NAN, 1.0).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPosition { .. }));
    }

    #[test]
    fn losing_last_child_clears_collapsed() {
        let mut store = NodeStore::with_root("Center");
        let root_id = store.root_id().unwrap().clone();
        let child = store
            .add_child(&root_id, "a", Some(NodeColor::Red))
            .unwrap();
        let grandchild = store.add_child(&child.id, "b", None).unwrap();
        store.set_collapsed(&child.id, true).unwrap();

        store.delete_subtree(&grandchild.id).unwrap();

        assert!(!store.get(&child.id).unwrap().collapsed);
        store.check_invariants().unwrap();
    }

    #[test]
    fn depth_walk_detects_missing_node() {
        let store = NodeStore::with_root("Center");
        let err = store.depth_of(&NodeId::from("ghost")).unwrap_err();
        assert_eq!(err, StoreError::NotFound(NodeId::from("ghost")));
    }
}
