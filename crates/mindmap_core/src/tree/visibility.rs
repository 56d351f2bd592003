//! Collapse-derived visibility.
//!
//! # Invariants
//! - A node is visible iff no ancestor is collapsed; its own flag only hides
//!   descendants.
//! - A connection is visible iff its parent is visible and not collapsed
//!   (which implies the child is visible).
//! - `recompute` is a full O(nodes) pass and is valid after any mutation.

use crate::model::node::{Connection, NodeId};
use crate::tree::store::{NodeStore, StoreError, StoreResult};
use std::collections::BTreeMap;

/// Per-node and per-connection visibility for one store state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityMap {
    pub nodes: BTreeMap<NodeId, bool>,
    /// Same order as `NodeStore::connections`.
    pub connections: Vec<(Connection, bool)>,
}

impl VisibilityMap {
    pub fn node_visible(&self, node_id: &NodeId) -> bool {
        self.nodes.get(node_id).copied().unwrap_or(false)
    }

    pub fn visible_node_count(&self) -> usize {
        self.nodes.values().filter(|visible| **visible).count()
    }
}

/// True iff every ancestor of `node_id` is expanded.
pub fn is_visible(store: &NodeStore, node_id: &NodeId) -> StoreResult<bool> {
    let mut cursor = store
        .get(node_id)
        .ok_or_else(|| StoreError::NotFound(node_id.clone()))?;
    let mut steps = 0;
    while let Some(parent_id) = cursor.parent.as_ref() {
        let Some(parent) = store.get(parent_id) else {
            return Ok(false);
        };
        if parent.collapsed {
            return Ok(false);
        }
        steps += 1;
        if steps > store.len() {
            return Ok(false);
        }
        cursor = parent;
    }
    Ok(true)
}

/// True iff both endpoints are visible and the parent is not collapsed.
pub fn connection_visible(store: &NodeStore, connection: &Connection) -> bool {
    let Some(parent) = store.get(&connection.parent) else {
        return false;
    };
    if parent.collapsed {
        return false;
    }
    matches!(is_visible(store, &connection.parent), Ok(true))
        && matches!(is_visible(store, &connection.child), Ok(true))
}

/// Flips the collapse flag of a node with children.
///
/// Returns `false` without changing anything for a leaf. Callers must run
/// [`recompute`] afterwards.
pub fn toggle_collapse(store: &mut NodeStore, node_id: &NodeId) -> StoreResult<bool> {
    let collapsed = match store.get(node_id) {
        Some(node) if node.is_leaf() => return Ok(false),
        Some(node) => node.collapsed,
        None => return Err(StoreError::NotFound(node_id.clone())),
    };
    store.set_collapsed(node_id, !collapsed)
}

/// Computes visibility for every node and connection in one top-down pass.
pub fn recompute(store: &NodeStore) -> VisibilityMap {
    let mut nodes: BTreeMap<NodeId, bool> =
        store.nodes().map(|node| (node.id.clone(), false)).collect();

    if let Some(root_id) = store.root_id() {
        let mut stack = vec![root_id.clone()];
        while let Some(current) = stack.pop() {
            match nodes.get_mut(&current) {
                Some(visible) if !*visible => *visible = true,
                _ => continue,
            }
            if let Some(node) = store.get(&current) {
                if !node.collapsed {
                    stack.extend(node.children.iter().cloned());
                }
            }
        }
    }

    let connections = store
        .connections()
        .iter()
        .map(|connection| {
            let parent_open = store
                .get(&connection.parent)
                .is_some_and(|parent| !parent.collapsed);
            let visible = parent_open
                && nodes.get(&connection.parent).copied().unwrap_or(false)
                && nodes.get(&connection.child).copied().unwrap_or(false);
            (connection.clone(), visible)
        })
        .collect();

    VisibilityMap { nodes, connections }
}
