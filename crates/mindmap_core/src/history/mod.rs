//! Snapshot-based undo/redo.
//!
//! # Responsibility
//! - Capture owned copies of the node store after each committed command.
//! - Move a cursor through captured states and restore them wholesale.
//!
//! # Invariants
//! - Consecutive snapshots are never structurally identical.
//! - At most `max_size` snapshots are retained; the oldest is evicted first.
//! - Undo never restores a zero-node snapshot.
//! - `commit` is suppressed while a restore is in progress.

use crate::model::node::{Connection, Node, NodeId, DEFAULT_ROOT_TEXT};
use crate::tree::store::NodeStore;
use log::{debug, warn};
use std::collections::BTreeMap;

/// Snapshot cap used when the editor config does not override it.
pub const DEFAULT_MAX_HISTORY_SIZE: usize = 50;

/// Independent full copy of node store state.
///
/// Equality is field-by-field over nodes (ordered by id), connections and
/// selection, which is what commit deduplication compares.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    nodes: BTreeMap<NodeId, Node>,
    connections: Vec<Connection>,
    selected: Option<NodeId>,
}

impl Snapshot {
    pub fn capture(store: &NodeStore) -> Self {
        Self {
            nodes: store.raw_nodes().clone(),
            connections: store.connections().to_vec(),
            selected: store.selected().cloned(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }
}

/// Linear undo/redo stack over whole-store snapshots.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    snapshots: Vec<Snapshot>,
    /// Index of the snapshot matching the live store. Meaningless when empty.
    cursor: usize,
    max_size: usize,
    restoring: bool,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY_SIZE)
    }
}

impl HistoryManager {
    /// Creates an empty history. A cap of zero is raised to one.
    pub fn new(max_size: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            cursor: 0,
            max_size: max_size.max(1),
            restoring: false,
        }
    }

    /// Records the current store state.
    ///
    /// Returns `false` when nothing was recorded: the state equals the
    /// snapshot under the cursor, or a restore is in progress. A new entry
    /// drops every snapshot after the cursor.
    pub fn commit(&mut self, store: &NodeStore) -> bool {
        if self.restoring {
            debug!("event=history_commit module=history status=noop reason=restoring");
            return false;
        }

        let snapshot = Snapshot::capture(store);
        if self.current() == Some(&snapshot) {
            debug!("event=history_commit module=history status=noop reason=unchanged");
            return false;
        }

        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
        self.snapshots.push(snapshot);
        if self.snapshots.len() > self.max_size {
            self.snapshots.remove(0);
        }
        self.cursor = self.snapshots.len() - 1;

        debug!(
            "event=history_commit module=history status=ok entries={} cursor={}",
            self.snapshots.len(),
            self.cursor
        );
        true
    }

    /// Steps back one snapshot and restores it into `store`.
    ///
    /// Returns `false` at the oldest entry, or when the previous snapshot has
    /// no nodes (the cursor stays put in that case).
    pub fn undo(&mut self, store: &mut NodeStore) -> bool {
        if !self.can_undo() {
            return false;
        }
        if self.snapshots[self.cursor - 1].nodes.is_empty() {
            warn!("event=history_undo module=history status=rejected reason=empty_snapshot");
            return false;
        }

        self.cursor -= 1;
        let snapshot = self.snapshots[self.cursor].clone();
        self.restore(store, snapshot);
        debug!(
            "event=history_undo module=history status=ok cursor={}",
            self.cursor
        );
        true
    }

    /// Steps forward one snapshot and restores it into `store`.
    pub fn redo(&mut self, store: &mut NodeStore) -> bool {
        if !self.can_redo() {
            return false;
        }

        self.cursor += 1;
        let snapshot = self.snapshots[self.cursor].clone();
        self.restore(store, snapshot);
        debug!(
            "event=history_redo module=history status=ok cursor={}",
            self.cursor
        );
        true
    }

    /// Replaces store contents with `snapshot`.
    ///
    /// Selection survives only if its id exists afterwards. A snapshot that
    /// yields no nodes is replaced by a fresh default root.
    pub fn restore(&mut self, store: &mut NodeStore, snapshot: Snapshot) {
        self.restoring = true;
        store.restore_parts(snapshot.nodes, snapshot.connections, snapshot.selected);
        if store.is_empty() {
            warn!("event=history_restore module=history status=fallback reason=empty_snapshot");
            *store = NodeStore::with_root(DEFAULT_ROOT_TEXT);
        }
        self.restoring = false;
    }

    /// Drops all entries and records `store` as the only snapshot.
    pub fn reset(&mut self, store: &NodeStore) {
        self.snapshots.clear();
        self.cursor = 0;
        self.commit(store);
    }

    pub fn can_undo(&self) -> bool {
        !self.snapshots.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.snapshots.is_empty() && self.cursor + 1 < self.snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Index of the live snapshot, `None` before the first commit.
    pub fn cursor(&self) -> Option<usize> {
        (!self.snapshots.is_empty()).then_some(self.cursor)
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    /// Snapshot under the cursor.
    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.cursor)
    }
}
