//! Deterministic radial placement for bulk-built trees.
//!
//! # Responsibility
//! - Compute positions for a freshly imported or reconstructed tree.
//! - Provide the provisional spiral used while an outline is still being read.
//!
//! # Invariants
//! - Output depends only on tree shape, child order and config.
//! - Each child's subtree stays inside `child_span_ratio` of its parent's
//!   partition, centered on the child angle.

use crate::model::node::{NodeId, Point};
use crate::tree::store::{NodeStore, StoreResult};
use std::collections::BTreeMap;
use std::f64::consts::TAU;

/// Radial layout parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Root position.
    pub center: Point,
    /// Radius added per tree level.
    pub ring_step: f64,
    /// Share of a partition handed down to the child's own descendants.
    pub child_span_ratio: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            center: Point::new(400.0, 300.0),
            ring_step: 200.0,
            child_span_ratio: 0.8,
        }
    }
}

/// Computes radial positions for every node reachable from the root.
pub fn compute_radial(store: &NodeStore, config: &LayoutConfig) -> BTreeMap<NodeId, Point> {
    let mut positions = BTreeMap::new();
    let Some(root_id) = store.root_id() else {
        return positions;
    };

    // (node, radius, span start angle, span width)
    let mut stack = vec![(root_id.clone(), 0.0_f64, 0.0_f64, TAU)];
    while let Some((node_id, radius, start, span)) = stack.pop() {
        let position = if radius == 0.0 {
            config.center
        } else {
            config.center.polar_offset(start + span / 2.0, radius)
        };
        if positions.insert(node_id.clone(), position).is_some() {
            continue;
        }

        let Some(node) = store.get(&node_id) else {
            continue;
        };
        if node.children.is_empty() {
            continue;
        }

        let partition = span / node.children.len() as f64;
        let child_span = partition * config.child_span_ratio;
        for (index, child_id) in node.children.iter().enumerate() {
            let angle = start + (index as f64 + 0.5) * partition;
            stack.push((
                child_id.clone(),
                radius + config.ring_step,
                angle - child_span / 2.0,
                child_span,
            ));
        }
    }

    positions
}

/// Runs [`compute_radial`] and writes the result into `store`.
///
/// Returns how many nodes moved.
pub fn layout_radial(store: &mut NodeStore, config: &LayoutConfig) -> StoreResult<usize> {
    let positions = compute_radial(store, config);
    let mut moved = 0;
    for (node_id, position) in positions {
        if store.set_position(&node_id, position.x, position.y)? {
            moved += 1;
        }
    }
    Ok(moved)
}

/// Temporary position for the `index`-th imported node (1-based for
/// non-root nodes) on a spiral of growing radius around `center`.
pub fn provisional_spiral(center: Point, index: usize) -> Point {
    let step = index as f64;
    center.polar_offset(step * 0.7, 60.0 + step * 24.0)
}
