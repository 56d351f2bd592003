//! Mind map domain model.
//!
//! # Responsibility
//! - Define canonical node/connection records shared by every core component.
//! - Keep presentation-only attributes (size tiers) derivable, never stored.
//!
//! # Invariants
//! - Every node is identified by a stable `NodeId`.
//! - Parent/child links are ids resolved through the owning store.

pub mod node;
pub mod view;
