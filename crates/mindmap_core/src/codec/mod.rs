//! Serialization bridges.
//!
//! # Responsibility
//! - `document`: lossless structured JSON (nodes, connections, view state).
//! - `outline`: lossy heading/list text with bidirectional rules.
//!
//! # Invariants
//! - Imports build a new store; they never mutate live state.

pub mod document;
pub mod outline;
