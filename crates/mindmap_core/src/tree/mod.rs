//! Mind map tree: node arena and derived visibility.
//!
//! # Responsibility
//! - `store` owns nodes, connections and selection.
//! - `visibility` derives what is shown from collapse flags.
//!
//! # Invariants
//! - Only `store` creates or destroys nodes.
//! - Other components keep ids and re-query the store.

pub mod store;
pub mod visibility;
