//! Persistence contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the data access contract used by the document library.
//! - Keep SQL details away from editor and service code.
//!
//! # Invariants
//! - Missing rows surface as `NotFound`, distinct from transport errors.

pub mod document_repo;
