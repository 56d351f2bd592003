//! Use-case services.
//!
//! # Responsibility
//! - `editor`: command facade over one live mind map.
//! - `library_service`: save/load/list/delete documents through a repository.

pub mod editor;
pub mod library_service;
