//! Flutter bridge for the mind map core.

pub mod api;
