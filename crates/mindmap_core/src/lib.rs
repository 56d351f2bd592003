//! Core document model for the mind map editor.
//! This crate owns every tree invariant; UI shells only issue commands.

pub mod codec;
pub mod db;
pub mod history;
pub mod layout;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod tree;

pub use codec::document::{export_document, import_document, DocumentError, ImportedDocument};
pub use codec::outline::{export_outline, import_outline, parse_outline, OutlineError};
pub use history::{HistoryManager, Snapshot, DEFAULT_MAX_HISTORY_SIZE};
pub use layout::{compute_radial, layout_radial, LayoutConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::node::{Connection, Node, NodeColor, NodeId, NodeSize, NodeStyle, Point};
pub use model::view::ViewState;
pub use repo::document_repo::{
    DocumentId, DocumentRecord, DocumentRepository, DocumentSummary, RepoError, RepoResult,
    SqliteDocumentRepository,
};
pub use service::editor::{
    EditorConfig, EditorError, EditorObserver, EditorResult, MindMapEditor, RenderConnection,
    RenderNode, RenderState,
};
pub use service::library_service::{LibraryError, LibraryService};
pub use tree::store::{NodeStore, StoreError, StoreResult};
pub use tree::visibility::VisibilityMap;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
