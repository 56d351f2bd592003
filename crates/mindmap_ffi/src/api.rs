//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose editor commands over one process-wide editor session.
//! - Flatten render state into plain structs Dart can mirror.
//! - Persist documents to the local library database.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Failures come back as `ok = false` envelopes with a message.
//! - An outline without headings or items resets to a single default root.

use log::{info, warn};
use mindmap_core::db::open_db;
use mindmap_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    DocumentId, EditorError, LibraryService, MindMapEditor, NodeColor, NodeId, Point,
    RenderState, SqliteDocumentRepository,
};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

const LIBRARY_DB_FILE_NAME: &str = "mindmap_library.sqlite3";
const LIBRARY_LIST_LIMIT_MAX: u32 = 200;

static SESSION: OnceLock<Mutex<MindMapEditor>> = OnceLock::new();
static LIBRARY_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Core crate version.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// Returns an empty string on success and an error message otherwise.
/// Repeating the call with the same `level + log_dir` is a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One node as the canvas draws it.
#[derive(Debug, Clone, PartialEq)]
pub struct MapNodeView {
    pub id: String,
    pub text: String,
    pub x: f64,
    pub y: f64,
    /// Color tag (`default`, `blue`, ...).
    pub color: String,
    pub parent_id: Option<String>,
    pub child_ids: Vec<String>,
    pub collapsed: bool,
    pub depth: u32,
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    pub is_leaf: bool,
    pub visible: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapConnectionView {
    pub parent_id: String,
    pub child_id: String,
    pub visible: bool,
}

/// Full render state envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSnapshotResponse {
    pub nodes: Vec<MapNodeView>,
    pub connections: Vec<MapConnectionView>,
    pub selected_id: Option<String>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub scale: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    pub theme: String,
}

/// Generic command response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapActionResponse {
    pub ok: bool,
    /// Created or affected id (node id or document id), when any.
    pub id: Option<String>,
    pub message: String,
}

impl MapActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Text export envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapTextResponse {
    pub ok: bool,
    pub text: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryItem {
    pub doc_id: String,
    pub title: String,
    pub node_count: u32,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryListResponse {
    pub ok: bool,
    pub items: Vec<LibraryItem>,
    pub message: String,
}

/// Current render state of the session.
#[flutter_rust_bridge::frb(sync)]
pub fn map_snapshot() -> MapSnapshotResponse {
    with_editor(|editor| to_snapshot(editor.render_state()))
}

/// Starts a new document with a single root; clears undo history.
#[flutter_rust_bridge::frb(sync)]
pub fn map_reset(root_text: Option<String>) -> MapActionResponse {
    with_editor(|editor| {
        let text = root_text.unwrap_or_else(|| editor.config().root_text.clone());
        editor.reset(&text);
        MapActionResponse::success("Document reset.", selected_id(editor))
    })
}

/// Adds a child under `parent_id`; returns the new node id.
#[flutter_rust_bridge::frb(sync)]
pub fn map_add_child(parent_id: String) -> MapActionResponse {
    with_editor(|editor| match editor.add_child(&NodeId::from(parent_id)) {
        Ok(id) => MapActionResponse::success("Node added.", Some(id.to_string())),
        Err(err) => MapActionResponse::failure(format!("map_add_child failed: {err}")),
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn map_delete_subtree(node_id: String) -> MapActionResponse {
    with_editor(|editor| match editor.delete_subtree(&NodeId::from(node_id)) {
        Ok(0) => MapActionResponse::success("Root cannot be deleted.", None),
        Ok(removed) => MapActionResponse::success(format!("Deleted {removed} node(s)."), None),
        Err(err) => MapActionResponse::failure(format!("map_delete_subtree failed: {err}")),
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn map_set_text(node_id: String, text: String) -> MapActionResponse {
    let id = NodeId::from(node_id);
    with_editor(|editor| {
        changed_response("map_set_text", &id, editor.set_text(&id, &text))
    })
}

/// Sets a node color by tag; unknown tags are rejected.
#[flutter_rust_bridge::frb(sync)]
pub fn map_set_color(node_id: String, color: String) -> MapActionResponse {
    let Some(color) = NodeColor::from_tag(color.trim()) else {
        return MapActionResponse::failure(format!("map_set_color failed: unknown color `{color}`"));
    };
    let id = NodeId::from(node_id);
    with_editor(|editor| {
        changed_response("map_set_color", &id, editor.set_color(&id, color))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn map_set_position(node_id: String, x: f64, y: f64) -> MapActionResponse {
    let id = NodeId::from(node_id);
    with_editor(|editor| {
        changed_response("map_set_position", &id, editor.set_position(&id, x, y))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn map_toggle_collapse(node_id: String) -> MapActionResponse {
    let id = NodeId::from(node_id);
    with_editor(|editor| {
        changed_response("map_toggle_collapse", &id, editor.toggle_collapse(&id))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn map_select(node_id: Option<String>) -> MapActionResponse {
    with_editor(|editor| match node_id {
        Some(node_id) => {
            let id = NodeId::from(node_id);
            match editor.select(&id) {
                Ok(()) => MapActionResponse::success("Selected.", Some(id.to_string())),
                Err(err) => MapActionResponse::failure(format!("map_select failed: {err}")),
            }
        }
        None => {
            editor.clear_selection();
            MapActionResponse::success("Selection cleared.", None)
        }
    })
}

/// Moves a node by a screen-space delta during a drag gesture.
#[flutter_rust_bridge::frb(sync)]
pub fn map_drag_node_by(node_id: String, dx: f64, dy: f64) -> MapActionResponse {
    let id = NodeId::from(node_id);
    with_editor(|editor| match editor.drag_node_by(&id, dx, dy) {
        Ok(()) => MapActionResponse::success("Moved.", Some(id.to_string())),
        Err(err) => MapActionResponse::failure(format!("map_drag_node_by failed: {err}")),
    })
}

/// Ends a drag gesture; the accumulated move becomes one undo step.
#[flutter_rust_bridge::frb(sync)]
pub fn map_finish_drag() -> bool {
    with_editor(MindMapEditor::finish_drag)
}

#[flutter_rust_bridge::frb(sync)]
pub fn map_undo() -> bool {
    with_editor(MindMapEditor::undo)
}

#[flutter_rust_bridge::frb(sync)]
pub fn map_redo() -> bool {
    with_editor(MindMapEditor::redo)
}

/// Zooms by `factor`, keeping the anchor fixed when both coordinates are given.
#[flutter_rust_bridge::frb(sync)]
pub fn map_zoom(factor: f64, anchor_x: Option<f64>, anchor_y: Option<f64>) -> f64 {
    let anchor = anchor_x.zip(anchor_y).map(|(x, y)| Point::new(x, y));
    with_editor(|editor| {
        editor.zoom(factor, anchor);
        editor.view().scale
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn map_pan_by(dx: f64, dy: f64) {
    with_editor(|editor| editor.pan_by(dx, dy));
}

#[flutter_rust_bridge::frb(sync)]
pub fn map_reset_view() {
    with_editor(MindMapEditor::reset_view);
}

#[flutter_rust_bridge::frb(sync)]
pub fn map_set_theme(theme: String) {
    with_editor(|editor| editor.set_theme(&theme));
}

#[flutter_rust_bridge::frb(sync)]
pub fn map_export_document() -> MapTextResponse {
    with_editor(|editor| match editor.export_document() {
        Ok(text) => MapTextResponse {
            ok: true,
            text,
            message: "Document exported.".to_string(),
        },
        Err(err) => MapTextResponse {
            ok: false,
            text: String::new(),
            message: format!("map_export_document failed: {err}"),
        },
    })
}

/// Replaces the session document; nothing changes on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn map_import_document(text: String) -> MapActionResponse {
    with_editor(|editor| match editor.import_document(&text) {
        Ok(()) => MapActionResponse::success(
            format!("Imported {} node(s).", editor.store().len()),
            editor.store().root_id().map(ToString::to_string),
        ),
        Err(err) => MapActionResponse::failure(format!("map_import_document failed: {err}")),
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn map_export_outline() -> MapTextResponse {
    with_editor(|editor| MapTextResponse {
        ok: true,
        text: editor.export_outline(),
        message: "Outline exported.".to_string(),
    })
}

/// Replaces the session document with one built from outline text.
///
/// Text without any heading or list item yields a fresh single-root map.
#[flutter_rust_bridge::frb(sync)]
pub fn map_import_outline(text: String) -> MapActionResponse {
    with_editor(|editor| match editor.import_outline(&text) {
        Ok(()) => MapActionResponse::success(
            format!("Imported {} node(s).", editor.store().len()),
            editor.store().root_id().map(ToString::to_string),
        ),
        Err(EditorError::EmptyOutline) => {
            info!("event=outline_fallback module=ffi status=ok action=reset");
            let root_text = editor.config().root_text.clone();
            editor.reset(&root_text);
            MapActionResponse::success(
                "Outline had no headings or items; started a new map.",
                editor.store().root_id().map(ToString::to_string),
            )
        }
        Err(err) => MapActionResponse::failure(format!("map_import_outline failed: {err}")),
    })
}

/// Saves the session document; pass `doc_id` to overwrite a saved one.
#[flutter_rust_bridge::frb(sync)]
pub fn library_save(doc_id: Option<String>) -> MapActionResponse {
    let existing = match doc_id.as_deref().map(parse_doc_id).transpose() {
        Ok(existing) => existing,
        Err(message) => return MapActionResponse::failure(format!("library_save failed: {message}")),
    };
    let result = with_library(|library| with_editor(|editor| library.save(editor, existing)));
    match result {
        Ok(id) => MapActionResponse::success("Document saved.", Some(id.to_string())),
        Err(message) => MapActionResponse::failure(format!("library_save failed: {message}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn library_list(limit: Option<u32>) -> LibraryListResponse {
    let limit = limit.map(|value| value.clamp(1, LIBRARY_LIST_LIMIT_MAX));
    match with_library(|library| library.list(limit)) {
        Ok(summaries) => {
            let items = summaries
                .into_iter()
                .map(|summary| LibraryItem {
                    doc_id: summary.doc_uuid.to_string(),
                    title: summary.title,
                    node_count: summary.node_count,
                    updated_at: summary.updated_at,
                })
                .collect::<Vec<_>>();
            LibraryListResponse {
                message: format!("Found {} document(s).", items.len()),
                ok: true,
                items,
            }
        }
        Err(message) => LibraryListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("library_list failed: {message}"),
        },
    }
}

/// Loads a saved document into the session; nothing changes on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn library_load(doc_id: String) -> MapActionResponse {
    let id = match parse_doc_id(&doc_id) {
        Ok(id) => id,
        Err(message) => return MapActionResponse::failure(format!("library_load failed: {message}")),
    };
    match with_library(|library| with_editor(|editor| library.load(id, editor))) {
        Ok(()) => MapActionResponse::success("Document loaded.", Some(id.to_string())),
        Err(message) => MapActionResponse::failure(format!("library_load failed: {message}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn library_delete(doc_id: String) -> MapActionResponse {
    let id = match parse_doc_id(&doc_id) {
        Ok(id) => id,
        Err(message) => {
            return MapActionResponse::failure(format!("library_delete failed: {message}"))
        }
    };
    match with_library(|library| library.delete(id)) {
        Ok(()) => MapActionResponse::success("Document deleted.", Some(id.to_string())),
        Err(message) => MapActionResponse::failure(format!("library_delete failed: {message}")),
    }
}

fn with_editor<T>(f: impl FnOnce(&mut MindMapEditor) -> T) -> T {
    let session = SESSION.get_or_init(|| Mutex::new(MindMapEditor::default()));
    // Commands validate before they mutate, so a poisoned session is still consistent.
    let mut editor = session.lock().unwrap_or_else(|poisoned| {
        warn!("event=session_lock module=ffi status=recovered reason=poisoned");
        poisoned.into_inner()
    });
    f(&mut editor)
}

fn with_library<T, E: std::fmt::Display>(
    f: impl FnOnce(&LibraryService<SqliteDocumentRepository<'_>>) -> Result<T, E>,
) -> Result<T, String> {
    let conn = open_db(resolve_library_db_path())
        .map_err(|err| format!("library DB open failed: {err}"))?;
    let repo = SqliteDocumentRepository::try_new(&conn)
        .map_err(|err| format!("library repo init failed: {err}"))?;
    let service = LibraryService::new(repo);
    f(&service).map_err(|err| err.to_string())
}

fn resolve_library_db_path() -> PathBuf {
    LIBRARY_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("MINDMAP_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(LIBRARY_DB_FILE_NAME)
        })
        .clone()
}

fn parse_doc_id(value: &str) -> Result<DocumentId, String> {
    DocumentId::parse_str(value.trim()).map_err(|_| format!("invalid document id `{value}`"))
}

fn selected_id(editor: &MindMapEditor) -> Option<String> {
    editor.store().selected().map(ToString::to_string)
}

fn changed_response<E: std::fmt::Display>(
    op: &str,
    id: &NodeId,
    result: Result<bool, E>,
) -> MapActionResponse {
    match result {
        Ok(true) => MapActionResponse::success("Updated.", Some(id.to_string())),
        Ok(false) => MapActionResponse::success("Unchanged.", Some(id.to_string())),
        Err(err) => MapActionResponse::failure(format!("{op} failed: {err}")),
    }
}

fn to_snapshot(state: RenderState) -> MapSnapshotResponse {
    let nodes = state
        .nodes
        .into_iter()
        .map(|node| MapNodeView {
            id: node.id.to_string(),
            text: node.text,
            x: node.position.x,
            y: node.position.y,
            color: node.color.as_tag().to_string(),
            parent_id: node.parent.map(|id| id.to_string()),
            child_ids: node.children.iter().map(ToString::to_string).collect(),
            collapsed: node.collapsed,
            depth: u32::try_from(node.style.depth).unwrap_or(u32::MAX),
            width: node.style.size.width,
            height: node.style.size.height,
            font_size: node.style.size.font_size,
            is_leaf: node.style.is_leaf,
            visible: node.visible,
            selected: node.selected,
        })
        .collect();
    let connections = state
        .connections
        .into_iter()
        .map(|entry| MapConnectionView {
            parent_id: entry.connection.parent.to_string(),
            child_id: entry.connection.child.to_string(),
            visible: entry.visible,
        })
        .collect();

    MapSnapshotResponse {
        nodes,
        connections,
        selected_id: state.selected.map(|id| id.to_string()),
        can_undo: state.can_undo,
        can_redo: state.can_redo,
        scale: state.view.scale,
        pan_x: state.view.pan_x,
        pan_y: state.view.pan_y,
        theme: state.view.theme,
    }
}
