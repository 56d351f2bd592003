use mindmap_core::{
    EditorConfig, EditorError, EditorObserver, MindMapEditor, NodeColor, NodeId, Point,
    RenderState,
};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Recorder {
    states: Arc<Mutex<Vec<RenderState>>>,
}

impl Recorder {
    fn count(&self) -> usize {
        self.states.lock().unwrap().len()
    }

    fn last(&self) -> RenderState {
        self.states.lock().unwrap().last().cloned().unwrap()
    }
}

impl EditorObserver for Recorder {
    fn on_render(&mut self, state: &RenderState) {
        self.states.lock().unwrap().push(state.clone());
    }
}

fn editor_with_root(text: &str) -> (MindMapEditor, NodeId) {
    let mut editor = MindMapEditor::new(EditorConfig {
        root_text: text.to_string(),
        ..EditorConfig::default()
    });
    let root = editor.store().root_id().unwrap().clone();
    editor.select(&root).unwrap();
    (editor, root)
}

#[test]
fn new_editor_has_selected_root_and_no_undo() {
    let editor = MindMapEditor::default();
    let root = editor.store().root().unwrap();

    assert_eq!(root.text, "Central Topic");
    assert_eq!(editor.store().selected(), Some(&root.id));
    assert!(!editor.can_undo());
    assert!(!editor.can_redo());
    assert_eq!(editor.view().theme, "mac-light");
}

#[test]
fn add_child_twice_from_center() {
    let (mut editor, root) = editor_with_root("Center");

    let first = editor.add_child(&root).unwrap();
    let second = editor.add_child(&root).unwrap();

    let store = editor.store();
    assert_eq!(store.len(), 3);
    assert_eq!(store.connections().len(), 2);
    let first_node = store.get(&first).unwrap();
    let second_node = store.get(&second).unwrap();
    assert_eq!(first_node.parent.as_ref(), Some(&root));
    assert_eq!(second_node.parent.as_ref(), Some(&root));
    assert_ne!(first_node.color, store.root().unwrap().color);
    assert_ne!(first_node.color, second_node.color);
    assert_eq!(store.selected(), Some(&second));
    assert!(editor.can_undo());
}

#[test]
fn delete_subtree_removes_descendants_and_their_connections() {
    let (mut editor, root) = editor_with_root("Center");
    let keep = editor.add_child(&root).unwrap();
    let doomed = editor.add_child(&root).unwrap();
    let kid = editor.add_child(&doomed).unwrap();
    editor.add_child(&kid).unwrap();

    let before_connections = editor.store().connections().len();
    let removed = editor.delete_subtree(&doomed).unwrap();

    assert_eq!(removed, 3);
    assert_eq!(editor.store().len(), 2);
    assert_eq!(editor.store().connections().len(), before_connections - 3);
    assert_eq!(editor.store().children_of(&root).unwrap(), [keep].as_slice());
    assert!(editor
        .store()
        .connections()
        .iter()
        .all(|connection| editor.store().contains(&connection.child)));
}

#[test]
fn root_delete_is_noop_without_history_entry() {
    let (mut editor, root) = editor_with_root("Center");
    assert_eq!(editor.delete_subtree(&root).unwrap(), 0);
    assert_eq!(editor.store().len(), 1);
    assert!(!editor.can_undo());
}

#[test]
fn unknown_ids_surface_not_found() {
    let (mut editor, _) = editor_with_root("Center");
    let ghost = NodeId::from("ghost");

    assert!(matches!(editor.add_child(&ghost), Err(EditorError::NodeNotFound(_))));
    assert!(matches!(
        editor.set_text(&ghost, "x"),
        Err(EditorError::NodeNotFound(_))
    ));
    assert!(matches!(
        editor.toggle_collapse(&ghost),
        Err(EditorError::NodeNotFound(_))
    ));
    assert!(matches!(editor.select(&ghost), Err(EditorError::NodeNotFound(_))));
}

#[test]
fn unchanged_edits_do_not_create_undo_steps() {
    let (mut editor, root) = editor_with_root("Center");
    assert!(!editor.set_text(&root, "Center").unwrap());
    assert!(!editor.set_color(&root, NodeColor::Default).unwrap());
    assert!(!editor.can_undo());

    assert!(editor.set_color(&root, NodeColor::Teal).unwrap());
    assert!(editor.undo());
    assert_eq!(editor.store().root().unwrap().color, NodeColor::Default);
    assert!(editor.redo());
    assert_eq!(editor.store().root().unwrap().color, NodeColor::Teal);
}

#[test]
fn collapse_updates_render_visibility() {
    let (mut editor, root) = editor_with_root("Center");
    let branch = editor.add_child(&root).unwrap();
    let leaf = editor.add_child(&branch).unwrap();

    assert!(editor.toggle_collapse(&branch).unwrap());
    let state = editor.render_state();

    let node = |id: &NodeId| state.nodes.iter().find(|node| &node.id == id).unwrap();
    assert!(node(&root).visible);
    assert!(node(&branch).visible);
    assert!(node(&branch).collapsed);
    assert!(!node(&leaf).visible);
    assert_eq!(node(&leaf).style.depth, 2);
    assert!(node(&leaf).style.is_leaf);

    let hidden: Vec<_> = state
        .connections
        .iter()
        .filter(|entry| !entry.visible)
        .map(|entry| entry.connection.child.clone())
        .collect();
    assert_eq!(hidden, vec![leaf.clone()]);
    assert!(!editor.toggle_collapse(&leaf).unwrap());
}

#[test]
fn observers_see_committed_mutations_only() {
    let (mut editor, root) = editor_with_root("Center");
    let recorder = Recorder::default();
    editor.subscribe(Box::new(recorder.clone()));
    assert_eq!(recorder.count(), 1);

    let child = editor.add_child(&root).unwrap();
    assert_eq!(recorder.count(), 2);
    assert!(recorder.last().can_undo);
    assert_eq!(recorder.last().nodes.len(), 2);

    editor.set_text(&child, "Child node").unwrap();
    assert_eq!(recorder.count(), 2);

    editor.undo();
    let state = recorder.last();
    assert_eq!(recorder.count(), 3);
    assert_eq!(state.nodes.len(), 1);
    assert!(state.can_redo);
    assert!(!state.can_undo);
}

#[test]
fn drag_moves_in_canvas_units_and_commits_once() {
    let (mut editor, root) = editor_with_root("Center");
    let child = editor.add_child(&root).unwrap();
    let start = editor.store().get(&child).unwrap().position;
    let history_before = editor.history().len();

    editor.zoom(2.0, None);
    editor.drag_node_by(&child, 10.0, 0.0).unwrap();
    editor.drag_node_by(&child, 10.0, -20.0).unwrap();
    assert_eq!(editor.history().len(), history_before);

    assert!(editor.finish_drag());
    assert!(!editor.finish_drag());
    assert_eq!(editor.history().len(), history_before + 1);

    let end = editor.store().get(&child).unwrap().position;
    assert!((end.x - (start.x + 10.0)).abs() < 1e-9);
    assert!((end.y - (start.y - 10.0)).abs() < 1e-9);

    assert!(editor.undo());
    assert_eq!(editor.store().get(&child).unwrap().position, start);
}

#[test]
fn view_state_is_not_part_of_history() {
    let (mut editor, root) = editor_with_root("Center");
    editor.add_child(&root).unwrap();

    editor.zoom(100.0, Some(Point::new(50.0, 50.0)));
    assert_eq!(editor.view().scale, 3.0);
    editor.pan_by(5.0, -5.0);
    editor.set_theme("mac-dark");

    assert!(editor.undo());
    assert_eq!(editor.view().scale, 3.0);
    assert_eq!(editor.view().theme, "mac-dark");

    editor.reset_view();
    assert_eq!(editor.view().scale, 1.0);
    assert_eq!((editor.view().pan_x, editor.view().pan_y), (0.0, 0.0));
    assert_eq!(editor.view().theme, "mac-dark");

    editor.set_theme("  ");
    assert_eq!(editor.view().theme, "mac-light");
}

#[test]
fn document_import_replaces_state_and_is_undoable() {
    let (mut source, root) = editor_with_root("Source");
    let child = source.add_child(&root).unwrap();
    source.set_text(&child, "Imported child").unwrap();
    source.zoom(1.5, None);
    let text = source.export_document().unwrap();

    let (mut target, _) = editor_with_root("Target");
    target.import_document(&text).unwrap();

    assert_eq!(target.store().len(), 2);
    assert_eq!(target.store().get(&child).unwrap().text, "Imported child");
    assert_eq!(target.view().scale, 1.5);

    assert!(target.undo());
    assert_eq!(target.store().root().unwrap().text, "Target");
}

#[test]
fn failed_imports_leave_state_untouched() {
    let (mut editor, root) = editor_with_root("Center");
    editor.add_child(&root).unwrap();
    let before = editor.store().clone();
    let history_before = editor.history().len();

    assert!(matches!(
        editor.import_document("{\"nodes\": []}"),
        Err(EditorError::MalformedDocument(_))
    ));
    assert!(matches!(
        editor.import_outline("no structure at all"),
        Err(EditorError::EmptyOutline)
    ));

    assert_eq!(editor.store(), &before);
    assert_eq!(editor.history().len(), history_before);
}

#[test]
fn outline_import_selects_new_root_and_export_round_trips() {
    let (mut editor, _) = editor_with_root("Center");
    editor.import_outline("# A\n## B\n## C\n### D").unwrap();

    let root = editor.store().root().unwrap();
    assert_eq!(root.text, "A");
    assert_eq!(editor.store().selected(), Some(&root.id));
    assert_eq!(
        editor.export_outline(),
        "# A\n\n# B\n\n# C\n## D\n\n\n"
    );
}

#[test]
fn reset_starts_a_new_document() {
    let (mut editor, root) = editor_with_root("Center");
    editor.add_child(&root).unwrap();
    editor.zoom(2.0, None);

    editor.reset("Fresh");

    assert_eq!(editor.store().len(), 1);
    assert_eq!(editor.store().root().unwrap().text, "Fresh");
    assert!(!editor.can_undo());
    assert_eq!(editor.view().scale, 1.0);
}

#[test]
fn history_cap_comes_from_config() {
    let mut editor = MindMapEditor::new(EditorConfig {
        max_history_size: 3,
        ..EditorConfig::default()
    });
    let root = editor.store().root_id().unwrap().clone();
    for n in 0..5 {
        editor.set_text(&root, &format!("edit {n}")).unwrap();
    }

    assert_eq!(editor.history().len(), 3);
    assert!(editor.undo());
    assert!(editor.undo());
    assert!(!editor.undo());
    assert_eq!(editor.store().root().unwrap().text, "edit 2");
}
