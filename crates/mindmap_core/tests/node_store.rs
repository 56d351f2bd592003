use mindmap_core::model::node::{PLACEHOLDER_TEXT, DEFAULT_ROOT_TEXT};
use mindmap_core::tree::store::{CHILD_RADIUS, DEFAULT_ROOT_POSITION};
use mindmap_core::{Connection, Node, NodeColor, NodeId, NodeSize, NodeStore, Point, StoreError};

fn distance(a: Point, b: Point) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

fn root_of(store: &NodeStore) -> NodeId {
    store.root_id().unwrap().clone()
}

#[test]
fn two_children_of_center_get_distinct_colors() {
    let mut store = NodeStore::with_root("Center");
    let root = root_of(&store);

    let first = store.add_child(&root, "one", None).unwrap();
    let second = store.add_child(&root, "two", None).unwrap();

    assert_eq!(store.len(), 3);
    assert_eq!(store.connections().len(), 2);
    assert_eq!(first.parent.as_ref(), Some(&root));
    assert_eq!(second.parent.as_ref(), Some(&root));

    let root_color = store.root().unwrap().color;
    assert_ne!(first.color, root_color);
    assert_ne!(second.color, root_color);
    assert_ne!(first.color, second.color);
    assert_eq!(first.color, NodeColor::Blue);
    assert_eq!(second.color, NodeColor::Green);
    store.check_invariants().unwrap();
}

#[test]
fn child_color_follows_parent_palette_position() {
    let mut store = NodeStore::with_root("Center");
    let root = root_of(&store);
    let teal = store.add_child(&root, "t", Some(NodeColor::Teal)).unwrap();

    let grandchild = store.add_child(&teal.id, "g", None).unwrap();
    assert_eq!(grandchild.color, NodeColor::Yellow);

    let explicit = store.add_child(&teal.id, "e", Some(NodeColor::Red)).unwrap();
    assert_eq!(explicit.color, NodeColor::Red);
}

#[test]
fn default_child_positions_fan_out_from_parent() {
    let mut store = NodeStore::with_root("Center");
    let root = root_of(&store);
    let root_position = store.root().unwrap().position;
    assert_eq!(root_position, DEFAULT_ROOT_POSITION);

    let first = store.add_child(&root, "a", None).unwrap();
    let second = store.add_child(&root, "b", None).unwrap();

    assert!((distance(root_position, first.position) - CHILD_RADIUS).abs() < 1e-9);
    assert!((distance(root_position, second.position) - CHILD_RADIUS).abs() < 1e-9);
    assert!((first.position.x - (root_position.x + CHILD_RADIUS)).abs() < 1e-9);
    assert!((first.position.y - root_position.y).abs() < 1e-9);
    assert_ne!(first.position, second.position);
}

#[test]
fn create_root_only_on_empty_store() {
    let mut store = NodeStore::new();
    assert!(store.is_empty());
    let root = store.create_root(DEFAULT_ROOT_TEXT).unwrap();
    assert!(root.is_root());

    let err = store.create_root("again").unwrap_err();
    assert!(matches!(err, StoreError::InvariantViolation(_)));
    assert_eq!(store.len(), 1);
}

#[test]
fn add_child_to_missing_parent_is_not_found() {
    let mut store = NodeStore::with_root("Center");
    let missing = NodeId::from("ghost");

    let err = store.add_child(&missing, "x", None).unwrap_err();
    assert_eq!(err, StoreError::NotFound(missing));
    assert_eq!(store.len(), 1);
}

#[test]
fn delete_subtree_removes_node_descendants_and_connections() {
    let mut store = NodeStore::with_root("Center");
    let root = root_of(&store);
    let keep = store.add_child(&root, "keep", None).unwrap();
    let doomed = store.add_child(&root, "doomed", None).unwrap();
    let kid = store.add_child(&doomed.id, "kid", None).unwrap();
    let grandkid = store.add_child(&kid.id, "grandkid", None).unwrap();
    store.select(&grandkid.id).unwrap();

    let removed = store.delete_subtree(&doomed.id).unwrap();

    assert_eq!(removed, 3);
    assert_eq!(store.len(), 2);
    assert!(!store.contains(&doomed.id));
    assert!(!store.contains(&kid.id));
    assert!(!store.contains(&grandkid.id));
    assert_eq!(store.children_of(&root).unwrap(), [keep.id.clone()].as_slice());
    assert_eq!(
        store.connections(),
        [Connection::new(root.clone(), keep.id.clone())].as_slice()
    );
    assert_eq!(store.selected(), None);
    store.check_invariants().unwrap();
}

#[test]
fn deleting_root_or_last_node_is_silent_noop() {
    let mut store = NodeStore::with_root("Center");
    let root = root_of(&store);
    assert_eq!(store.delete_subtree(&root).unwrap(), 0);
    assert_eq!(store.len(), 1);

    store.add_child(&root, "a", None).unwrap();
    assert_eq!(store.delete_subtree(&root).unwrap(), 0);
    assert_eq!(store.len(), 2);
}

#[test]
fn deleting_last_child_clears_parent_collapse() {
    let mut store = NodeStore::with_root("Center");
    let root = root_of(&store);
    let parent = store.add_child(&root, "p", None).unwrap();
    let only = store.add_child(&parent.id, "c", None).unwrap();
    mindmap_core::tree::visibility::toggle_collapse(&mut store, &parent.id).unwrap();
    assert!(store.get(&parent.id).unwrap().collapsed);

    store.delete_subtree(&only.id).unwrap();

    assert!(!store.get(&parent.id).unwrap().collapsed);
    store.check_invariants().unwrap();
}

#[test]
fn setters_report_change_and_validate_input() {
    let mut store = NodeStore::with_root("Center");
    let root = root_of(&store);

    assert!(store.set_text(&root, "  Renamed  ").unwrap());
    assert_eq!(store.get(&root).unwrap().text, "Renamed");
    assert!(!store.set_text(&root, "Renamed").unwrap());
    assert!(store.set_text(&root, "   ").unwrap());
    assert_eq!(store.get(&root).unwrap().text, PLACEHOLDER_TEXT);

    assert!(store.set_color(&root, NodeColor::Purple).unwrap());
    assert!(!store.set_color(&root, NodeColor::Purple).unwrap());

    assert!(store.set_position(&root, 10.0, -20.0).unwrap());
    assert_eq!(store.get(&root).unwrap().position, Point::new(10.0, -20.0));
    assert!(matches!(
        store.set_position(&root, f64::NAN, 0.0),
        Err(StoreError::InvalidPosition { .. })
    ));
    assert!(matches!(
        store.set_text(&NodeId::from("ghost"), "x"),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn depth_drives_size_tier_and_leaf_flag() {
    let mut store = NodeStore::with_root("Center");
    let root = root_of(&store);
    let child = store.add_child(&root, "a", None).unwrap();
    let grandchild = store.add_child(&child.id, "b", None).unwrap();

    let root_style = store.style_of(&root).unwrap();
    let leaf_style = store.style_of(&grandchild.id).unwrap();

    assert_eq!(root_style.depth, 0);
    assert!(!root_style.is_leaf);
    assert_eq!(leaf_style.depth, 2);
    assert!(leaf_style.is_leaf);
    assert_eq!(leaf_style.size, NodeSize::for_depth(2));
    assert_eq!(store.size_of(&grandchild.id).unwrap(), leaf_style.size);
    assert!(root_style.size.width > leaf_style.size.width);
    assert!(root_style.size.font_size > leaf_style.size.font_size);
    assert_eq!(NodeSize::for_depth(40), NodeSize::for_depth(4));
}

#[test]
fn subtree_ids_are_pre_order() {
    let mut store = NodeStore::with_root("Center");
    let root = root_of(&store);
    let a = store.add_child(&root, "a", None).unwrap();
    let a1 = store.add_child(&a.id, "a1", None).unwrap();
    let b = store.add_child(&root, "b", None).unwrap();

    let order = store.subtree_ids(&root).unwrap();
    assert_eq!(order, vec![root.clone(), a.id, a1.id, b.id]);
}

#[test]
fn from_parts_rejects_broken_links() {
    let root = NodeId::from("root");
    let child = NodeId::from("child");
    let make = |id: &NodeId, parent: Option<&NodeId>, children: Vec<NodeId>| Node {
        id: id.clone(),
        position: Point::new(0.0, 0.0),
        text: id.to_string(),
        color: NodeColor::Default,
        children,
        parent: parent.cloned(),
        collapsed: false,
    };

    let valid = NodeStore::from_parts(
        vec![
            make(&root, None, vec![child.clone()]),
            make(&child, Some(&root), Vec::new()),
        ],
        vec![Connection::new(root.clone(), child.clone())],
        Some(child.clone()),
    )
    .unwrap();
    assert_eq!(valid.selected(), Some(&child));

    let orphan_link = NodeStore::from_parts(
        vec![
            make(&root, None, Vec::new()),
            make(&child, Some(&root), Vec::new()),
        ],
        vec![Connection::new(root.clone(), child.clone())],
        None,
    );
    assert!(matches!(orphan_link, Err(StoreError::InvariantViolation(_))));

    let two_roots = NodeStore::from_parts(
        vec![make(&root, None, Vec::new()), make(&child, None, Vec::new())],
        Vec::new(),
        None,
    );
    assert!(matches!(two_roots, Err(StoreError::InvariantViolation(_))));

    let empty = NodeStore::from_parts(Vec::new(), Vec::new(), None);
    assert!(matches!(empty, Err(StoreError::InvariantViolation(_))));
}
