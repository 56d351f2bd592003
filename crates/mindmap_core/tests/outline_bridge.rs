use mindmap_core::codec::outline::{color_for_level, parse_outline};
use mindmap_core::{export_outline, import_outline, LayoutConfig, NodeColor, NodeStore, OutlineError, Point};

fn text_of(store: &NodeStore, id: &mindmap_core::NodeId) -> String {
    store.get(id).unwrap().text.clone()
}

fn children_text(store: &NodeStore, id: &mindmap_core::NodeId) -> Vec<String> {
    store
        .children_of(id)
        .unwrap()
        .iter()
        .map(|child| text_of(store, child))
        .collect()
}

fn find(store: &NodeStore, text: &str) -> mindmap_core::NodeId {
    store
        .nodes()
        .find(|node| node.text == text)
        .map(|node| node.id.clone())
        .unwrap()
}

#[test]
fn level_stack_attaches_to_most_recent_open_ancestor() {
    let store = import_outline("# A\n## B\n## C\n### D", &LayoutConfig::default()).unwrap();

    let root = store.root_id().unwrap().clone();
    assert_eq!(text_of(&store, &root), "A");
    assert_eq!(children_text(&store, &root), vec!["B", "C"]);

    let b = find(&store, "B");
    let c = find(&store, "C");
    let d = find(&store, "D");
    assert!(store.children_of(&b).unwrap().is_empty());
    assert_eq!(store.get(&d).unwrap().parent.as_ref(), Some(&c));

    assert_eq!(store.get(&b).unwrap().color, NodeColor::Green);
    assert_eq!(store.get(&c).unwrap().color, NodeColor::Green);
    assert_eq!(store.get(&d).unwrap().color, NodeColor::Orange);
    store.check_invariants().unwrap();
}

#[test]
fn depths_one_to_six_map_to_fixed_colors() {
    let text = "# Title\n# One\n## Two\n### Three\n#### Four\n##### Five\n###### Six\n- Seven\n";
    let store = import_outline(text, &LayoutConfig::default()).unwrap();

    let expected = [
        ("One", NodeColor::Blue),
        ("Two", NodeColor::Green),
        ("Three", NodeColor::Orange),
        ("Four", NodeColor::Purple),
        ("Five", NodeColor::Red),
        ("Six", NodeColor::Teal),
        ("Seven", NodeColor::Default),
    ];
    for (text, color) in expected {
        assert_eq!(store.get(&find(&store, text)).unwrap().color, color, "{text}");
    }
    assert_eq!(color_for_level(12), NodeColor::Default);
}

#[test]
fn root_is_never_popped_by_same_level_lines() {
    let store = import_outline("# Title\n# One\n# Two\n", &LayoutConfig::default()).unwrap();
    let root = store.root_id().unwrap().clone();
    assert_eq!(children_text(&store, &root), vec!["One", "Two"]);
}

#[test]
fn level_jumps_attach_without_intermediate_nodes() {
    let store = import_outline("# Root\n### Deep\n## Mid\n- item\n", &LayoutConfig::default()).unwrap();
    let root = store.root_id().unwrap().clone();

    assert_eq!(store.len(), 4);
    assert_eq!(children_text(&store, &root), vec!["Deep", "Mid"]);
    let mid = find(&store, "Mid");
    assert_eq!(children_text(&store, &mid), vec!["item"]);
}

#[test]
fn lists_nest_by_indent_and_ignore_other_lines() {
    let text = "\
# Notes

Some prose that is not structure.
> a quote

## Tasks
- first
  - nested
    1. numbered deeper
* second

```
# not a heading
- not an item
```
";
    let store = import_outline(text, &LayoutConfig::default()).unwrap();

    assert_eq!(store.len(), 6);
    let tasks = find(&store, "Tasks");
    assert_eq!(children_text(&store, &tasks), vec!["first", "second"]);
    let first = find(&store, "first");
    assert_eq!(children_text(&store, &first), vec!["nested"]);
    let nested = find(&store, "nested");
    assert_eq!(children_text(&store, &nested), vec!["numbered deeper"]);
}

#[test]
fn fences_close_only_on_matching_marker() {
    let text = "# A\n```\n~~~\n## Inside\n```\n## After\n";
    let store = parse_outline(text, Point::new(0.0, 0.0)).unwrap();

    let root = store.root_id().unwrap().clone();
    assert_eq!(text_of(&store, &root), "A");
    assert_eq!(children_text(&store, &root), vec!["After"]);
    assert_eq!(store.len(), 2);
}

#[test]
fn longer_fence_needs_equally_long_bare_close() {
    let text = "# A\n~~~~ text\n~~~\n- hidden\n```\n~~~~ not closing\n- hidden too\n~~~~~\n- shown\n";
    let store = parse_outline(text, Point::new(0.0, 0.0)).unwrap();

    let root = store.root_id().unwrap().clone();
    assert_eq!(children_text(&store, &root), vec!["shown"]);
}

#[test]
fn text_without_structure_is_empty_outline() {
    for text in ["", "\n\n", "just prose\nmore prose", "```\n# fenced\n```\n"] {
        assert!(matches!(
            import_outline(text, &LayoutConfig::default()),
            Err(OutlineError::EmptyOutline)
        ));
    }
}

#[test]
fn provisional_positions_spiral_around_center_before_layout() {
    let center = Point::new(0.0, 0.0);
    let store = parse_outline("# A\n## B\n## C\n", center).unwrap();
    let root = store.root().unwrap();
    assert_eq!(root.position, center);
    for node in store.nodes().filter(|node| !node.is_root()) {
        assert_ne!(node.position, center);
    }
}

#[test]
fn export_renders_headings_then_bullets() {
    let mut store = NodeStore::with_root("Title");
    let mut parent = store.root_id().unwrap().clone();
    for depth in 1..=8 {
        parent = store.add_child(&parent, &format!("d{depth}"), None).unwrap().id;
    }
    let root = store.root_id().unwrap().clone();
    store.add_child(&root, "sibling", None).unwrap();

    let expected = concat!(
        "# Title\n\n",
        "# d1\n## d2\n### d3\n#### d4\n##### d5\n###### d6\n",
        "- d7\n  - d8\n",
        "\n\n\n\n\n\n",
        "# sibling\n\n",
    );
    assert_eq!(export_outline(&store), expected);
}

#[test]
fn export_then_import_keeps_structure_and_labels() {
    let mut store = NodeStore::with_root("Plan");
    let root = store.root_id().unwrap().clone();
    let build = store.add_child(&root, "Build", None).unwrap();
    store.add_child(&build.id, "Parser", None).unwrap();
    store.add_child(&build.id, "Codegen", None).unwrap();
    store.add_child(&root, "Ship", None).unwrap();

    let reimported = import_outline(&export_outline(&store), &LayoutConfig::default()).unwrap();

    let new_root = reimported.root_id().unwrap().clone();
    assert_eq!(text_of(&reimported, &new_root), "Plan");
    assert_eq!(children_text(&reimported, &new_root), vec!["Build", "Ship"]);
    let new_build = find(&reimported, "Build");
    assert_eq!(children_text(&reimported, &new_build), vec!["Parser", "Codegen"]);
}
