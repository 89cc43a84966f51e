use vellum_core::{
    Attrs, Document, Editor, ExtensionRegistry, Node, Point, Selection,
};

fn editor_with_paragraph(text: &str) -> Editor {
    let doc = Document {
        children: vec![Node::paragraph(text)],
    };
    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    Editor::new(doc, selection, ExtensionRegistry::standard())
}

#[test]
fn toggle_bullet_wraps_paragraph_into_list() {
    let mut editor = editor_with_paragraph("item");
    assert!(editor.run_command("list.toggle_bullet", None).unwrap());

    let Some(Node::Element(list)) = editor.doc().children.first() else {
        panic!("expected list");
    };
    assert_eq!(list.kind, "bullet_list");
    assert_eq!(list.children.len(), 1);
    let Some(Node::Element(item)) = list.children.first() else {
        panic!("expected list item");
    };
    assert_eq!(item.kind, "list_item");
    assert!(matches!(
        item.children.first(),
        Some(Node::Element(el)) if el.kind == "paragraph"
    ));

    assert_eq!(
        editor.run_query::<Option<String>>("list.kind", None).unwrap(),
        Some("bullet_list".to_string())
    );
}

#[test]
fn toggle_other_kind_switches_list_in_place() {
    let mut editor = editor_with_paragraph("item");
    editor.run_command("list.toggle_bullet", None).unwrap();
    assert!(editor.run_command("list.toggle_ordered", None).unwrap());

    let Some(Node::Element(list)) = editor.doc().children.first() else {
        panic!("expected list");
    };
    assert_eq!(list.kind, "ordered_list");
    assert_eq!(list.children.len(), 1);
}

#[test]
fn toggle_same_kind_unwraps_the_list() {
    let mut editor = editor_with_paragraph("item");
    editor.run_command("list.toggle_bullet", None).unwrap();
    assert!(editor.run_command("list.toggle_bullet", None).unwrap());

    assert!(matches!(
        editor.doc().children.first(),
        Some(Node::Element(el)) if el.kind == "paragraph"
    ));
}

fn editor_with_two_items() -> Editor {
    let item = |text: &str| {
        Node::element(
            "list_item",
            Attrs::default(),
            vec![Node::paragraph(text)],
        )
    };
    let doc = Document {
        children: vec![Node::element(
            "bullet_list",
            Attrs::default(),
            vec![item("first"), item("second")],
        )],
    };
    // Caret in the second item's paragraph.
    let selection = Selection::collapsed(Point::new(vec![0, 1, 0, 0], 0));
    Editor::new(doc, selection, ExtensionRegistry::standard())
}

#[test]
fn indent_nests_item_under_previous_sibling() {
    let mut editor = editor_with_two_items();
    assert!(editor.run_command("list.indent", None).unwrap());

    let Some(Node::Element(list)) = editor.doc().children.first() else {
        panic!("expected list");
    };
    assert_eq!(list.children.len(), 1);
    let Some(Node::Element(first)) = list.children.first() else {
        panic!("expected item");
    };
    // The nested list holding "second" is the first item's trailing child.
    let Some(Node::Element(nested)) = first.children.last() else {
        panic!("expected nested list");
    };
    assert_eq!(nested.kind, "bullet_list");
    assert_eq!(nested.children.len(), 1);

    assert_eq!(editor.run_query::<u64>("list.depth", None).unwrap(), 2);
}

#[test]
fn indent_without_previous_sibling_is_a_noop() {
    let mut editor = editor_with_two_items();
    // Caret in the FIRST item instead.
    editor.set_selection(Selection::collapsed(Point::new(vec![0, 0, 0, 0], 0)));
    assert!(!editor.run_command("list.indent", None).unwrap());
}

#[test]
fn outdent_lifts_nested_item_back_out() {
    let mut editor = editor_with_two_items();
    editor.run_command("list.indent", None).unwrap();
    assert!(editor.run_command("list.outdent", None).unwrap());

    let Some(Node::Element(list)) = editor.doc().children.first() else {
        panic!("expected list");
    };
    assert_eq!(list.children.len(), 2);
    assert_eq!(editor.run_query::<u64>("list.depth", None).unwrap(), 1);
}

#[test]
fn outdent_at_top_level_is_a_noop() {
    let mut editor = editor_with_two_items();
    assert!(!editor.run_command("list.outdent", None).unwrap());
}
