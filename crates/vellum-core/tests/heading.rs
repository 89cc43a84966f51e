use vellum_core::{
    Attrs, Document, Editor, ElementNode, ExtensionRegistry, Marks, Node, Point, Selection,
    TextNode,
};

#[test]
fn heading_toggle_converts_paragraph_and_back() {
    let mut editor = Editor::standard();

    assert_eq!(
        editor
            .run_query::<Option<u64>>("block.heading_level", None)
            .unwrap(),
        None
    );

    let applied = editor
        .run_command("block.toggle_heading", Some(serde_json::json!({ "level": 2 })))
        .unwrap();
    assert!(applied);

    let Node::Element(block) = &editor.doc().children[0] else {
        panic!("expected element block");
    };
    assert_eq!(block.kind, "heading");
    assert_eq!(block.attrs.get("level").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(
        editor
            .run_query::<Option<u64>>("block.heading_level", None)
            .unwrap(),
        Some(2)
    );

    // Same level again: toggle semantics revert to a paragraph.
    let applied = editor
        .run_command("block.toggle_heading", Some(serde_json::json!({ "level": 2 })))
        .unwrap();
    assert!(applied);

    let Node::Element(block) = &editor.doc().children[0] else {
        panic!("expected element block");
    };
    assert_eq!(block.kind, "paragraph");
    assert!(block.attrs.get("level").is_none());
}

#[test]
fn heading_toggle_switches_between_levels() {
    let mut editor = Editor::standard();

    editor
        .run_command("block.toggle_heading", Some(serde_json::json!({ "level": 2 })))
        .unwrap();
    editor
        .run_command("block.toggle_heading", Some(serde_json::json!({ "level": 3 })))
        .unwrap();

    let Node::Element(block) = &editor.doc().children[0] else {
        panic!("expected element block");
    };
    assert_eq!(block.kind, "heading");
    assert_eq!(block.attrs.get("level").and_then(|v| v.as_u64()), Some(3));
}

#[test]
fn heading_normalize_clamps_out_of_range_level() {
    let mut attrs = Attrs::default();
    attrs.insert("level".to_string(), serde_json::json!(42));
    let doc = Document {
        children: vec![Node::Element(ElementNode {
            kind: "heading".to_string(),
            attrs,
            children: vec![Node::Text(TextNode {
                text: "x".to_string(),
                marks: Marks::default(),
            })],
        })],
    };
    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    let editor = Editor::new(doc, selection, ExtensionRegistry::standard());

    let Node::Element(block) = &editor.doc().children[0] else {
        panic!("expected element block");
    };
    assert_eq!(block.attrs.get("level").and_then(|v| v.as_u64()), Some(6));
}

#[test]
fn trailing_paragraph_follows_non_paragraph_final_block() {
    let mut editor = Editor::standard();
    editor
        .run_command("block.toggle_heading", Some(serde_json::json!({ "level": 1 })))
        .unwrap();

    // The heading became the last block; a fresh paragraph must follow it.
    assert_eq!(editor.doc().children.len(), 2);
    assert!(matches!(
        editor.doc().children.last(),
        Some(Node::Element(el)) if el.kind == "paragraph"
    ));
}
