use vellum_core::{
    Document, Editor, ExtensionRegistry, Marks, Node, Point, Selection,
};

fn editor_with_selection(text: &str, start: usize, end: usize) -> Editor {
    let doc = Document {
        children: vec![Node::paragraph(text)],
    };
    let selection = Selection {
        anchor: Point::new(vec![0, 0], start),
        focus: Point::new(vec![0, 0], end),
    };
    Editor::new(doc, selection, ExtensionRegistry::standard())
}

fn text_runs(editor: &Editor) -> Vec<(String, Marks)> {
    let Some(Node::Element(block)) = editor.doc().children.first() else {
        panic!("expected block");
    };
    block
        .children
        .iter()
        .filter_map(|n| match n {
            Node::Text(t) => Some((t.text.clone(), t.marks.clone())),
            _ => None,
        })
        .collect()
}

#[test]
fn toggle_bold_splits_the_selected_range() {
    let mut editor = editor_with_selection("hello world", 0, 5);
    assert!(editor.run_command("marks.toggle_bold", None).unwrap());

    let runs = text_runs(&editor);
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].0, "hello");
    assert!(runs[0].1.bold);
    assert_eq!(runs[1].0, " world");
    assert!(!runs[1].1.bold);
}

#[test]
fn toggle_bold_twice_restores_plain_text() {
    let mut editor = editor_with_selection("hello", 0, 5);
    assert!(editor.run_command("marks.toggle_bold", None).unwrap());
    assert!(editor.run_command("marks.toggle_bold", None).unwrap());

    let runs = text_runs(&editor);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].0, "hello");
    assert!(!runs[0].1.bold);
}

#[test]
fn unset_link_is_a_noop_without_an_active_link() {
    let mut editor = editor_with_selection("hello", 0, 5);
    assert!(!editor.run_command("marks.unset_link", None).unwrap());
    assert!(!editor.can_undo());
}

#[test]
fn set_and_unset_link_round_trip() {
    let mut editor = editor_with_selection("docs", 0, 4);
    assert!(
        editor
            .run_command(
                "marks.set_link",
                Some(serde_json::json!({ "url": "https://example.com" })),
            )
            .unwrap()
    );
    assert!(editor.run_query::<bool>("marks.has_link_active", None).unwrap());

    assert!(editor.run_command("marks.unset_link", None).unwrap());
    let runs = text_runs(&editor);
    assert!(runs.iter().all(|(_, marks)| marks.link.is_none()));
}

#[test]
fn set_link_requires_url_arg() {
    let mut editor = editor_with_selection("docs", 0, 4);
    assert!(editor.run_command("marks.set_link", None).is_err());
}

#[test]
fn color_mark_applies_to_selection() {
    let mut editor = editor_with_selection("tinted", 0, 6);
    editor
        .run_command(
            "marks.set_color",
            Some(serde_json::json!({ "color": "#ff0000" })),
        )
        .unwrap();

    let runs = text_runs(&editor);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].1.color.as_deref(), Some("#ff0000"));
}

#[test]
fn caret_toggle_arms_marks_for_next_input() {
    let mut editor = editor_with_selection("ab", 1, 1);
    assert!(editor.run_command("marks.toggle_bold", None).unwrap());

    // The caret's leaf split and an empty bold run sits at the caret.
    let runs = text_runs(&editor);
    assert!(runs.iter().any(|(text, marks)| text.is_empty() && marks.bold));
    assert!(editor.run_query::<bool>("marks.is_bold_active", None).unwrap());
}
