use vellum_core::{
    Document, Editor, ExtensionRegistry, Node, Point, Selection, Step, Transaction,
};

fn editor_with_text(text: &str) -> Editor {
    let doc = Document {
        children: vec![Node::paragraph(text)],
    };
    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    Editor::new(doc, selection, ExtensionRegistry::standard())
}

#[test]
fn undo_redo_replays_multi_step_transactions() {
    let mut editor = editor_with_text("");

    let tx = Transaction::new(vec![
        Step::InsertText {
            path: vec![0, 0],
            offset: 0,
            text: "a".to_string(),
        },
        Step::InsertText {
            path: vec![0, 0],
            offset: 1,
            text: "b".to_string(),
        },
    ])
    .selection_after(Selection::collapsed(Point::new(vec![0, 0], 2)))
    .origin("test:multi_insert");

    editor.apply(tx).unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("ab")]);
    assert_eq!(editor.selection().focus.offset, 2);

    assert!(editor.undo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("")]);
    assert_eq!(editor.selection().focus.offset, 0);

    assert!(editor.redo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("ab")]);
    assert_eq!(editor.selection().focus.offset, 2);
}

#[test]
fn undo_is_a_noop_on_empty_history() {
    let mut editor = editor_with_text("x");
    assert!(!editor.can_undo());
    assert!(!editor.undo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("x")]);
}

#[test]
fn history_commands_report_applicability() {
    let mut editor = editor_with_text("");
    assert!(!editor.run_command("history.undo", None).unwrap());

    editor
        .apply(
            Transaction::new(vec![Step::InsertText {
                path: vec![0, 0],
                offset: 0,
                text: "hi".to_string(),
            }])
            .origin("test:insert"),
        )
        .unwrap();

    assert!(editor.run_command("history.undo", None).unwrap());
    assert_eq!(editor.doc().children, vec![Node::paragraph("")]);
    assert!(editor.run_command("history.redo", None).unwrap());
    assert_eq!(editor.doc().children, vec![Node::paragraph("hi")]);
}
