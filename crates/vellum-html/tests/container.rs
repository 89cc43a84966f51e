use std::cell::RefCell;
use std::rc::Rc;

use vellum_core::{Point, Selection};
use vellum_html::DocumentContainer;

fn container_with_log(content: &str) -> (DocumentContainer, Rc<RefCell<Vec<String>>>) {
    let emitted: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&emitted);
    let container = DocumentContainer::new(
        content,
        Box::new(move |markup| sink.borrow_mut().push(markup.to_string())),
    );
    (container, emitted)
}

#[test]
fn edits_emit_exactly_once_per_logical_change() {
    let (mut container, emitted) = container_with_log("<p>hello</p>");
    assert!(emitted.borrow().is_empty());

    container
        .run_command(
            "block.toggle_heading",
            Some(serde_json::json!({ "level": 1 })),
        )
        .unwrap();

    let log = emitted.borrow();
    assert_eq!(log.len(), 1);
    assert!(log[0].contains("<h1>hello</h1>"));
}

#[test]
fn echoed_content_is_ignored() {
    let (mut container, emitted) = container_with_log("<p>hello</p>");
    container.set_selection(Selection {
        anchor: Point::new(vec![0, 0], 0),
        focus: Point::new(vec![0, 0], 5),
    });
    container.run_command("marks.toggle_bold", None).unwrap();

    let last = emitted.borrow().last().cloned().expect("one emission");
    assert!(last.contains("<strong>hello</strong>"));

    // Feeding back our own emission must not reset the document.
    container.set_content(&last);
    assert_eq!(container.markup(), last);
    assert_eq!(emitted.borrow().len(), 1);
}

#[test]
fn echo_of_initial_content_is_ignored_too() {
    let (mut container, emitted) = container_with_log("<p>hello</p>");
    let initial = container.markup().to_string();
    container.set_content(&initial);
    assert!(emitted.borrow().is_empty());
    assert_eq!(container.markup(), initial);
}

#[test]
fn different_content_replaces_the_document() {
    let (mut container, _emitted) = container_with_log("<p>first note</p>");
    container.set_content("<p>second note</p>");
    assert!(container.markup().contains("second note"));
    assert!(!container.markup().contains("first note"));
    // History does not leak across note switches.
    assert!(!container.editor().can_undo());
}

#[test]
fn failed_commands_emit_nothing() {
    let (mut container, emitted) = container_with_log("<p>hello</p>");
    // Outside any table: precondition fails, no transaction, no emission.
    let applied = container.run_command("table.delete_row", None).unwrap();
    assert!(!applied);
    assert!(emitted.borrow().is_empty());
}

#[test]
fn trailing_paragraph_keeps_a_typing_position_after_final_block() {
    let (mut container, _emitted) = container_with_log("<p>hello</p>");
    container
        .run_command(
            "table.insert",
            Some(serde_json::json!({ "rows": 2, "cols": 2 })),
        )
        .unwrap();

    assert!(container.markup().ends_with("<p></p>"));
}

#[test]
fn empty_content_starts_with_an_empty_paragraph() {
    let (container, _emitted) = container_with_log("");
    assert_eq!(container.markup(), "<p></p>");
}

#[test]
fn undo_through_the_container_emits_the_reverted_markup() {
    let (mut container, emitted) = container_with_log("<p>hello</p>");
    container
        .run_command(
            "block.toggle_heading",
            Some(serde_json::json!({ "level": 2 })),
        )
        .unwrap();
    assert!(container.undo());

    let log = emitted.borrow();
    assert_eq!(log.len(), 2);
    assert!(log[1].contains("<p>hello</p>"));
}
