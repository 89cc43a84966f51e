use vellum_core::table_style::{self, CellStyle, SelectionScope};
use vellum_core::{
    Attrs, Document, Editor, ExtensionRegistry, Node, Point, Selection,
};

fn editor_with_3x3() -> Editor {
    let mut editor = Editor::standard();
    editor
        .run_command(
            "table.insert",
            Some(serde_json::json!({ "rows": 3, "cols": 3 })),
        )
        .unwrap();
    editor
}

fn cell_background(editor: &Editor, row: usize, col: usize) -> Option<String> {
    let Some(Node::Element(cell)) = editor.doc().node(&[1, row, col]) else {
        panic!("no cell at ({row}, {col})");
    };
    cell.attrs
        .get("background")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

#[test]
fn row_scope_styles_every_cell_in_the_cursor_row() {
    let mut editor = editor_with_3x3();
    // Cursor in cell (1, 1).
    editor.set_selection(Selection::collapsed(Point::new(vec![1, 1, 1, 0, 0], 0)));

    let applied = editor
        .run_command(
            "table.style_cells",
            Some(serde_json::json!({
                "scope": "row",
                "style": { "background": "#ffcc00" }
            })),
        )
        .unwrap();
    assert!(applied);

    for col in 0..3 {
        assert_eq!(cell_background(&editor, 1, col).as_deref(), Some("#ffcc00"));
    }
    for col in 0..3 {
        assert_eq!(cell_background(&editor, 0, col), None);
        assert_eq!(cell_background(&editor, 2, col), None);
    }
}

#[test]
fn cell_scope_styles_exactly_one_cell() {
    let mut editor = editor_with_3x3();
    editor.set_selection(Selection::collapsed(Point::new(vec![1, 2, 0, 0, 0], 0)));

    editor
        .run_command(
            "table.style_cells",
            Some(serde_json::json!({
                "scope": "cell",
                "style": { "background": "#00ff00" }
            })),
        )
        .unwrap();

    let mut styled = 0;
    for row in 0..3 {
        for col in 0..3 {
            if cell_background(&editor, row, col).is_some() {
                styled += 1;
                assert_eq!((row, col), (2, 0));
            }
        }
    }
    assert_eq!(styled, 1);
}

#[test]
fn bulk_styling_is_one_undo_step() {
    let mut editor = editor_with_3x3();
    editor.set_selection(Selection::collapsed(Point::new(vec![1, 1, 1, 0, 0], 0)));
    let depth_before = editor.undo_depth();

    editor
        .run_command(
            "table.style_cells",
            Some(serde_json::json!({
                "scope": "table",
                "style": { "background": "#ffcc00", "align": "center" }
            })),
        )
        .unwrap();
    assert_eq!(editor.undo_depth(), depth_before + 1);

    // One undo reverts all nine cells together.
    assert!(editor.undo());
    for row in 0..3 {
        for col in 0..3 {
            assert_eq!(cell_background(&editor, row, col), None);
        }
    }
}

#[test]
fn styling_outside_a_table_is_a_noop() {
    let mut editor = Editor::standard();
    let applied = editor
        .run_command(
            "table.style_cells",
            Some(serde_json::json!({
                "scope": "table",
                "style": { "background": "#ffcc00" }
            })),
        )
        .unwrap();
    assert!(!applied);
    assert!(!editor.can_undo());
}

#[test]
fn column_scope_skips_short_rows_in_ragged_tables() {
    // Row 1 has a single cell; column 2 targeting skips it.
    let rows = vec![
        row_with_cells(3),
        row_with_cells(1),
        row_with_cells(3),
    ];
    let doc = Document {
        children: vec![Node::element("table", Attrs::default(), rows)],
    };
    let selection = Selection::collapsed(Point::new(vec![0, 0, 2, 0, 0], 0));
    let editor = Editor::new(doc, selection, ExtensionRegistry::standard());

    let targets = table_style::resolve_targets(
        editor.doc(),
        &editor.selection().focus.path,
        SelectionScope::Column,
    );
    assert_eq!(targets, vec![vec![0, 0, 2], vec![0, 2, 2]]);
}

#[test]
fn presets_fill_every_style_field() {
    let style = table_style::preset("professional").unwrap();
    assert!(style.background.is_some());
    assert!(style.color.is_some());
    assert!(style.border_width.is_some());
    assert!(style.border_style.is_some());
    assert!(style.border_color.is_some());
    assert!(style.padding.is_some());
    assert!(style.align.is_some());

    assert!(table_style::preset("no-such-preset").is_none());
}

#[test]
fn preset_command_applies_to_row_targets() {
    let mut editor = editor_with_3x3();
    editor.set_selection(Selection::collapsed(Point::new(vec![1, 0, 0, 0, 0], 0)));

    let applied = editor
        .run_command(
            "table.apply_preset",
            Some(serde_json::json!({ "scope": "row", "preset": "accent" })),
        )
        .unwrap();
    assert!(applied);

    for col in 0..3 {
        let Some(Node::Element(cell)) = editor.doc().node(&[1, 0, col]) else {
            panic!("no cell");
        };
        assert_eq!(
            cell.attrs.get("background").and_then(|v| v.as_str()),
            Some("#fff3cd")
        );
        assert_eq!(cell.attrs.get("padding").and_then(|v| v.as_u64()), Some(8));
    }
}

#[test]
fn partial_style_leaves_other_fields_untouched() {
    let mut editor = editor_with_3x3();
    editor.set_selection(Selection::collapsed(Point::new(vec![1, 0, 0, 0, 0], 0)));

    editor
        .run_command(
            "table.apply_preset",
            Some(serde_json::json!({ "scope": "cell", "preset": "professional" })),
        )
        .unwrap();
    editor
        .run_command(
            "table.style_cells",
            Some(serde_json::json!({
                "scope": "cell",
                "style": { "background": "#112233" }
            })),
        )
        .unwrap();

    let Some(Node::Element(cell)) = editor.doc().node(&[1, 0, 0]) else {
        panic!("no cell");
    };
    assert_eq!(
        cell.attrs.get("background").and_then(|v| v.as_str()),
        Some("#112233")
    );
    // The preset's other fields survived the background-only update.
    assert_eq!(cell.attrs.get("padding").and_then(|v| v.as_u64()), Some(8));
    assert_eq!(
        cell.attrs.get("align").and_then(|v| v.as_str()),
        Some("left")
    );
}

#[test]
fn empty_style_is_a_noop() {
    let mut editor = editor_with_3x3();
    editor.set_selection(Selection::collapsed(Point::new(vec![1, 0, 0, 0, 0], 0)));
    let applied = editor
        .run_command(
            "table.style_cells",
            Some(serde_json::json!({ "scope": "table", "style": {} })),
        )
        .unwrap();
    assert!(!applied);
}

fn row_with_cells(cols: usize) -> Node {
    let cells = (0..cols)
        .map(|_| Node::element("table_cell", Attrs::default(), vec![Node::paragraph("")]))
        .collect();
    Node::element("table_row", Attrs::default(), cells)
}
