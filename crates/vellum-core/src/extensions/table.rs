use serde_json::Value;

use crate::editor::Editor;
use crate::extension::{
    CommandError, CommandSpec, ContentModel, Extension, ExtensionRegistry, NodeRole, NodeSpec,
    NormalizePass, QuerySpec,
};
use crate::model::{Attrs, Document, Node, NodePath, Point, Selection};
use crate::step::{Step, Transaction};
use crate::table_style::{self, CellStyle, SelectionScope};

use super::support::{block_insert_position, child_path, string_arg, u64_arg};

pub struct TableExtension;

impl Extension for TableExtension {
    fn id(&self) -> &'static str {
        "table"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec {
                kind: "table".to_string(),
                role: NodeRole::Block,
                atom: false,
                content: ContentModel::Blocks,
            },
            NodeSpec {
                kind: "table_row".to_string(),
                role: NodeRole::Block,
                atom: false,
                content: ContentModel::Blocks,
            },
            NodeSpec {
                kind: "table_cell".to_string(),
                role: NodeRole::Block,
                atom: false,
                content: ContentModel::Blocks,
            },
            NodeSpec {
                kind: "table_header".to_string(),
                role: NodeRole::Block,
                atom: false,
                content: ContentModel::Blocks,
            },
        ]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeTableStructure)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("table.insert", "Insert table", |editor, args| {
                let rows = u64_arg(args.as_ref(), "rows").unwrap_or(2).clamp(1, 32) as usize;
                let cols = u64_arg(args.as_ref(), "cols").unwrap_or(2).clamp(1, 32) as usize;
                let header_row = super::support::bool_arg(args.as_ref(), "header_row")
                    .unwrap_or(false);
                let tx = insert_table(editor, rows, cols, header_row);
                editor
                    .apply(tx)
                    .map_err(|e| CommandError::new(format!("failed to insert table: {e}")))?;
                Ok(true)
            })
            .description("Insert a rows x cols table after the caret block.")
            .keywords(["table", "grid"]),
            CommandSpec::new(
                "table.insert_row_above",
                "Insert row above",
                |editor, _args| {
                    let Some(tx) = insert_row(editor, RowSide::Above) else {
                        return Ok(false);
                    };
                    editor.apply(tx).map_err(|e| {
                        CommandError::new(format!("failed to insert row above: {e}"))
                    })?;
                    Ok(true)
                },
            )
            .description("Insert a new row above the current one.")
            .keywords(["table", "row"]),
            CommandSpec::new(
                "table.insert_row_below",
                "Insert row below",
                |editor, _args| {
                    let Some(tx) = insert_row(editor, RowSide::Below) else {
                        return Ok(false);
                    };
                    editor.apply(tx).map_err(|e| {
                        CommandError::new(format!("failed to insert row below: {e}"))
                    })?;
                    Ok(true)
                },
            )
            .description("Insert a new row below the current one.")
            .keywords(["table", "row"]),
            CommandSpec::new(
                "table.insert_col_left",
                "Insert column left",
                |editor, _args| {
                    let Some(tx) = insert_col(editor, ColSide::Left) else {
                        return Ok(false);
                    };
                    editor.apply(tx).map_err(|e| {
                        CommandError::new(format!("failed to insert column left: {e}"))
                    })?;
                    Ok(true)
                },
            )
            .description("Insert a new column to the left of the current one.")
            .keywords(["table", "column"]),
            CommandSpec::new(
                "table.insert_col_right",
                "Insert column right",
                |editor, _args| {
                    let Some(tx) = insert_col(editor, ColSide::Right) else {
                        return Ok(false);
                    };
                    editor.apply(tx).map_err(|e| {
                        CommandError::new(format!("failed to insert column right: {e}"))
                    })?;
                    Ok(true)
                },
            )
            .description("Insert a new column to the right of the current one.")
            .keywords(["table", "column"]),
            CommandSpec::new("table.delete_row", "Delete row", |editor, _args| {
                let Some(tx) = delete_row(editor) else {
                    return Ok(false);
                };
                editor
                    .apply(tx)
                    .map_err(|e| CommandError::new(format!("failed to delete row: {e}")))?;
                Ok(true)
            })
            .description("Delete the current table row.")
            .keywords(["table", "row", "delete"]),
            CommandSpec::new("table.delete_col", "Delete column", |editor, _args| {
                let Some(tx) = delete_col(editor) else {
                    return Ok(false);
                };
                editor
                    .apply(tx)
                    .map_err(|e| CommandError::new(format!("failed to delete column: {e}")))?;
                Ok(true)
            })
            .description("Delete the current table column.")
            .keywords(["table", "column", "delete"]),
            CommandSpec::new("table.delete_table", "Delete table", |editor, _args| {
                let Some(tx) = delete_table(editor) else {
                    return Ok(false);
                };
                editor
                    .apply(tx)
                    .map_err(|e| CommandError::new(format!("failed to delete table: {e}")))?;
                Ok(true)
            })
            .description("Delete the enclosing table, leaving a paragraph.")
            .keywords(["table", "delete"]),
            CommandSpec::new("table.style_cells", "Style cells", |editor, args| {
                let scope = scope_arg(args.as_ref())?;
                let style: CellStyle = args
                    .as_ref()
                    .and_then(|v| v.get("style"))
                    .cloned()
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|e| CommandError::new(format!("bad args.style: {e}")))?
                    .unwrap_or_default();
                let Some(tx) = table_style::style_cells(editor, scope, &style) else {
                    return Ok(false);
                };
                editor
                    .apply(tx)
                    .map_err(|e| CommandError::new(format!("failed to style cells: {e}")))?;
                Ok(true)
            })
            .description("Apply a style to the targeted cells as one undoable batch.")
            .keywords(["table", "style", "background", "border"]),
            CommandSpec::new("table.apply_preset", "Apply style preset", |editor, args| {
                let scope = scope_arg(args.as_ref())?;
                let name = string_arg(args.as_ref(), "preset")
                    .ok_or_else(|| CommandError::new("missing args.preset"))?;
                let style = table_style::preset(&name)
                    .ok_or_else(|| CommandError::new(format!("unknown preset: {name}")))?;
                let Some(tx) = table_style::style_cells(editor, scope, &style) else {
                    return Ok(false);
                };
                editor
                    .apply(tx)
                    .map_err(|e| CommandError::new(format!("failed to apply preset: {e}")))?;
                Ok(true)
            })
            .description("Apply a named style preset to the targeted cells.")
            .keywords(["table", "style", "preset"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("table.is_active", |editor, _args| {
                let active = editor
                    .doc()
                    .ancestor_of_kind(&editor.selection().focus.path, "table")
                    .is_some();
                Ok(Value::Bool(active))
            }),
            QuerySpec::new("table.cell_position", |editor, _args| {
                let position =
                    table_style::cell_position(editor.doc(), &editor.selection().focus.path);
                match position {
                    Some((row, col)) => Ok(serde_json::json!({ "row": row, "col": col })),
                    None => Ok(Value::Null),
                }
            }),
        ]
    }
}

fn scope_arg(args: Option<&Value>) -> Result<SelectionScope, CommandError> {
    let raw = args
        .and_then(|v| v.get("scope"))
        .and_then(|v| v.as_str())
        .unwrap_or("cell");
    serde_json::from_value(Value::String(raw.to_string()))
        .map_err(|_| CommandError::new(format!("unknown scope: {raw}")))
}

pub(crate) fn table_cell_node() -> Node {
    Node::element("table_cell", Attrs::default(), vec![Node::paragraph("")])
}

fn table_header_node() -> Node {
    Node::element("table_header", Attrs::default(), vec![Node::paragraph("")])
}

fn table_row_node(cols: usize, header: bool) -> Node {
    let cols = cols.max(1);
    let cell = if header {
        table_header_node
    } else {
        table_cell_node
    };
    Node::element(
        "table_row",
        Attrs::default(),
        (0..cols).map(|_| cell()).collect(),
    )
}

fn insert_table(editor: &Editor, rows: usize, cols: usize, header_row: bool) -> Transaction {
    let rows = rows.max(1);
    let table = Node::element(
        "table",
        Attrs::default(),
        (0..rows)
            .map(|r| table_row_node(cols, header_row && r == 0))
            .collect(),
    );

    let (parent, insert_at) = block_insert_position(editor);
    let table_path = child_path(&parent, insert_at);
    let paragraph_path = child_path(&parent, insert_at + 1);

    // Caret into the first cell's paragraph text.
    let mut caret = table_path.clone();
    caret.extend([0, 0, 0, 0]);

    Transaction::new(vec![
        Step::InsertNode {
            path: table_path,
            node: table,
        },
        Step::InsertNode {
            path: paragraph_path,
            node: Node::paragraph(""),
        },
    ])
    .selection_after(Selection::collapsed(Point::new(caret, 0)))
    .origin("command:table.insert")
}

/// Path of the innermost enclosing cell (`table_cell` or `table_header`).
pub(crate) fn cell_ancestor(doc: &Document, path: &[usize]) -> Option<NodePath> {
    for len in (1..=path.len()).rev() {
        let candidate = &path[..len];
        if let Some(kind) = doc.node(candidate).and_then(|n| n.kind())
            && matches!(kind, "table_cell" | "table_header")
        {
            return Some(candidate.to_vec());
        }
    }
    None
}

struct CellContext {
    table_path: NodePath,
    row_ix: usize,
    col_ix: usize,
    row_len: usize,
    table_rows: usize,
}

fn cell_context(editor: &Editor) -> Option<CellContext> {
    let doc = editor.doc();
    let focus_path = &editor.selection().focus.path;
    let cell_path = cell_ancestor(doc, focus_path)?;
    let table_path = doc.ancestor_of_kind(focus_path, "table")?;
    // Direct table > row > cell nesting is the only shape commands operate on.
    if cell_path.len() != table_path.len() + 2 {
        return None;
    }
    let row_ix = cell_path[table_path.len()];
    let col_ix = cell_path[table_path.len() + 1];
    let table = doc.node(&table_path)?.as_element()?;
    let row = table.children.get(row_ix)?.as_element()?;
    Some(CellContext {
        row_len: row.children.len(),
        table_rows: table.children.len(),
        table_path,
        row_ix,
        col_ix,
    })
}

enum RowSide {
    Above,
    Below,
}

fn insert_row(editor: &Editor, side: RowSide) -> Option<Transaction> {
    let ctx = cell_context(editor)?;
    let insert_ix = match side {
        RowSide::Above => ctx.row_ix,
        RowSide::Below => ctx.row_ix + 1,
    };
    let row_path = child_path(&ctx.table_path, insert_ix);

    let mut caret = row_path.clone();
    caret.extend([0, 0, 0]);

    Some(
        Transaction::new(vec![Step::InsertNode {
            path: row_path,
            node: table_row_node(ctx.row_len, false),
        }])
        .selection_after(Selection::collapsed(Point::new(caret, 0)))
        .origin("command:table.insert_row"),
    )
}

enum ColSide {
    Left,
    Right,
}

fn insert_col(editor: &Editor, side: ColSide) -> Option<Transaction> {
    let ctx = cell_context(editor)?;
    let insert_ix = match side {
        ColSide::Left => ctx.col_ix,
        ColSide::Right => ctx.col_ix + 1,
    };

    let doc = editor.doc();
    let table = doc.node(&ctx.table_path)?.as_element()?;
    let mut steps = Vec::new();
    for (row_ix, row) in table.children.iter().enumerate() {
        let Some(row) = row.as_element() else {
            continue;
        };
        if row.kind != "table_row" {
            continue;
        }
        let mut cell_path = child_path(&ctx.table_path, row_ix);
        cell_path.push(insert_ix.min(row.children.len()));
        steps.push(Step::InsertNode {
            path: cell_path,
            node: table_cell_node(),
        });
    }
    if steps.is_empty() {
        return None;
    }

    let mut caret = child_path(&ctx.table_path, ctx.row_ix);
    caret.extend([insert_ix, 0, 0]);

    Some(
        Transaction::new(steps)
            .selection_after(Selection::collapsed(Point::new(caret, 0)))
            .origin("command:table.insert_col"),
    )
}

fn delete_row(editor: &Editor) -> Option<Transaction> {
    let ctx = cell_context(editor)?;
    if ctx.table_rows <= 1 {
        return delete_table(editor);
    }
    let row_path = child_path(&ctx.table_path, ctx.row_ix);

    let mut caret = child_path(&ctx.table_path, ctx.row_ix.saturating_sub(1));
    caret.extend([0, 0, 0]);

    Some(
        Transaction::new(vec![Step::DeleteNode { path: row_path }])
            .selection_after(Selection::collapsed(Point::new(caret, 0)))
            .origin("command:table.delete_row"),
    )
}

fn delete_col(editor: &Editor) -> Option<Transaction> {
    let ctx = cell_context(editor)?;
    let doc = editor.doc();
    let table = doc.node(&ctx.table_path)?.as_element()?;

    let widest = table
        .children
        .iter()
        .filter_map(|r| r.as_element())
        .map(|r| r.children.len())
        .max()
        .unwrap_or(0);
    if widest <= 1 {
        return delete_table(editor);
    }

    let mut steps = Vec::new();
    for (row_ix, row) in table.children.iter().enumerate() {
        let Some(row) = row.as_element() else {
            continue;
        };
        if row.kind != "table_row" || ctx.col_ix >= row.children.len() {
            continue;
        }
        let mut cell_path = child_path(&ctx.table_path, row_ix);
        cell_path.push(ctx.col_ix);
        steps.push(Step::DeleteNode { path: cell_path });
    }
    if steps.is_empty() {
        return None;
    }

    let mut caret = child_path(&ctx.table_path, ctx.row_ix);
    caret.extend([ctx.col_ix.saturating_sub(1), 0, 0]);

    Some(
        Transaction::new(steps)
            .selection_after(Selection::collapsed(Point::new(caret, 0)))
            .origin("command:table.delete_col"),
    )
}

fn delete_table(editor: &Editor) -> Option<Transaction> {
    let doc = editor.doc();
    let table_path = doc.ancestor_of_kind(&editor.selection().focus.path, "table")?;

    let mut caret = table_path.clone();
    caret.push(0);

    Some(
        Transaction::new(vec![
            Step::DeleteNode {
                path: table_path.clone(),
            },
            Step::InsertNode {
                path: table_path,
                node: Node::paragraph(""),
            },
        ])
        .selection_after(Selection::collapsed(Point::new(caret, 0)))
        .origin("command:table.delete_table"),
    )
}

/// Tables keep a minimal legal shape: at least one row, rows keep at least
/// one cell, cells keep at least one block. Ragged widths from parsed
/// markup are left alone — targeting degrades instead (see the style
/// engine).
struct NormalizeTableStructure;

impl NormalizePass for NormalizeTableStructure {
    fn id(&self) -> &'static str {
        "table.normalize_structure"
    }

    fn run(&self, doc: &Document, _registry: &ExtensionRegistry) -> Vec<Step> {
        let mut steps = Vec::new();

        fn fix_table(table: &crate::model::ElementNode, path: &[usize], steps: &mut Vec<Step>) {
            if table.children.is_empty() {
                steps.push(Step::InsertNode {
                    path: child_path(path, 0),
                    node: table_row_node(1, false),
                });
                return;
            }
            for (row_ix, row) in table.children.iter().enumerate() {
                let Some(row) = row.as_element() else {
                    continue;
                };
                if row.kind != "table_row" {
                    continue;
                }
                if row.children.is_empty() {
                    let mut cell_path = child_path(path, row_ix);
                    cell_path.push(0);
                    steps.push(Step::InsertNode {
                        path: cell_path,
                        node: table_cell_node(),
                    });
                    continue;
                }
                for (cell_ix, cell) in row.children.iter().enumerate() {
                    let Some(cell) = cell.as_element() else {
                        continue;
                    };
                    if !matches!(cell.kind.as_str(), "table_cell" | "table_header") {
                        continue;
                    }
                    if cell.children.is_empty() {
                        let mut para_path = child_path(path, row_ix);
                        para_path.extend([cell_ix, 0]);
                        steps.push(Step::InsertNode {
                            path: para_path,
                            node: Node::paragraph(""),
                        });
                    }
                }
            }
        }

        fn walk(nodes: &[Node], path: &mut NodePath, steps: &mut Vec<Step>) {
            for (ix, node) in nodes.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                path.push(ix);
                if el.kind == "table" {
                    fix_table(el, path, steps);
                }
                walk(&el.children, path, steps);
                path.pop();
            }
        }

        walk(&doc.children, &mut Vec::new(), &mut steps);
        steps
    }
}
