//! Table targeting and bulk cell styling.
//!
//! Given the caret position and a selection scope, resolve the set of cells
//! the user means and patch their style attributes in one transaction, so a
//! single undo reverts the whole batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::editor::Editor;
use crate::extensions::table::cell_ancestor;
use crate::model::{Document, Node, NodePath};
use crate::step::{AttrPatch, Step, Transaction};

/// Targeting granularity for cell styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionScope {
    Cell,
    Row,
    Column,
    Table,
}

/// One cell-styling request. `None` fields are left untouched, so a single
/// swatch click can set just a background; presets fill every field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
}

impl CellStyle {
    pub fn patch(&self) -> AttrPatch {
        let mut patch = AttrPatch::default();
        if let Some(background) = &self.background {
            patch
                .set
                .insert("background".to_string(), Value::String(background.clone()));
        }
        if let Some(color) = &self.color {
            patch
                .set
                .insert("color".to_string(), Value::String(color.clone()));
        }
        if let Some(width) = self.border_width {
            patch
                .set
                .insert("border_width".to_string(), Value::from(width));
        }
        if let Some(style) = &self.border_style {
            patch
                .set
                .insert("border_style".to_string(), Value::String(style.clone()));
        }
        if let Some(color) = &self.border_color {
            patch
                .set
                .insert("border_color".to_string(), Value::String(color.clone()));
        }
        if let Some(padding) = self.padding {
            patch.set.insert("padding".to_string(), Value::from(padding));
        }
        if let Some(align) = &self.align {
            patch
                .set
                .insert("align".to_string(), Value::String(align.clone()));
        }
        patch
    }
}

/// Named one-click styles that fill every field at once.
pub fn preset(name: &str) -> Option<CellStyle> {
    match name {
        "professional" => Some(CellStyle {
            background: Some("#f8f9fa".to_string()),
            color: Some("#212529".to_string()),
            border_width: Some(1),
            border_style: Some("solid".to_string()),
            border_color: Some("#dee2e6".to_string()),
            padding: Some(8),
            align: Some("left".to_string()),
        }),
        "accent" => Some(CellStyle {
            background: Some("#fff3cd".to_string()),
            color: Some("#664d03".to_string()),
            border_width: Some(2),
            border_style: Some("solid".to_string()),
            border_color: Some("#ffc107".to_string()),
            padding: Some(8),
            align: Some("center".to_string()),
        }),
        "minimal" => Some(CellStyle {
            background: Some("#ffffff".to_string()),
            color: Some("#000000".to_string()),
            border_width: Some(0),
            border_style: Some("none".to_string()),
            border_color: Some("#ffffff".to_string()),
            padding: Some(4),
            align: Some("left".to_string()),
        }),
        _ => None,
    }
}

/// The cursor's (row, column) coordinates inside its table, read directly
/// from the cell's path — the tree addresses cells by index, so no
/// position-size arithmetic is needed.
pub fn cell_position(doc: &Document, from: &[usize]) -> Option<(usize, usize)> {
    let cell_path = cell_ancestor(doc, from)?;
    let table_path = doc.ancestor_of_kind(from, "table")?;
    if cell_path.len() != table_path.len() + 2 {
        return None;
    }
    Some((
        cell_path[table_path.len()],
        cell_path[table_path.len() + 1],
    ))
}

/// Resolve the cell paths a scope targets from the cursor position. An empty
/// result means the cursor is not inside a table and the operation is a
/// no-op.
///
/// Ragged tables degrade in `Column` scope: rows shorter than the column
/// index contribute no target. That limitation is accepted, not repaired.
pub fn resolve_targets(doc: &Document, from: &[usize], scope: SelectionScope) -> Vec<NodePath> {
    let Some(cell_path) = cell_ancestor(doc, from) else {
        return Vec::new();
    };
    let Some(table_path) = doc.ancestor_of_kind(from, "table") else {
        return Vec::new();
    };
    if cell_path.len() != table_path.len() + 2 {
        // Unexpected nesting (e.g. a table inside a cell picked the wrong
        // ancestor); fall back to the innermost cell alone.
        return vec![cell_path];
    }
    let row_ix = cell_path[table_path.len()];
    let col_ix = cell_path[table_path.len() + 1];

    let Some(table) = doc.node(&table_path).and_then(Node::as_element) else {
        return Vec::new();
    };

    let is_cell = |node: &Node| {
        matches!(node.kind(), Some("table_cell") | Some("table_header"))
    };

    let mut targets = Vec::new();
    for (r, row) in table.children.iter().enumerate() {
        let Some(row) = row.as_element() else {
            continue;
        };
        if row.kind != "table_row" {
            continue;
        }
        match scope {
            SelectionScope::Table => {
                for (c, cell) in row.children.iter().enumerate() {
                    if is_cell(cell) {
                        targets.push(cell_coords(&table_path, r, c));
                    }
                }
            }
            SelectionScope::Row => {
                if r != row_ix {
                    continue;
                }
                for (c, cell) in row.children.iter().enumerate() {
                    if is_cell(cell) {
                        targets.push(cell_coords(&table_path, r, c));
                    }
                }
            }
            SelectionScope::Column => {
                if let Some(cell) = row.children.get(col_ix)
                    && is_cell(cell)
                {
                    targets.push(cell_coords(&table_path, r, col_ix));
                }
            }
            SelectionScope::Cell => {
                if r == row_ix
                    && let Some(cell) = row.children.get(col_ix)
                    && is_cell(cell)
                {
                    targets.push(cell_coords(&table_path, r, col_ix));
                }
            }
        }
    }
    targets
}

fn cell_coords(table_path: &[usize], row: usize, col: usize) -> NodePath {
    let mut path = table_path.to_vec();
    path.push(row);
    path.push(col);
    path
}

/// Build the one-batch styling transaction for the current cursor position,
/// or `None` when the cursor is outside a table or the style is empty.
pub fn style_cells(editor: &Editor, scope: SelectionScope, style: &CellStyle) -> Option<Transaction> {
    let patch = style.patch();
    if patch.is_empty() {
        return None;
    }

    let targets = resolve_targets(editor.doc(), &editor.selection().focus.path, scope);
    if targets.is_empty() {
        return None;
    }

    let steps = targets
        .into_iter()
        .map(|path| Step::SetAttrs {
            path,
            patch: patch.clone(),
        })
        .collect();

    Some(
        Transaction::new(steps)
            .selection_after(editor.selection().clone())
            .origin("command:table.style_cells"),
    )
}
