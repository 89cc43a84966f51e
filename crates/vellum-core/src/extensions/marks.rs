use serde_json::Value;

use crate::editor::Editor;
use crate::extension::{CommandError, CommandSpec, Extension, QuerySpec};
use crate::model::{Marks, Node, Point, Selection};
use crate::step::{Step, Transaction, clamp_to_char_boundary};

use super::support::{
    apply_marks_in_run, child_path, inline_text_len, point_for_global_offset, point_global_offset,
    replace_children_steps, string_arg, text_blocks_in_order,
};

/// Bold, italic, underline, strikethrough, inline code, links, text color,
/// and highlight. Marks attach to text runs, not nodes.
pub struct MarksExtension;

impl Extension for MarksExtension {
    fn id(&self) -> &'static str {
        "marks"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("marks.toggle_bold", "Toggle bold", |editor, _args| {
                toggle_bool_mark(editor, |m| m.bold, |m, v| m.bold = v, "marks.toggle_bold")
            })
            .description("Toggle bold on the current selection or caret.")
            .keywords(["bold", "strong"]),
            CommandSpec::new("marks.toggle_italic", "Toggle italic", |editor, _args| {
                toggle_bool_mark(
                    editor,
                    |m| m.italic,
                    |m, v| m.italic = v,
                    "marks.toggle_italic",
                )
            })
            .description("Toggle italic on the current selection or caret.")
            .keywords(["italic", "emphasis"]),
            CommandSpec::new(
                "marks.toggle_underline",
                "Toggle underline",
                |editor, _args| {
                    toggle_bool_mark(
                        editor,
                        |m| m.underline,
                        |m, v| m.underline = v,
                        "marks.toggle_underline",
                    )
                },
            )
            .description("Toggle underline on the current selection or caret.")
            .keywords(["underline"]),
            CommandSpec::new(
                "marks.toggle_strikethrough",
                "Toggle strikethrough",
                |editor, _args| {
                    toggle_bool_mark(
                        editor,
                        |m| m.strikethrough,
                        |m, v| m.strikethrough = v,
                        "marks.toggle_strikethrough",
                    )
                },
            )
            .description("Toggle strikethrough on the current selection or caret.")
            .keywords(["strikethrough", "strike"]),
            CommandSpec::new("marks.toggle_code", "Toggle code", |editor, _args| {
                toggle_bool_mark(editor, |m| m.code, |m, v| m.code = v, "marks.toggle_code")
            })
            .description("Toggle the inline code mark on the current selection or caret.")
            .keywords(["code", "monospace"]),
            CommandSpec::new("marks.set_link", "Set link", |editor, args| {
                let url = string_arg(args.as_ref(), "url")
                    .ok_or_else(|| CommandError::new("missing args.url"))?;
                set_optional_mark(editor, move |m| m.link = Some(url.clone()), "marks.set_link")
            })
            .description("Set the link mark on the current selection or caret.")
            .keywords(["link", "url", "hyperlink"]),
            CommandSpec::new("marks.unset_link", "Unset link", |editor, _args| {
                // A no-op unless the selection actually touches a link.
                if !selection_has_link(editor) {
                    return Ok(false);
                }
                set_optional_mark(editor, |m| m.link = None, "marks.unset_link")
            })
            .description("Remove the link mark from the current selection or caret.")
            .keywords(["link", "unlink"]),
            CommandSpec::new("marks.set_color", "Set text color", |editor, args| {
                let color = string_arg(args.as_ref(), "color")
                    .ok_or_else(|| CommandError::new("missing args.color"))?;
                set_optional_mark(
                    editor,
                    move |m| m.color = Some(color.clone()),
                    "marks.set_color",
                )
            })
            .description("Set the text color mark (hex string).")
            .keywords(["color", "foreground"]),
            CommandSpec::new("marks.unset_color", "Unset text color", |editor, _args| {
                set_optional_mark(editor, |m| m.color = None, "marks.unset_color")
            })
            .description("Remove the text color mark.")
            .keywords(["color", "reset"]),
            CommandSpec::new("marks.set_highlight", "Set highlight", |editor, args| {
                let color = string_arg(args.as_ref(), "color")
                    .ok_or_else(|| CommandError::new("missing args.color"))?;
                set_optional_mark(
                    editor,
                    move |m| m.highlight = Some(color.clone()),
                    "marks.set_highlight",
                )
            })
            .description("Set the highlight mark (hex string).")
            .keywords(["highlight", "background"]),
            CommandSpec::new(
                "marks.unset_highlight",
                "Unset highlight",
                |editor, _args| {
                    set_optional_mark(editor, |m| m.highlight = None, "marks.unset_highlight")
                },
            )
            .description("Remove the highlight mark.")
            .keywords(["highlight", "reset"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("marks.active", |editor, _args| {
                serde_json::to_value(active_marks(editor)).map_err(|err| {
                    crate::extension::QueryError::new(format!("failed to encode marks: {err}"))
                })
            }),
            QuerySpec::new("marks.is_bold_active", |editor, _args| {
                Ok(Value::Bool(active_marks(editor).bold))
            }),
            QuerySpec::new("marks.is_italic_active", |editor, _args| {
                Ok(Value::Bool(active_marks(editor).italic))
            }),
            QuerySpec::new("marks.is_underline_active", |editor, _args| {
                Ok(Value::Bool(active_marks(editor).underline))
            }),
            QuerySpec::new("marks.has_link_active", |editor, _args| {
                Ok(Value::Bool(active_marks(editor).link.is_some()))
            }),
        ]
    }
}

fn active_marks(editor: &Editor) -> Marks {
    match editor.doc().node(&editor.selection().focus.path) {
        Some(Node::Text(t)) => t.marks.clone(),
        _ => Marks::default(),
    }
}

fn selection_has_link(editor: &Editor) -> bool {
    let sel = editor.selection();
    if sel.is_collapsed() {
        return active_marks(editor).link.is_some();
    }
    selected_text_marks(editor, sel)
        .iter()
        .any(|m| m.link.is_some())
}

/// Marks of every text leaf the selection touches.
fn selected_text_marks(editor: &Editor, sel: &Selection) -> Vec<Marks> {
    let mut out = Vec::new();
    let Some(range) = selected_block_range(editor, sel) else {
        return out;
    };

    for (block_index, block) in range.blocks.iter().enumerate() {
        let children = block.el.children.as_slice();
        let total = inline_text_len(children);
        let start_global = if block_index == 0 { range.start_global } else { 0 };
        let end_global = if block_index == range.blocks.len() - 1 {
            range.end_global
        } else {
            total
        };
        if start_global >= end_global {
            continue;
        }

        let mut cursor = 0usize;
        for node in children {
            let Node::Text(t) = node else {
                continue;
            };
            let node_start = cursor;
            let node_end = cursor + t.text.len();
            cursor = node_end;
            if end_global <= node_start || start_global >= node_end {
                continue;
            }
            out.push(t.marks.clone());
        }
    }
    out
}

struct BlockRange<'a> {
    blocks: Vec<super::support::TextBlock<'a>>,
    start_global: usize,
    end_global: usize,
}

fn selected_block_range<'a>(editor: &'a Editor, sel: &Selection) -> Option<BlockRange<'a>> {
    let (start, end) = sel.ordered();
    let (&start_ix, start_block_path) = start.path.split_last()?;
    let (&end_ix, end_block_path) = end.path.split_last()?;

    let blocks = text_blocks_in_order(editor.doc(), editor.registry());
    let start_index = blocks.iter().position(|b| b.path == start_block_path)?;
    let end_index = blocks.iter().position(|b| b.path == end_block_path)?;
    let (start_index, end_index) = if start_index <= end_index {
        (start_index, end_index)
    } else {
        (end_index, start_index)
    };

    let start_global = point_global_offset(&blocks[start_index].el.children, start_ix, start.offset);
    let end_global = point_global_offset(&blocks[end_index].el.children, end_ix, end.offset);

    Some(BlockRange {
        blocks: blocks
            .into_iter()
            .skip(start_index)
            .take(end_index - start_index + 1)
            .collect(),
        start_global,
        end_global,
    })
}

fn toggle_bool_mark(
    editor: &mut Editor,
    get: fn(&Marks) -> bool,
    set: fn(&mut Marks, bool),
    origin: &'static str,
) -> Result<bool, CommandError> {
    let sel = editor.selection().clone();
    if sel.is_collapsed() {
        let target = !get(&active_marks(editor));
        return apply_at_caret(
            editor,
            move |mut marks| {
                set(&mut marks, target);
                marks
            },
            origin,
        );
    }

    let all_set = selected_text_marks(editor, &sel).iter().all(get);
    let target = !all_set;
    apply_over_range(
        editor,
        &sel,
        &move |mut marks| {
            set(&mut marks, target);
            marks
        },
        origin,
    )
}

fn set_optional_mark(
    editor: &mut Editor,
    apply: impl Fn(&mut Marks) + Clone + 'static,
    origin: &'static str,
) -> Result<bool, CommandError> {
    let sel = editor.selection().clone();
    let mapper = move |mut marks: Marks| {
        apply(&mut marks);
        marks
    };
    if sel.is_collapsed() {
        apply_at_caret(editor, mapper, origin)
    } else {
        apply_over_range(editor, &sel, &mapper, origin)
    }
}

/// With a collapsed selection, split the caret's text leaf and park an empty
/// leaf carrying the new marks at the caret, so the next typed character
/// picks them up.
fn apply_at_caret(
    editor: &mut Editor,
    apply: impl Fn(Marks) -> Marks,
    origin: &'static str,
) -> Result<bool, CommandError> {
    let focus = editor.selection().focus.clone();
    let Some((&child_ix, block_path)) = focus.path.split_last() else {
        return Ok(false);
    };
    let Some(Node::Element(el)) = editor.doc().node(block_path) else {
        return Ok(false);
    };
    let Some(Node::Text(text)) = el.children.get(child_ix) else {
        return Ok(false);
    };

    let marks_before = text.marks.clone();
    let marks_after = apply(marks_before.clone());
    if marks_after == marks_before {
        return Ok(false);
    }

    if text.text.is_empty() {
        let tx = Transaction::new(vec![Step::SetMarks {
            path: focus.path.clone(),
            marks: marks_after,
        }])
        .selection_after(Selection::collapsed(Point::new(focus.path.clone(), 0)))
        .origin(origin);
        editor
            .apply(tx)
            .map_err(|e| CommandError::new(format!("failed to set caret marks: {e}")))?;
        return Ok(true);
    }

    let cursor = clamp_to_char_boundary(&text.text, focus.offset);
    let left = text.text[..cursor].to_string();
    let right = text.text[cursor..].to_string();

    let mut replacement: Vec<Node> = Vec::new();
    let mut caret_child_ix = child_ix;
    if !left.is_empty() {
        replacement.push(Node::text(left, marks_before.clone()));
        caret_child_ix += 1;
    }
    replacement.push(Node::text("", marks_after));
    if !right.is_empty() {
        replacement.push(Node::text(right, marks_before));
    }

    let mut steps = vec![Step::DeleteNode {
        path: focus.path.clone(),
    }];
    for (i, node) in replacement.into_iter().enumerate() {
        steps.push(Step::InsertNode {
            path: child_path(block_path, child_ix + i),
            node,
        });
    }

    let caret = Point::new(child_path(block_path, caret_child_ix), 0);
    let tx = Transaction::new(steps)
        .selection_after(Selection::collapsed(caret))
        .origin(origin);
    editor
        .apply(tx)
        .map_err(|e| CommandError::new(format!("failed to set caret marks: {e}")))?;
    Ok(true)
}

fn apply_over_range(
    editor: &mut Editor,
    sel: &Selection,
    apply: &dyn Fn(Marks) -> Marks,
    origin: &'static str,
) -> Result<bool, CommandError> {
    struct Rebuild {
        path: Vec<usize>,
        old_len: usize,
        children: Vec<Node>,
        start_global: usize,
        end_global: usize,
    }

    let mut rebuilds: Vec<Rebuild> = Vec::new();
    {
        let Some(range) = selected_block_range(editor, sel) else {
            return Ok(false);
        };
        let last = range.blocks.len() - 1;
        for (block_index, block) in range.blocks.iter().enumerate() {
            let children = block.el.children.as_slice();
            let total = inline_text_len(children);
            let start_global = if block_index == 0 { range.start_global } else { 0 };
            let end_global = if block_index == last { range.end_global } else { total };
            let rebuilt = apply_marks_in_run(children, start_global, end_global, apply);
            if rebuilt != children {
                rebuilds.push(Rebuild {
                    path: block.path.clone(),
                    old_len: children.len(),
                    children: rebuilt,
                    start_global,
                    end_global,
                });
            }
        }
    }

    if rebuilds.is_empty() {
        return Ok(false);
    }

    let mut steps = Vec::new();
    for rebuild in &rebuilds {
        steps.extend(replace_children_steps(
            &rebuild.path,
            rebuild.old_len,
            &rebuild.children,
        ));
    }

    // Pin the selection to the same byte range inside the rebuilt runs.
    let (first, last) = (&rebuilds[0], &rebuilds[rebuilds.len() - 1]);
    let anchor = point_for_global_offset(&first.path, &first.children, first.start_global);
    let focus = point_for_global_offset(&last.path, &last.children, last.end_global);
    let tx = Transaction::new(steps)
        .selection_after(Selection { anchor, focus })
        .origin(origin);
    editor
        .apply(tx)
        .map_err(|e| CommandError::new(format!("failed to apply marks: {e}")))?;
    Ok(true)
}
