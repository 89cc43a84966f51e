use serde_json::Value;

use crate::editor::Editor;
use crate::extension::{ContentModel, ExtensionRegistry};
use crate::model::{Document, ElementNode, Marks, Node, NodePath, Point, TextNode};
use crate::step::{Step, clamp_to_char_boundary};

/// Path of the block containing the caret (focus path minus the leaf index).
pub(crate) fn caret_block_path(editor: &Editor) -> Option<NodePath> {
    let focus = &editor.selection().focus;
    let (_, block) = focus.path.split_last()?;
    if block.is_empty() {
        return None;
    }
    Some(block.to_vec())
}

/// Where a new top-level-ish block should land: directly after the caret's
/// block, or at the end of the document when there is no caret block.
pub(crate) fn block_insert_position(editor: &Editor) -> (NodePath, usize) {
    match caret_block_path(editor) {
        Some(block_path) => {
            let (&block_ix, parent) = block_path.split_last().expect("non-empty block path");
            (parent.to_vec(), block_ix + 1)
        }
        None => (Vec::new(), editor.doc().children.len()),
    }
}

pub(crate) fn child_path(parent: &[usize], ix: usize) -> NodePath {
    let mut path = parent.to_vec();
    path.push(ix);
    path
}

/// Replace the node at `path` in place.
pub(crate) fn replace_node_steps(path: &[usize], node: Node) -> Vec<Step> {
    vec![
        Step::DeleteNode {
            path: path.to_vec(),
        },
        Step::InsertNode {
            path: path.to_vec(),
            node,
        },
    ]
}

pub(crate) struct TextBlock<'a> {
    pub(crate) path: NodePath,
    pub(crate) el: &'a ElementNode,
}

pub(crate) fn element_is_text_block(el: &ElementNode, registry: &ExtensionRegistry) -> bool {
    matches!(registry.content_model(&el.kind), ContentModel::Inline)
}

pub(crate) fn text_blocks_in_order<'a>(
    doc: &'a Document,
    registry: &ExtensionRegistry,
) -> Vec<TextBlock<'a>> {
    fn walk<'a>(
        nodes: &'a [Node],
        path: &mut Vec<usize>,
        registry: &ExtensionRegistry,
        out: &mut Vec<TextBlock<'a>>,
    ) {
        for (ix, node) in nodes.iter().enumerate() {
            let Node::Element(el) = node else {
                continue;
            };
            path.push(ix);
            if element_is_text_block(el, registry) {
                out.push(TextBlock {
                    path: path.clone(),
                    el,
                });
            } else {
                walk(&el.children, path, registry, out);
            }
            path.pop();
        }
    }

    let mut out = Vec::new();
    walk(&doc.children, &mut Vec::new(), registry, &mut out);
    out
}

pub(crate) fn inline_text_len(children: &[Node]) -> usize {
    children
        .iter()
        .map(|n| match n {
            Node::Text(t) => t.text.len(),
            _ => 0,
        })
        .sum()
}

/// Byte offset of an inline point from the start of its block.
pub(crate) fn point_global_offset(children: &[Node], child_ix: usize, offset: usize) -> usize {
    let mut global = 0usize;
    for node in children.iter().take(child_ix) {
        if let Node::Text(t) = node {
            global += t.text.len();
        }
    }
    global + offset
}

/// Inline point of a block-relative byte offset.
pub(crate) fn point_for_global_offset(
    block_path: &[usize],
    children: &[Node],
    global_offset: usize,
) -> Point {
    let mut cursor = 0usize;
    let mut last_text: Option<(usize, usize)> = None;

    for (ix, node) in children.iter().enumerate() {
        let Node::Text(t) = node else {
            continue;
        };
        let end = cursor + t.text.len();
        if global_offset <= end {
            let local = clamp_to_char_boundary(&t.text, global_offset.saturating_sub(cursor));
            return Point::new(child_path(block_path, ix), local);
        }
        last_text = Some((ix, t.text.len()));
        cursor = end;
    }

    match last_text {
        Some((ix, len)) => Point::new(child_path(block_path, ix), len),
        None => Point::new(child_path(block_path, 0), 0),
    }
}

/// Rebuild a block's inline run with `apply` mapped over the marked range,
/// splitting text leaves at the range boundaries.
pub(crate) fn apply_marks_in_run(
    children: &[Node],
    start_global: usize,
    end_global: usize,
    apply: &dyn Fn(Marks) -> Marks,
) -> Vec<Node> {
    if start_global >= end_global {
        return children.to_vec();
    }

    let mut out: Vec<Node> = Vec::new();
    let mut cursor = 0usize;

    for node in children {
        let Node::Text(t) = node else {
            out.push(node.clone());
            continue;
        };
        let node_start = cursor;
        let node_end = cursor + t.text.len();
        cursor = node_end;

        if end_global <= node_start || start_global >= node_end {
            out.push(node.clone());
            continue;
        }

        let sel_start = clamp_to_char_boundary(&t.text, start_global.saturating_sub(node_start));
        let sel_end = clamp_to_char_boundary(
            &t.text,
            end_global.saturating_sub(node_start).min(t.text.len()),
        );

        if sel_start == 0 && sel_end == t.text.len() {
            let mut next = t.clone();
            next.marks = apply(next.marks);
            out.push(Node::Text(next));
            continue;
        }

        let prefix = &t.text[..sel_start];
        let middle = &t.text[sel_start..sel_end];
        let suffix = &t.text[sel_end..];

        if !prefix.is_empty() {
            out.push(Node::text(prefix, t.marks.clone()));
        }
        if !middle.is_empty() {
            out.push(Node::Text(TextNode {
                text: middle.to_string(),
                marks: apply(t.marks.clone()),
            }));
        }
        if !suffix.is_empty() {
            out.push(Node::text(suffix, t.marks.clone()));
        }
    }

    if out.is_empty() {
        out.push(Node::text("", Marks::default()));
    }

    out
}

/// Steps that swap a block's children for a rebuilt run.
pub(crate) fn replace_children_steps(
    block_path: &[usize],
    old_len: usize,
    new_children: &[Node],
) -> Vec<Step> {
    let mut steps = Vec::new();
    for ix in (0..old_len).rev() {
        steps.push(Step::DeleteNode {
            path: child_path(block_path, ix),
        });
    }
    for (ix, node) in new_children.iter().enumerate() {
        steps.push(Step::InsertNode {
            path: child_path(block_path, ix),
            node: node.clone(),
        });
    }
    steps
}

pub(crate) fn string_arg(args: Option<&Value>, key: &str) -> Option<String> {
    args?
        .get(key)?
        .as_str()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

pub(crate) fn u64_arg(args: Option<&Value>, key: &str) -> Option<u64> {
    args?.get(key)?.as_u64()
}

pub(crate) fn bool_arg(args: Option<&Value>, key: &str) -> Option<bool> {
    args?.get(key)?.as_bool()
}

pub(crate) fn path_arg(args: Option<&Value>, key: &str) -> Option<NodePath> {
    let values = args?.get(key)?.as_array()?;
    values
        .iter()
        .map(|v| v.as_u64().map(|n| n as usize))
        .collect()
}
