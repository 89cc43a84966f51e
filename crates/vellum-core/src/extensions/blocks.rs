use serde_json::Value;

use crate::editor::Editor;
use crate::extension::{
    CommandError, CommandSpec, ContentModel, Extension, ExtensionRegistry, NodeRole, NodeSpec,
    NormalizePass, QuerySpec,
};
use crate::model::{Attrs, Document, ElementNode, Marks, Node, Selection};
use crate::step::{AttrPatch, Step, Transaction};

use super::support::{
    caret_block_path, child_path, path_arg, replace_node_steps, string_arg, u64_arg,
};

/// Paragraphs, headings, blockquotes, code blocks, dividers, and the
/// structural normalize passes every document relies on.
pub struct BlocksExtension;

impl Extension for BlocksExtension {
    fn id(&self) -> &'static str {
        "blocks"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec {
                kind: "paragraph".to_string(),
                role: NodeRole::Block,
                atom: false,
                content: ContentModel::Inline,
            },
            NodeSpec {
                kind: "heading".to_string(),
                role: NodeRole::Block,
                atom: false,
                content: ContentModel::Inline,
            },
            NodeSpec {
                kind: "blockquote".to_string(),
                role: NodeRole::Block,
                atom: false,
                content: ContentModel::Blocks,
            },
            NodeSpec {
                kind: "code_block".to_string(),
                role: NodeRole::Block,
                atom: false,
                content: ContentModel::Inline,
            },
            NodeSpec {
                kind: "divider".to_string(),
                role: NodeRole::Block,
                atom: true,
                content: ContentModel::None,
            },
        ]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![
            Box::new(EnsureNonEmptyDocument),
            Box::new(EnsureInlineBlocksHaveTextLeaf),
            Box::new(MergeAdjacentTextLeaves),
            Box::new(ClampHeadingLevels),
            Box::new(EnsureTrailingParagraph),
        ]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("block.toggle_heading", "Toggle heading", |editor, args| {
                let level = u64_arg(args.as_ref(), "level").unwrap_or(1).clamp(1, 6);
                let Some(tx) = toggle_heading(editor, level) else {
                    return Ok(false);
                };
                editor
                    .apply(tx)
                    .map_err(|e| CommandError::new(format!("failed to toggle heading: {e}")))?;
                Ok(true)
            })
            .description("Toggle the caret block between a heading level and a paragraph.")
            .keywords(["heading", "title", "h1", "h2", "h3", "paragraph"]),
            CommandSpec::new("block.set_paragraph", "Set paragraph", |editor, _args| {
                let Some(tx) = set_paragraph(editor) else {
                    return Ok(false);
                };
                editor
                    .apply(tx)
                    .map_err(|e| CommandError::new(format!("failed to set paragraph: {e}")))?;
                Ok(true)
            })
            .description("Convert the caret block back to a normal paragraph.")
            .keywords(["paragraph", "normal", "text"]),
            CommandSpec::new(
                "block.toggle_blockquote",
                "Toggle blockquote",
                |editor, _args| {
                    let Some(tx) = toggle_blockquote(editor) else {
                        return Ok(false);
                    };
                    editor.apply(tx).map_err(|e| {
                        CommandError::new(format!("failed to toggle blockquote: {e}"))
                    })?;
                    Ok(true)
                },
            )
            .description("Wrap the caret block in a blockquote, or unwrap the enclosing one.")
            .keywords(["blockquote", "quote"]),
            CommandSpec::new(
                "block.toggle_code_block",
                "Toggle code block",
                |editor, args| {
                    let language = string_arg(args.as_ref(), "language");
                    let Some(tx) = toggle_code_block(editor, language) else {
                        return Ok(false);
                    };
                    editor.apply(tx).map_err(|e| {
                        CommandError::new(format!("failed to toggle code block: {e}"))
                    })?;
                    Ok(true)
                },
            )
            .description("Toggle the caret block between a code block and a paragraph.")
            .keywords(["code", "pre", "monospace"]),
            CommandSpec::new("block.insert_divider", "Insert divider", |editor, _args| {
                let tx = insert_divider(editor);
                editor
                    .apply(tx)
                    .map_err(|e| CommandError::new(format!("failed to insert divider: {e}")))?;
                Ok(true)
            })
            .description("Insert a horizontal rule after the caret block.")
            .keywords(["divider", "rule", "hr", "separator"]),
            CommandSpec::new("node.set_attrs", "Set node attributes", |editor, args| {
                let path = path_arg(args.as_ref(), "path")
                    .ok_or_else(|| CommandError::new("missing args.path"))?;
                let patch = attr_patch_from_args(args.as_ref());
                if patch.is_empty() {
                    return Ok(false);
                }
                if editor.doc().node(&path).is_none() {
                    return Ok(false);
                }
                let selection = editor.selection().clone();
                editor
                    .apply(
                        Transaction::new(vec![Step::SetAttrs { path, patch }])
                            .selection_after(selection)
                            .origin("command:node.set_attrs"),
                    )
                    .map_err(|e| CommandError::new(format!("failed to set attrs: {e}")))?;
                Ok(true)
            })
            .description("Patch the attribute set of the node at a path.")
            .keywords(["attributes", "attrs", "update"]),
            CommandSpec::new("history.undo", "Undo", |editor, _args| Ok(editor.undo()))
                .description("Revert the most recent transaction.")
                .keywords(["undo", "history"]),
            CommandSpec::new("history.redo", "Redo", |editor, _args| Ok(editor.redo()))
                .description("Re-apply the most recently undone transaction.")
                .keywords(["redo", "history"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("block.heading_level", |editor, _args| {
                Ok(active_heading_level(editor))
            }),
            QuerySpec::new("block.kind", |editor, _args| {
                let kind = caret_block_path(editor)
                    .and_then(|p| editor.doc().node(&p).cloned())
                    .and_then(|n| n.kind().map(|k| k.to_string()));
                Ok(kind.map(Value::String).unwrap_or(Value::Null))
            }),
            QuerySpec::new("block.is_blockquote", |editor, _args| {
                let active = editor
                    .doc()
                    .ancestor_of_kind(&editor.selection().focus.path, "blockquote")
                    .is_some();
                Ok(Value::Bool(active))
            }),
            QuerySpec::new("block.is_code_block", |editor, _args| {
                let active = caret_block(editor).is_some_and(|el| el.kind == "code_block");
                Ok(Value::Bool(active))
            }),
            QuerySpec::new("history.can_undo", |editor, _args| {
                Ok(Value::Bool(editor.can_undo()))
            }),
            QuerySpec::new("history.can_redo", |editor, _args| {
                Ok(Value::Bool(editor.can_redo()))
            }),
        ]
    }
}

fn attr_patch_from_args(args: Option<&Value>) -> AttrPatch {
    let mut patch = AttrPatch::default();
    if let Some(set) = args.and_then(|v| v.get("set")).and_then(|v| v.as_object()) {
        for (key, value) in set {
            patch.set.insert(key.clone(), value.clone());
        }
    }
    if let Some(remove) = args.and_then(|v| v.get("remove")).and_then(|v| v.as_array()) {
        for key in remove {
            if let Some(key) = key.as_str() {
                patch.remove.push(key.to_string());
            }
        }
    }
    patch
}

fn caret_block(editor: &Editor) -> Option<&ElementNode> {
    let path = caret_block_path(editor)?;
    editor.doc().node(&path)?.as_element()
}

fn active_heading_level(editor: &Editor) -> Value {
    match caret_block(editor) {
        Some(el) if el.kind == "heading" => el
            .attrs
            .get("level")
            .and_then(|v| v.as_u64())
            .map(|v| Value::Number(serde_json::Number::from(v)))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Heading selection is a toggle: picking the level the block already has
/// reverts it to a paragraph.
fn toggle_heading(editor: &Editor, level: u64) -> Option<Transaction> {
    let block_path = caret_block_path(editor)?;
    let el = editor.doc().node(&block_path)?.as_element()?.clone();
    if !matches!(el.kind.as_str(), "paragraph" | "heading") {
        return None;
    }
    let selection_after = editor.selection().clone();

    let current = (el.kind == "heading")
        .then(|| el.attrs.get("level").and_then(|v| v.as_u64()))
        .flatten()
        .unwrap_or(1);

    let next = if el.kind == "heading" && current == level {
        let mut attrs = el.attrs;
        attrs.remove("level");
        Node::Element(ElementNode {
            kind: "paragraph".to_string(),
            attrs,
            children: el.children,
        })
    } else {
        let mut attrs = el.attrs;
        attrs.insert("level".to_string(), Value::from(level));
        Node::Element(ElementNode {
            kind: "heading".to_string(),
            attrs,
            children: el.children,
        })
    };

    Some(
        Transaction::new(replace_node_steps(&block_path, next))
            .selection_after(selection_after)
            .origin("command:block.toggle_heading"),
    )
}

fn set_paragraph(editor: &Editor) -> Option<Transaction> {
    let block_path = caret_block_path(editor)?;
    let el = editor.doc().node(&block_path)?.as_element()?.clone();
    if el.kind == "paragraph" {
        return None;
    }
    if !matches!(el.kind.as_str(), "heading" | "code_block") {
        return None;
    }
    let selection_after = editor.selection().clone();

    let mut attrs = el.attrs;
    attrs.remove("level");
    attrs.remove("language");
    let next = Node::Element(ElementNode {
        kind: "paragraph".to_string(),
        attrs,
        children: el.children,
    });

    Some(
        Transaction::new(replace_node_steps(&block_path, next))
            .selection_after(selection_after)
            .origin("command:block.set_paragraph"),
    )
}

fn toggle_blockquote(editor: &Editor) -> Option<Transaction> {
    let doc = editor.doc();
    let focus_path = editor.selection().focus.path.clone();

    if let Some(quote_path) = doc.ancestor_of_kind(&focus_path, "blockquote") {
        // Unwrap: lift the quote's children into its place.
        let quote = doc.node(&quote_path)?.as_element()?.clone();
        let mut steps = vec![Step::DeleteNode {
            path: quote_path.clone(),
        }];
        let (&quote_ix, parent) = quote_path.split_last()?;
        for (ix, child) in quote.children.into_iter().enumerate() {
            steps.push(Step::InsertNode {
                path: child_path(parent, quote_ix + ix),
                node: child,
            });
        }
        return Some(Transaction::new(steps).origin("command:block.toggle_blockquote"));
    }

    let block_path = caret_block_path(editor)?;
    let block = doc.node(&block_path)?.clone();
    if block.as_element().is_none() {
        return None;
    }
    let selection_after = {
        // The block gains one level of nesting inside the quote.
        let mut focus = editor.selection().focus.clone();
        focus.path.insert(block_path.len(), 0);
        Selection::collapsed(focus)
    };

    let quote = Node::element("blockquote", Attrs::default(), vec![block]);
    Some(
        Transaction::new(replace_node_steps(&block_path, quote))
            .selection_after(selection_after)
            .origin("command:block.toggle_blockquote"),
    )
}

fn toggle_code_block(editor: &Editor, language: Option<String>) -> Option<Transaction> {
    let block_path = caret_block_path(editor)?;
    let el = editor.doc().node(&block_path)?.as_element()?.clone();
    let selection_after = editor.selection().clone();

    let next = if el.kind == "code_block" {
        let mut attrs = el.attrs;
        attrs.remove("language");
        Node::Element(ElementNode {
            kind: "paragraph".to_string(),
            attrs,
            children: el.children,
        })
    } else {
        if !matches!(el.kind.as_str(), "paragraph" | "heading") {
            return None;
        }
        // Code blocks hold plain text; flatten the inline run and drop marks.
        let mut text = String::new();
        for child in &el.children {
            if let Node::Text(t) = child {
                text.push_str(&t.text);
            }
        }
        let mut attrs = Attrs::default();
        if let Some(language) = language {
            attrs.insert("language".to_string(), Value::String(language));
        }
        Node::element(
            "code_block",
            attrs,
            vec![Node::text(text, Marks::default())],
        )
    };

    Some(
        Transaction::new(replace_node_steps(&block_path, next))
            .selection_after(selection_after)
            .origin("command:block.toggle_code_block"),
    )
}

fn insert_divider(editor: &Editor) -> Transaction {
    let (parent, insert_at) = super::support::block_insert_position(editor);
    let divider_path = child_path(&parent, insert_at);
    let paragraph_path = child_path(&parent, insert_at + 1);
    let caret = child_path(&paragraph_path, 0);

    Transaction::new(vec![
        Step::InsertNode {
            path: divider_path,
            node: Node::divider(),
        },
        Step::InsertNode {
            path: paragraph_path,
            node: Node::paragraph(""),
        },
    ])
    .selection_after(Selection::collapsed(crate::model::Point::new(caret, 0)))
    .origin("command:block.insert_divider")
}

struct EnsureNonEmptyDocument;

impl NormalizePass for EnsureNonEmptyDocument {
    fn id(&self) -> &'static str {
        "blocks.ensure_non_empty_document"
    }

    fn run(&self, doc: &Document, _registry: &ExtensionRegistry) -> Vec<Step> {
        if doc.children.is_empty() {
            return vec![Step::InsertNode {
                path: vec![0],
                node: Node::paragraph(""),
            }];
        }
        Vec::new()
    }
}

/// There is always a typing position after the final block node: if the last
/// top-level node is not a paragraph, append an empty one.
struct EnsureTrailingParagraph;

impl NormalizePass for EnsureTrailingParagraph {
    fn id(&self) -> &'static str {
        "blocks.ensure_trailing_paragraph"
    }

    fn run(&self, doc: &Document, _registry: &ExtensionRegistry) -> Vec<Step> {
        let Some(last) = doc.children.last() else {
            return Vec::new();
        };
        if last.kind() == Some("paragraph") {
            return Vec::new();
        }
        vec![Step::InsertNode {
            path: vec![doc.children.len()],
            node: Node::paragraph(""),
        }]
    }
}

struct EnsureInlineBlocksHaveTextLeaf;

impl NormalizePass for EnsureInlineBlocksHaveTextLeaf {
    fn id(&self) -> &'static str {
        "blocks.ensure_inline_blocks_have_text_leaf"
    }

    fn run(&self, doc: &Document, registry: &ExtensionRegistry) -> Vec<Step> {
        let mut steps = Vec::new();

        fn walk(
            children: &[Node],
            path: &mut Vec<usize>,
            registry: &ExtensionRegistry,
            steps: &mut Vec<Step>,
        ) {
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                path.push(ix);
                if matches!(registry.content_model(&el.kind), ContentModel::Inline) {
                    if !el.children.iter().any(|n| matches!(n, Node::Text(_))) {
                        steps.push(Step::InsertNode {
                            path: child_path(path, 0),
                            node: Node::text("", Marks::default()),
                        });
                    }
                } else {
                    walk(&el.children, path, registry, steps);
                }
                path.pop();
            }
        }

        walk(&doc.children, &mut Vec::new(), registry, &mut steps);
        steps
    }
}

struct MergeAdjacentTextLeaves;

impl NormalizePass for MergeAdjacentTextLeaves {
    fn id(&self) -> &'static str {
        "blocks.merge_adjacent_text_leaves"
    }

    fn run(&self, doc: &Document, registry: &ExtensionRegistry) -> Vec<Step> {
        let mut steps = Vec::new();

        fn walk(
            children: &[Node],
            path: &mut Vec<usize>,
            registry: &ExtensionRegistry,
            steps: &mut Vec<Step>,
        ) {
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                path.push(ix);
                if matches!(registry.content_model(&el.kind), ContentModel::Inline) {
                    merge_run(el, path, steps);
                } else {
                    walk(&el.children, path, registry, steps);
                }
                path.pop();
            }
        }

        fn merge_run(el: &ElementNode, path: &[usize], steps: &mut Vec<Step>) {
            let mut ix = el.children.len();
            while ix > 1 {
                ix -= 1;
                let Some(Node::Text(right)) = el.children.get(ix) else {
                    continue;
                };
                let Some(Node::Text(left)) = el.children.get(ix - 1) else {
                    continue;
                };
                if left.marks != right.marks {
                    continue;
                }
                if !right.text.is_empty() {
                    steps.push(Step::InsertText {
                        path: child_path(path, ix - 1),
                        offset: left.text.len(),
                        text: right.text.clone(),
                    });
                }
                steps.push(Step::DeleteNode {
                    path: child_path(path, ix),
                });
                // One merge per run per pass; the fixpoint loop handles the rest.
                return;
            }
        }

        walk(&doc.children, &mut Vec::new(), registry, &mut steps);
        steps
    }
}

struct ClampHeadingLevels;

impl NormalizePass for ClampHeadingLevels {
    fn id(&self) -> &'static str {
        "blocks.clamp_heading_levels"
    }

    fn run(&self, doc: &Document, registry: &ExtensionRegistry) -> Vec<Step> {
        let mut steps = Vec::new();

        fn walk(
            children: &[Node],
            path: &mut Vec<usize>,
            registry: &ExtensionRegistry,
            steps: &mut Vec<Step>,
        ) {
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                path.push(ix);
                if el.kind == "heading" {
                    let level = el
                        .attrs
                        .get("level")
                        .and_then(|v| v.as_u64())
                        .unwrap_or(1)
                        .clamp(1, 6);
                    if el.attrs.get("level").and_then(|v| v.as_u64()) != Some(level) {
                        steps.push(Step::SetAttrs {
                            path: path.clone(),
                            patch: AttrPatch::set_value("level", Value::from(level)),
                        });
                    }
                }
                if !matches!(registry.content_model(&el.kind), ContentModel::Inline) {
                    walk(&el.children, path, registry, steps);
                }
                path.pop();
            }
        }

        walk(&doc.children, &mut Vec::new(), registry, &mut steps);
        steps
    }
}
