use serde_json::Value;

use crate::editor::Editor;
use crate::extension::{
    CommandError, CommandSpec, ContentModel, Extension, ExtensionRegistry, NodeRole, NodeSpec,
    NormalizePass, QuerySpec,
};
use crate::model::{Attrs, Document, Node, NodePath};
use crate::step::{Step, Transaction};

use super::support::{caret_block_path, child_path, replace_node_steps};

/// Nesting depth limit for list items; indenting past it is a no-op.
pub const MAX_LIST_DEPTH: usize = 6;

/// Nested bullet and ordered lists: `bullet_list`/`ordered_list` hold
/// `list_item`s, each item holds blocks (a paragraph plus optional nested
/// lists).
pub struct ListsExtension;

impl Extension for ListsExtension {
    fn id(&self) -> &'static str {
        "lists"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec {
                kind: "bullet_list".to_string(),
                role: NodeRole::Block,
                atom: false,
                content: ContentModel::Blocks,
            },
            NodeSpec {
                kind: "ordered_list".to_string(),
                role: NodeRole::Block,
                atom: false,
                content: ContentModel::Blocks,
            },
            NodeSpec {
                kind: "list_item".to_string(),
                role: NodeRole::Block,
                atom: false,
                content: ContentModel::Blocks,
            },
        ]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeListStructure)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("list.toggle_bullet", "Toggle bullet list", |editor, _args| {
                let Some(tx) = toggle_list(editor, "bullet_list") else {
                    return Ok(false);
                };
                editor
                    .apply(tx)
                    .map_err(|e| CommandError::new(format!("failed to toggle bullet list: {e}")))?;
                Ok(true)
            })
            .description("Toggle the caret block into or out of a bullet list.")
            .keywords(["list", "bullet", "unordered"]),
            CommandSpec::new(
                "list.toggle_ordered",
                "Toggle ordered list",
                |editor, _args| {
                    let Some(tx) = toggle_list(editor, "ordered_list") else {
                        return Ok(false);
                    };
                    editor.apply(tx).map_err(|e| {
                        CommandError::new(format!("failed to toggle ordered list: {e}"))
                    })?;
                    Ok(true)
                },
            )
            .description("Toggle the caret block into or out of an ordered list.")
            .keywords(["list", "ordered", "numbered"]),
            CommandSpec::new("list.indent", "Indent list item", |editor, _args| {
                let Some(tx) = indent_item(editor) else {
                    return Ok(false);
                };
                editor
                    .apply(tx)
                    .map_err(|e| CommandError::new(format!("failed to indent item: {e}")))?;
                Ok(true)
            })
            .description("Nest the current list item under its previous sibling.")
            .keywords(["list", "indent", "nest"]),
            CommandSpec::new("list.outdent", "Outdent list item", |editor, _args| {
                let Some(tx) = outdent_item(editor) else {
                    return Ok(false);
                };
                editor
                    .apply(tx)
                    .map_err(|e| CommandError::new(format!("failed to outdent item: {e}")))?;
                Ok(true)
            })
            .description("Lift the current list item out of its nested list.")
            .keywords(["list", "outdent", "unnest"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("list.kind", |editor, _args| {
                let kind = enclosing_list_kind(editor);
                Ok(kind.map(Value::String).unwrap_or(Value::Null))
            }),
            QuerySpec::new("list.depth", |editor, _args| {
                let depth = item_depth(editor.doc(), &editor.selection().focus.path);
                Ok(Value::from(depth as u64))
            }),
        ]
    }
}

fn enclosing_list_kind(editor: &Editor) -> Option<String> {
    let doc = editor.doc();
    let path = &editor.selection().focus.path;
    let item = doc.ancestor_of_kind(path, "list_item")?;
    let (_, list_path) = item.split_last()?;
    doc.node(list_path)?.kind().map(|k| k.to_string())
}

/// Number of `list_item` ancestors along `path` (the item containing the
/// caret counts as depth 1).
fn item_depth(doc: &Document, path: &[usize]) -> usize {
    let mut depth = 0;
    for len in 1..=path.len() {
        if doc.node(&path[..len]).and_then(|n| n.kind()) == Some("list_item") {
            depth += 1;
        }
    }
    depth
}

fn toggle_list(editor: &Editor, list_kind: &str) -> Option<Transaction> {
    let doc = editor.doc();
    let focus_path = editor.selection().focus.path.clone();

    if let Some(item_path) = doc.ancestor_of_kind(&focus_path, "list_item") {
        let (_, list_path) = item_path.split_last()?;
        let list = doc.node(list_path)?.as_element()?.clone();

        if list.kind == list_kind {
            // Unwrap the whole list: each item's blocks rejoin the flow at
            // the list's position.
            let mut blocks: Vec<Node> = Vec::new();
            for item in &list.children {
                match item {
                    Node::Element(el) if el.kind == "list_item" => {
                        blocks.extend(el.children.iter().cloned());
                    }
                    other => blocks.push(other.clone()),
                }
            }
            let mut steps = vec![Step::DeleteNode {
                path: list_path.to_vec(),
            }];
            let (&list_ix, parent) = list_path.split_last()?;
            for (ix, block) in blocks.into_iter().enumerate() {
                steps.push(Step::InsertNode {
                    path: child_path(parent, list_ix + ix),
                    node: block,
                });
            }
            return Some(Transaction::new(steps).origin("command:list.toggle"));
        }

        // Switch list kind in place, structure untouched.
        let renamed = Node::element(list_kind, list.attrs.clone(), list.children.clone());
        return Some(
            Transaction::new(replace_node_steps(list_path, renamed))
                .selection_after(editor.selection().clone())
                .origin("command:list.toggle"),
        );
    }

    // Wrap the caret block into a fresh single-item list.
    let block_path = caret_block_path(editor)?;
    let block = doc.node(&block_path)?.clone();
    block.as_element()?;

    let selection_after = {
        // Two levels of nesting appear above the block: list > item.
        let mut focus = editor.selection().focus.clone();
        focus.path.insert(block_path.len(), 0);
        focus.path.insert(block_path.len(), 0);
        crate::model::Selection::collapsed(focus)
    };

    let item = Node::element("list_item", Attrs::default(), vec![block]);
    let list = Node::element(list_kind, Attrs::default(), vec![item]);
    Some(
        Transaction::new(replace_node_steps(&block_path, list))
            .selection_after(selection_after)
            .origin("command:list.toggle"),
    )
}

fn indent_item(editor: &Editor) -> Option<Transaction> {
    let doc = editor.doc();
    let focus_path = editor.selection().focus.path.clone();
    let item_path = doc.ancestor_of_kind(&focus_path, "list_item")?;

    if item_depth(doc, &focus_path) >= MAX_LIST_DEPTH {
        return None;
    }

    let (&item_ix, list_path) = item_path.split_last()?;
    if item_ix == 0 {
        // Nothing to nest under.
        return None;
    }
    let list_kind = doc.node(list_path)?.kind()?.to_string();

    let prev_item_path = child_path(list_path, item_ix - 1);
    let prev_item = doc.node(&prev_item_path)?.as_element()?.clone();
    if prev_item.kind != "list_item" {
        return None;
    }
    let item = doc.node(&item_path)?.clone();

    let mut steps = vec![Step::DeleteNode {
        path: item_path.clone(),
    }];

    // Append to the previous sibling's trailing nested list, creating one
    // when it is missing.
    let item_lands_at = match prev_item.children.last() {
        Some(Node::Element(last)) if last.kind == list_kind => {
            let nested_list_ix = prev_item.children.len() - 1;
            let mut target = child_path(&prev_item_path, nested_list_ix);
            target.push(last.children.len());
            steps.push(Step::InsertNode {
                path: target.clone(),
                node: item,
            });
            target
        }
        _ => {
            let nested = Node::element(&list_kind, Attrs::default(), vec![item]);
            let nested_path = child_path(&prev_item_path, prev_item.children.len());
            steps.push(Step::InsertNode {
                path: nested_path.clone(),
                node: nested,
            });
            child_path(&nested_path, 0)
        }
    };

    let selection_after = caret_following_item(editor, &item_path, &item_lands_at);
    Some(
        Transaction::new(steps)
            .selection_after(selection_after)
            .origin("command:list.indent"),
    )
}

/// Keep the caret inside a moved list item: splice its item-relative tail
/// onto the item's landing path.
fn caret_following_item(
    editor: &Editor,
    item_path: &[usize],
    item_lands_at: &[usize],
) -> crate::model::Selection {
    let focus = &editor.selection().focus;
    let mut path = item_lands_at.to_vec();
    path.extend_from_slice(&focus.path[item_path.len()..]);
    crate::model::Selection::collapsed(crate::model::Point::new(path, focus.offset))
}

fn outdent_item(editor: &Editor) -> Option<Transaction> {
    let doc = editor.doc();
    let focus_path = editor.selection().focus.path.clone();
    let item_path = doc.ancestor_of_kind(&focus_path, "list_item")?;

    let (_, list_path) = item_path.split_last()?;
    // The enclosing list must itself sit inside an outer list item.
    let (_, parent_item_path) = list_path.split_last()?;
    let parent_item = doc.node(parent_item_path)?;
    if parent_item.kind() != Some("list_item") {
        return None;
    }
    let (&parent_item_ix, outer_list_path) = parent_item_path.split_last()?;

    let item = doc.node(&item_path)?.clone();
    let list = doc.node(list_path)?.as_element()?.clone();

    let mut steps = vec![Step::DeleteNode {
        path: item_path.clone(),
    }];
    if list.children.len() == 1 {
        // The nested list becomes empty; drop it too.
        steps.push(Step::DeleteNode {
            path: list_path.to_vec(),
        });
    }
    let item_lands_at = child_path(outer_list_path, parent_item_ix + 1);
    steps.push(Step::InsertNode {
        path: item_lands_at.clone(),
        node: item,
    });

    let selection_after = caret_following_item(editor, &item_path, &item_lands_at);
    Some(
        Transaction::new(steps)
            .selection_after(selection_after)
            .origin("command:list.outdent"),
    )
}

/// Lists keep a minimal legal shape: no empty lists, no empty items, items
/// only inside lists.
struct NormalizeListStructure;

impl NormalizePass for NormalizeListStructure {
    fn id(&self) -> &'static str {
        "lists.normalize_structure"
    }

    fn run(&self, doc: &Document, _registry: &ExtensionRegistry) -> Vec<Step> {
        // One repair per run; sibling deletions would invalidate each
        // other's paths, so the fixpoint loop does the iteration instead.
        fn walk(children: &[Node], path: &mut NodePath) -> Option<Step> {
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                path.push(ix);

                let fix = match el.kind.as_str() {
                    "bullet_list" | "ordered_list" if el.children.is_empty() => {
                        Some(Step::DeleteNode { path: path.clone() })
                    }
                    "list_item" if el.children.is_empty() => Some(Step::InsertNode {
                        path: child_path(path, 0),
                        node: Node::paragraph(""),
                    }),
                    _ => walk(&el.children, path),
                };
                if fix.is_some() {
                    path.pop();
                    return fix;
                }
                path.pop();
            }
            None
        }

        walk(&doc.children, &mut Vec::new())
            .into_iter()
            .collect()
    }
}
