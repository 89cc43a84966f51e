use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::model::{Attrs, Document, Node, NodePath, Marks, PathError, Selection, TextNode};

/// One primitive mutation of the document tree. Applying a step yields its
/// inverse, which is what the undo history stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    InsertText {
        #[serde(default)]
        path: NodePath,
        offset: usize,
        text: String,
    },
    DeleteText {
        #[serde(default)]
        path: NodePath,
        range: Range<usize>,
    },
    InsertNode {
        #[serde(default)]
        path: NodePath,
        node: Node,
    },
    DeleteNode {
        #[serde(default)]
        path: NodePath,
    },
    SetAttrs {
        #[serde(default)]
        path: NodePath,
        patch: AttrPatch,
    },
    SetMarks {
        #[serde(default)]
        path: NodePath,
        marks: Marks,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrPatch {
    #[serde(default)]
    pub set: Attrs,
    #[serde(default)]
    pub remove: Vec<String>,
}

impl AttrPatch {
    pub fn set_value(key: impl Into<String>, value: serde_json::Value) -> Self {
        let mut patch = AttrPatch::default();
        patch.set.insert(key.into(), value);
        patch
    }

    pub fn remove_key(key: impl Into<String>) -> Self {
        AttrPatch {
            set: Attrs::default(),
            remove: vec![key.into()],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty()
    }

    /// Apply to an attribute set, returning the patch that undoes it.
    pub fn apply(&self, attrs: &mut Attrs) -> AttrPatch {
        let mut undo_set = Attrs::default();
        let mut undo_remove = Vec::new();

        for (key, value) in &self.set {
            match attrs.insert(key.clone(), value.clone()) {
                Some(prev) => {
                    undo_set.insert(key.clone(), prev);
                }
                None => undo_remove.push(key.clone()),
            }
        }
        for key in &self.remove {
            if let Some(prev) = attrs.remove(key) {
                undo_set.insert(key.clone(), prev);
            }
        }

        AttrPatch {
            set: undo_set,
            remove: undo_remove,
        }
    }
}

/// One atomic, undoable change: an ordered batch of steps. The whole batch
/// occupies a single undo record no matter how many steps it carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_after: Option<Selection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl Transaction {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            selection_after: None,
            origin: None,
        }
    }

    pub fn selection_after(mut self, selection: Selection) -> Self {
        self.selection_after = Some(selection);
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Apply one step to the document, remapping the selection, and return the
/// inverse step.
pub(crate) fn apply_step(
    doc: &mut Document,
    selection: &mut Selection,
    step: Step,
) -> Result<Step, PathError> {
    match step {
        Step::InsertText { path, offset, text } => {
            let leaf = text_leaf_mut(doc, &path)?;
            let offset = clamp_to_char_boundary(&leaf.text, offset);
            leaf.text.insert_str(offset, &text);
            remap_after_insert_text(selection, &path, offset, text.len());
            Ok(Step::DeleteText {
                path,
                range: offset..offset + text.len(),
            })
        }
        Step::DeleteText { path, range } => {
            let leaf = text_leaf_mut(doc, &path)?;
            let start = clamp_to_char_boundary(&leaf.text, range.start.min(leaf.text.len()));
            let end = clamp_to_char_boundary(&leaf.text, range.end.min(leaf.text.len()));
            if start >= end {
                return Ok(Step::InsertText {
                    path,
                    offset: start,
                    text: String::new(),
                });
            }
            let removed = leaf.text[start..end].to_string();
            leaf.text.replace_range(start..end, "");
            remap_after_delete_text(selection, &path, start..end);
            Ok(Step::InsertText {
                path,
                offset: start,
                text: removed,
            })
        }
        Step::InsertNode { path, node } => {
            let (parent_path, ix) = split_leaf_index(&path)?;
            let children = doc.children_at_mut(parent_path)?;
            if ix > children.len() {
                return Err(PathError(format!(
                    "insert index {ix} out of bounds ({} children)",
                    children.len()
                )));
            }
            children.insert(ix, node);
            remap_after_insert_node(selection, &path);
            Ok(Step::DeleteNode { path })
        }
        Step::DeleteNode { path } => {
            let (parent_path, ix) = split_leaf_index(&path)?;
            let children = doc.children_at_mut(parent_path)?;
            if ix >= children.len() {
                return Err(PathError(format!(
                    "delete index {ix} out of bounds ({} children)",
                    children.len()
                )));
            }
            let removed = children.remove(ix);
            remap_after_delete_node(selection, &path);
            Ok(Step::InsertNode {
                path,
                node: removed,
            })
        }
        Step::SetAttrs { path, patch } => {
            let undo = match doc.node_mut(&path)? {
                Node::Element(el) => patch.apply(&mut el.attrs),
                Node::Atom(a) => patch.apply(&mut a.attrs),
                Node::Text(_) => return Err(PathError("text leaves have no attrs".into())),
            };
            Ok(Step::SetAttrs { path, patch: undo })
        }
        Step::SetMarks { path, marks } => {
            let leaf = text_leaf_mut(doc, &path)?;
            let old = std::mem::replace(&mut leaf.marks, marks);
            Ok(Step::SetMarks { path, marks: old })
        }
    }
}

fn text_leaf_mut<'a>(doc: &'a mut Document, path: &[usize]) -> Result<&'a mut TextNode, PathError> {
    match doc.node_mut(path)? {
        Node::Text(t) => Ok(t),
        _ => Err(PathError("expected a text leaf".into())),
    }
}

fn split_leaf_index(path: &[usize]) -> Result<(&[usize], usize), PathError> {
    match path.split_last() {
        Some((&ix, parent)) => Ok((parent, ix)),
        None => Err(PathError("empty path".into())),
    }
}

pub(crate) fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}

fn remap_after_insert_text(selection: &mut Selection, path: &[usize], offset: usize, len: usize) {
    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path == path && point.offset >= offset {
            point.offset = point.offset.saturating_add(len);
        }
    }
}

fn remap_after_delete_text(selection: &mut Selection, path: &[usize], range: Range<usize>) {
    let removed = range.end.saturating_sub(range.start);
    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path != path || point.offset <= range.start {
            continue;
        }
        if point.offset >= range.end {
            point.offset = point.offset.saturating_sub(removed);
        } else {
            point.offset = range.start;
        }
    }
}

fn remap_after_insert_node(selection: &mut Selection, path: &[usize]) {
    let Some((&ix, parent)) = path.split_last() else {
        return;
    };
    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path.len() <= parent.len() || !point.path.starts_with(parent) {
            continue;
        }
        if point.path[parent.len()] >= ix {
            point.path[parent.len()] += 1;
        }
    }
}

fn remap_after_delete_node(selection: &mut Selection, path: &[usize]) {
    let Some((&ix, parent)) = path.split_last() else {
        return;
    };
    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path.len() <= parent.len() || !point.path.starts_with(parent) {
            continue;
        }
        let at = point.path[parent.len()];
        if at > ix {
            point.path[parent.len()] -= 1;
        } else if at == ix {
            // The point sat inside the removed subtree; park it at the start
            // of the nearest preceding sibling. The editor clamps it to a
            // valid text position afterwards.
            point.path.truncate(parent.len() + 1);
            point.path[parent.len()] = ix.saturating_sub(1);
            point.offset = 0;
        }
    }
}
