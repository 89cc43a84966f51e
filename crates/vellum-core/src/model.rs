use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Schema-defined attributes of an element or atom node.
pub type Attrs = BTreeMap<String, serde_json::Value>;

/// Registered node kind, e.g. `"paragraph"` or `"table_cell"`.
pub type NodeKind = String;

/// Child indices from the document root down to a node.
pub type NodePath = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
    /// Atom nodes carry no editable content; they are fully described by
    /// their attributes.
    Atom(AtomNode),
}

impl Node {
    pub fn element(kind: impl Into<NodeKind>, attrs: Attrs, children: Vec<Node>) -> Self {
        Node::Element(ElementNode {
            kind: kind.into(),
            attrs,
            children,
        })
    }

    pub fn atom(kind: impl Into<NodeKind>, attrs: Attrs) -> Self {
        Node::Atom(AtomNode {
            kind: kind.into(),
            attrs,
        })
    }

    pub fn text(text: impl Into<String>, marks: Marks) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            marks,
        })
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::element(
            "paragraph",
            Attrs::default(),
            vec![Node::text(text, Marks::default())],
        )
    }

    pub fn divider() -> Self {
        Node::atom("divider", Attrs::default())
    }

    /// The node kind, `None` for text leaves.
    pub fn kind(&self) -> Option<&str> {
        match self {
            Node::Element(el) => Some(&el.kind),
            Node::Atom(a) => Some(&a.kind),
            Node::Text(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn attrs(&self) -> Option<&Attrs> {
        match self {
            Node::Element(el) => Some(&el.attrs),
            Node::Atom(a) => Some(&a.attrs),
            Node::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: NodeKind,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomNode {
    pub kind: NodeKind,
    #[serde(default)]
    pub attrs: Attrs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default)]
    pub marks: Marks,
}

/// Formatting annotations attached to an inline text run. Marks may overlap
/// freely; they never nest the way nodes do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Marks {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
}

impl Marks {
    pub fn is_plain(&self) -> bool {
        self == &Marks::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub path: NodePath,
    pub offset: usize,
}

impl Point {
    pub fn new(path: NodePath, offset: usize) -> Self {
        Self { path, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Anchor and focus in document order.
    pub fn ordered(&self) -> (Point, Point) {
        let mut start = self.anchor.clone();
        let mut end = self.focus.clone();
        if start.path == end.path {
            if end.offset < start.offset {
                std::mem::swap(&mut start, &mut end);
            }
        } else if end.path < start.path {
            std::mem::swap(&mut start, &mut end);
        }
        (start, end)
    }
}

#[derive(Debug)]
pub struct PathError(pub String);

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Document {
    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        let (&first, rest) = path.split_first()?;
        let mut node = self.children.get(first)?;
        for &ix in rest {
            node = match node {
                Node::Element(el) => el.children.get(ix)?,
                Node::Text(_) | Node::Atom(_) => return None,
            };
        }
        Some(node)
    }

    pub fn node_mut(&mut self, path: &[usize]) -> Result<&mut Node, PathError> {
        let (&first, rest) = path
            .split_first()
            .ok_or_else(|| PathError("empty path".into()))?;
        let mut node = self
            .children
            .get_mut(first)
            .ok_or_else(|| PathError(format!("index {first} out of bounds at document root")))?;
        for (depth, &ix) in rest.iter().enumerate() {
            node = match node {
                Node::Element(el) => el.children.get_mut(ix).ok_or_else(|| {
                    PathError(format!("index {ix} out of bounds at depth {}", depth + 1))
                })?,
                Node::Text(_) | Node::Atom(_) => {
                    return Err(PathError(format!(
                        "non-container node at depth {}",
                        depth + 1
                    )));
                }
            };
        }
        Ok(node)
    }

    /// Children of the node at `parent_path`; the empty path addresses the
    /// document root.
    pub fn children_at(&self, parent_path: &[usize]) -> Option<&[Node]> {
        if parent_path.is_empty() {
            return Some(&self.children);
        }
        match self.node(parent_path)? {
            Node::Element(el) => Some(&el.children),
            Node::Text(_) | Node::Atom(_) => None,
        }
    }

    pub(crate) fn children_at_mut(
        &mut self,
        parent_path: &[usize],
    ) -> Result<&mut Vec<Node>, PathError> {
        if parent_path.is_empty() {
            return Ok(&mut self.children);
        }
        match self.node_mut(parent_path)? {
            Node::Element(el) => Ok(&mut el.children),
            Node::Text(_) | Node::Atom(_) => {
                Err(PathError("parent is not a container".into()))
            }
        }
    }

    /// Innermost ancestor (or the node itself) along `path` with the given
    /// kind, returned as a path.
    pub fn ancestor_of_kind(&self, path: &[usize], kind: &str) -> Option<NodePath> {
        for len in (1..=path.len()).rev() {
            let candidate = &path[..len];
            if let Some(node) = self.node(candidate)
                && node.kind() == Some(kind)
            {
                return Some(candidate.to_vec());
            }
        }
        None
    }
}
