use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::editor::Editor;
use crate::model::{Document, Node, Point, Selection};
use crate::step::Step;

#[derive(Debug, Clone)]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Debug, Clone)]
pub struct QueryError {
    message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A toolbar-facing command. The handler returns `Ok(true)` when it applied a
/// transaction and `Ok(false)` when its preconditions failed — a no-op, not
/// an error. `Err` is reserved for malformed invocations (bad args).
#[derive(Clone)]
pub struct CommandSpec {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub handler: Arc<dyn Fn(&mut Editor, Option<Value>) -> Result<bool, CommandError> + Send + Sync>,
}

impl CommandSpec {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        handler: impl Fn(&mut Editor, Option<Value>) -> Result<bool, CommandError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            keywords: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }
}

/// A read-only probe used for toolbar highlighting and enablement.
#[derive(Clone)]
pub struct QuerySpec {
    pub id: String,
    pub handler: Arc<dyn Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync>,
}

impl QuerySpec {
    pub fn new(
        id: impl Into<String>,
        handler: impl Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    Block,
    Inline,
}

/// What a node kind may contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentModel {
    /// No children at all (atoms, divider).
    None,
    /// Text leaves only.
    Inline,
    /// Block children only.
    Blocks,
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub kind: String,
    pub role: NodeRole,
    pub atom: bool,
    pub content: ContentModel,
}

/// A structural repair rule. Passes are run to a fixpoint after every
/// transaction; a pass reports the steps needed, it never mutates directly.
pub trait NormalizePass: Send + Sync {
    fn id(&self) -> &'static str;
    fn run(&self, doc: &Document, registry: &ExtensionRegistry) -> Vec<Step>;
}

/// A bundle of node kinds plus the commands, queries, and normalize passes
/// that give them behavior.
pub trait Extension: Send + Sync {
    fn id(&self) -> &'static str;
    fn node_specs(&self) -> Vec<NodeSpec> {
        Vec::new()
    }
    fn commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }
    fn queries(&self) -> Vec<QuerySpec> {
        Vec::new()
    }
    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        Vec::new()
    }
}

#[derive(Default)]
pub struct ExtensionRegistry {
    node_specs: HashMap<String, NodeSpec>,
    commands: HashMap<String, CommandSpec>,
    queries: HashMap<String, QuerySpec>,
    normalize_passes: Vec<Box<dyn NormalizePass>>,
}

impl ExtensionRegistry {
    pub fn new(extensions: impl IntoIterator<Item = Box<dyn Extension>>) -> Result<Self, String> {
        let mut registry = Self::default();
        for extension in extensions {
            registry.register(extension)?;
        }
        Ok(registry)
    }

    /// The full node-type set of the editing core.
    pub fn standard() -> Self {
        let extensions: Vec<Box<dyn Extension>> = vec![
            Box::new(crate::extensions::blocks::BlocksExtension),
            Box::new(crate::extensions::marks::MarksExtension),
            Box::new(crate::extensions::lists::ListsExtension),
            Box::new(crate::extensions::media::MediaExtension),
            Box::new(crate::extensions::link_card::LinkCardExtension),
            Box::new(crate::extensions::table::TableExtension),
        ];
        Self::new(extensions).expect("standard registry must be valid")
    }

    pub fn register(&mut self, extension: Box<dyn Extension>) -> Result<(), String> {
        for spec in extension.node_specs() {
            if self.node_specs.contains_key(&spec.kind) {
                return Err(format!("duplicate node kind: {}", spec.kind));
            }
            self.node_specs.insert(spec.kind.clone(), spec);
        }
        for command in extension.commands() {
            if self.commands.contains_key(&command.id) {
                return Err(format!("duplicate command id: {}", command.id));
            }
            self.commands.insert(command.id.clone(), command);
        }
        for query in extension.queries() {
            if self.queries.contains_key(&query.id) {
                return Err(format!("duplicate query id: {}", query.id));
            }
            self.queries.insert(query.id.clone(), query);
        }
        self.normalize_passes.extend(extension.normalize_passes());
        Ok(())
    }

    pub fn node_specs(&self) -> &HashMap<String, NodeSpec> {
        &self.node_specs
    }

    pub fn spec(&self, kind: &str) -> Option<&NodeSpec> {
        self.node_specs.get(kind)
    }

    pub fn is_known_kind(&self, kind: &str) -> bool {
        self.node_specs.contains_key(kind)
    }

    pub fn content_model(&self, kind: &str) -> ContentModel {
        self.node_specs
            .get(kind)
            .map(|s| s.content.clone())
            .unwrap_or(ContentModel::Any)
    }

    pub fn commands(&self) -> &HashMap<String, CommandSpec> {
        &self.commands
    }

    pub fn command(&self, id: &str) -> Option<CommandSpec> {
        self.commands.get(id).cloned()
    }

    pub fn query(&self, id: &str) -> Option<QuerySpec> {
        self.queries.get(id).cloned()
    }

    pub fn normalize(&self, doc: &Document) -> Vec<Step> {
        let mut steps = Vec::new();
        for pass in &self.normalize_passes {
            steps.extend(pass.run(doc, self));
        }
        steps
    }

    /// Clamp a selection onto existing text positions, falling back to the
    /// first text leaf in the document.
    pub fn normalize_selection(&self, doc: &Document, selection: &Selection) -> Selection {
        let fallback = first_text_point(doc).unwrap_or(Point {
            path: vec![0],
            offset: 0,
        });

        let anchor = clamp_point(doc, &selection.anchor).unwrap_or_else(|| {
            clamp_point(doc, &selection.focus).unwrap_or_else(|| fallback.clone())
        });
        let focus = clamp_point(doc, &selection.focus).unwrap_or_else(|| anchor.clone());

        Selection { anchor, focus }
    }
}

pub(crate) fn first_text_point(doc: &Document) -> Option<Point> {
    fn walk(children: &[Node], path: &mut Vec<usize>) -> Option<Point> {
        for (ix, node) in children.iter().enumerate() {
            path.push(ix);
            match node {
                Node::Text(_) => {
                    let point = Point::new(path.clone(), 0);
                    path.pop();
                    return Some(point);
                }
                Node::Element(el) => {
                    if let Some(point) = walk(&el.children, path) {
                        path.pop();
                        return Some(point);
                    }
                }
                Node::Atom(_) => {}
            }
            path.pop();
        }
        None
    }

    walk(&doc.children, &mut Vec::new())
}

fn clamp_point(doc: &Document, point: &Point) -> Option<Point> {
    if point.path.is_empty() || doc.children.is_empty() {
        return None;
    }

    let mut resolved: Vec<usize> = Vec::new();
    let mut children: &[Node] = &doc.children;

    for &wanted in &point.path {
        if children.is_empty() {
            break;
        }
        let ix = wanted.min(children.len() - 1);
        resolved.push(ix);
        match &children[ix] {
            Node::Text(t) => {
                return Some(Point::new(resolved, point.offset.min(t.text.len())));
            }
            Node::Element(el) => children = &el.children,
            Node::Atom(_) => break,
        }
    }

    match doc.node(&resolved)? {
        Node::Text(t) => Some(Point::new(resolved, point.offset.min(t.text.len()))),
        Node::Element(el) => first_text_descendant(&el.children, &mut resolved),
        Node::Atom(_) => None,
    }
}

fn first_text_descendant(children: &[Node], path: &mut Vec<usize>) -> Option<Point> {
    for (ix, node) in children.iter().enumerate() {
        path.push(ix);
        match node {
            Node::Text(_) => return Some(Point::new(path.clone(), 0)),
            Node::Element(el) => {
                if let Some(point) = first_text_descendant(&el.children, path) {
                    return Some(point);
                }
            }
            Node::Atom(_) => {}
        }
        path.pop();
    }
    None
}
