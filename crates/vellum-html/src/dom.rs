//! Minimal arena DOM fed by html5ever.
//!
//! The reader only needs tag names, attributes, children, and text, so the
//! arena stores exactly that. Nodes are never freed; removal just unlinks.

use std::borrow::Cow;
use std::cell::RefCell;

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, ParseOpts, QualName, parse_document};

pub(crate) type DomId = usize;

#[derive(Debug)]
pub(crate) enum DomData {
    Document,
    Element {
        // Boxed so the name keeps a stable address while the arena grows;
        // elem_name hands out a reference that must survive a push.
        name: Box<QualName>,
        attrs: Vec<(QualName, String)>,
    },
    Text(String),
    Comment,
}

#[derive(Debug)]
pub(crate) struct DomNode {
    pub(crate) parent: Option<DomId>,
    pub(crate) children: Vec<DomId>,
    pub(crate) data: DomData,
}

#[derive(Debug)]
pub(crate) struct Dom {
    nodes: Vec<DomNode>,
}

impl Dom {
    fn new() -> Self {
        Self {
            nodes: vec![DomNode {
                parent: None,
                children: Vec::new(),
                data: DomData::Document,
            }],
        }
    }

    pub(crate) fn document(&self) -> DomId {
        0
    }

    fn create(&mut self, data: DomData) -> DomId {
        let id = self.nodes.len();
        self.nodes.push(DomNode {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    pub(crate) fn get(&self, id: DomId) -> &DomNode {
        &self.nodes[id]
    }

    fn append(&mut self, parent: DomId, child: DomId) {
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    fn append_text(&mut self, parent: DomId, text: &str) {
        // Merge with a trailing text sibling, the way browsers coalesce.
        let last = self.nodes[parent].children.last().copied();
        if let Some(last) = last
            && let DomData::Text(existing) = &mut self.nodes[last].data
        {
            existing.push_str(text);
            return;
        }
        let id = self.create(DomData::Text(text.to_string()));
        self.append(parent, id);
    }

    fn insert_before(&mut self, sibling: DomId, node: DomId) {
        let Some(parent) = self.nodes[sibling].parent else {
            return;
        };
        self.detach(node);
        let ix = self.nodes[parent]
            .children
            .iter()
            .position(|&c| c == sibling)
            .unwrap_or(self.nodes[parent].children.len());
        self.nodes[parent].children.insert(ix, node);
        self.nodes[node].parent = Some(parent);
    }

    fn detach(&mut self, node: DomId) {
        if let Some(parent) = self.nodes[node].parent.take() {
            self.nodes[parent].children.retain(|&c| c != node);
        }
    }

    pub(crate) fn tag_name(&self, id: DomId) -> Option<&str> {
        match &self.get(id).data {
            DomData::Element { name, .. } => Some(name.local.as_ref()),
            _ => None,
        }
    }

    pub(crate) fn attr(&self, id: DomId, name: &str) -> Option<&str> {
        match &self.get(id).data {
            DomData::Element { attrs, .. } => attrs
                .iter()
                .find(|(qual, _)| qual.local.as_ref() == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub(crate) fn children(&self, id: DomId) -> &[DomId] {
        &self.get(id).children
    }

    pub(crate) fn text(&self, id: DomId) -> Option<&str> {
        match &self.get(id).data {
            DomData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub(crate) fn find_first(&self, from: DomId, tag: &str) -> Option<DomId> {
        if self.tag_name(from) == Some(tag) {
            return Some(from);
        }
        for &child in self.children(from) {
            if let Some(found) = self.find_first(child, tag) {
                return Some(found);
            }
        }
        None
    }
}

/// TreeSink building a [`Dom`]. Interior mutability because html5ever's
/// trait takes `&self` everywhere.
struct DomSink {
    dom: RefCell<Dom>,
    quirks_mode: RefCell<QuirksMode>,
}

impl DomSink {
    fn new() -> Self {
        Self {
            dom: RefCell::new(Dom::new()),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
        }
    }

    fn into_dom(self) -> Dom {
        self.dom.into_inner()
    }
}

impl TreeSink for DomSink {
    type Handle = DomId;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {
        // Lenient like a browser.
    }

    fn get_document(&self) -> Self::Handle {
        self.dom.borrow().document()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        static EMPTY: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };

        let dom = self.dom.borrow();
        match &dom.get(*target).data {
            DomData::Element { name, .. } => {
                // SAFETY: the QualName is boxed and lives in the arena for
                // the life of self; only the RefCell borrow keeps the
                // compiler from seeing that. Nodes are never dropped.
                unsafe { std::mem::transmute::<&QualName, &'a QualName>(name.as_ref()) }
            }
            _ => &EMPTY,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attrs = attrs
            .into_iter()
            .map(|a| (a.name, a.value.to_string()))
            .collect();
        self.dom.borrow_mut().create(DomData::Element {
            name: Box::new(name),
            attrs,
        })
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        self.dom.borrow_mut().create(DomData::Comment)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        self.dom.borrow_mut().create(DomData::Comment)
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut dom = self.dom.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => dom.append(*parent, node),
            NodeOrText::AppendText(text) => dom.append_text(*parent, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let parent = self.dom.borrow().get(*element).parent;
        match parent {
            Some(parent) => self.append(&parent, child),
            None => self.append(prev_element, child),
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        *target
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut dom = self.dom.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => dom.insert_before(*sibling, node),
            NodeOrText::AppendText(text) => {
                let node = dom.create(DomData::Text(text.to_string()));
                dom.insert_before(*sibling, node);
            }
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, new_attrs: Vec<Attribute>) {
        let mut dom = self.dom.borrow_mut();
        if let DomData::Element { attrs, .. } = &mut dom.nodes[*target].data {
            for attr in new_attrs {
                if !attrs.iter().any(|(name, _)| *name == attr.name) {
                    attrs.push((attr.name, attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.dom.borrow_mut().detach(*target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let children: Vec<DomId> = self.dom.borrow().children(*node).to_vec();
        let mut dom = self.dom.borrow_mut();
        for child in children {
            dom.append(*new_parent, child);
        }
    }
}

/// Parse a markup fragment by wrapping it into a full document and handing
/// back the `<body>` subtree root.
pub(crate) fn parse_fragment(html: &str) -> (Dom, DomId) {
    let wrapped = format!("<!DOCTYPE html><html><head></head><body>{html}</body></html>");
    let sink = parse_document(DomSink::new(), ParseOpts::default())
        .from_utf8()
        .one(wrapped.as_bytes());
    let dom = sink.into_dom();
    let body = dom
        .find_first(dom.document(), "body")
        .unwrap_or(dom.document());
    (dom, body)
}
