//! Ephemeral per-node UI state.
//!
//! Node views carry transient state (a drag in progress, an open inline
//! editor) that must survive position shifts as the document is edited, so
//! it is keyed by a stable identity the view layer allocates — never by
//! path, and never serialized.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

#[derive(Debug)]
pub struct NodeStateTable<S> {
    next: u64,
    map: HashMap<NodeId, S>,
}

impl<S> Default for NodeStateTable<S> {
    fn default() -> Self {
        Self {
            next: 1,
            map: HashMap::new(),
        }
    }
}

impl<S> NodeStateTable<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh identity for a newly mounted node view.
    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    pub fn insert(&mut self, id: NodeId, state: S) {
        self.map.insert(id, state);
    }

    pub fn get(&self, id: NodeId) -> Option<&S> {
        self.map.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut S> {
        self.map.get_mut(&id)
    }

    /// Drop state when the owning node view unmounts.
    pub fn remove(&mut self, id: NodeId) -> Option<S> {
        self.map.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
