//! In-memory host document.
//!
//! Nodes are indices into a flat array (never reused, so a handle to a
//! removed node stays valid for inspection). Every mutation made through
//! [`HostTree`] is counted in [`HostStats`], which is what the reconciler
//! tests assert on.

use std::collections::HashSet;
use std::fmt::Write as _;

use indexmap::IndexMap;
use tracing::trace;

use super::HostTree;
use crate::types::{Event, EventHandler, PropValue};

/// Names treated as properties by default (everything else is an attribute).
const DEFAULT_PROPERTIES: &[&str] = &[
    "value",
    "checked",
    "className",
    "id",
    "src",
    "disabled",
    "selected",
    "hidden",
    "title",
];

/// Handle to a node in a [`MemoryHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(String),
    Text(String),
}

#[derive(Default)]
struct NodeData {
    kind: Option<NodeKind>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: IndexMap<String, String>,
    properties: IndexMap<String, PropValue>,
    handlers: IndexMap<String, EventHandler>,
}

/// Mutation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    pub elements_created: usize,
    pub texts_created: usize,
    pub inserted: usize,
    pub removed: usize,
    pub text_updates: usize,
    pub properties_set: usize,
    pub properties_cleared: usize,
    pub attributes_set: usize,
    pub attributes_removed: usize,
    pub handlers_set: usize,
    pub handlers_cleared: usize,
}

impl HostStats {
    pub fn nodes_created(&self) -> usize {
        self.elements_created + self.texts_created
    }

    /// Property, attribute and handler writes (text updates excluded).
    pub fn prop_mutations(&self) -> usize {
        self.properties_set
            + self.properties_cleared
            + self.attributes_set
            + self.attributes_removed
            + self.handlers_set
            + self.handlers_cleared
    }

    pub fn is_empty(&self) -> bool {
        *self == HostStats::default()
    }
}

/// In-memory document tree.
pub struct MemoryHost {
    nodes: Vec<NodeData>,
    properties: HashSet<String>,
    stats: HostStats,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::with_properties(DEFAULT_PROPERTIES.iter().copied())
    }

    /// Host that recognizes exactly `names` as properties.
    pub fn with_properties<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            nodes: Vec::new(),
            properties: names.into_iter().map(str::to_string).collect(),
            stats: HostStats::default(),
        }
    }

    /// Create a root container node (not counted in the stats).
    pub fn create_container(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(tag.to_string()))
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind: Some(kind),
            ..Default::default()
        });
        id
    }

    fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id.0)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn stats(&self) -> HostStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = HostStats::default();
    }

    /// Total nodes ever created, containers included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).and_then(|n| n.kind.as_ref())
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element(tag) => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(value) => Some(value),
            NodeKind::Element(_) => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)?.attributes.get(name).map(String::as_str)
    }

    pub fn property(&self, id: NodeId, name: &str) -> Option<&PropValue> {
        self.node(id)?.properties.get(name)
    }

    pub fn handler(&self, id: NodeId, name: &str) -> Option<EventHandler> {
        self.node(id)?.handlers.get(name).cloned()
    }

    /// Invoke the handler bound under `name` (e.g. `"onclick"`).
    ///
    /// Returns false when nothing is bound.
    pub fn dispatch(&self, id: NodeId, name: &str, event: &Event) -> bool {
        match self.handler(id, name) {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }

    pub fn click(&self, id: NodeId) -> bool {
        self.dispatch(id, "onclick", &Event::new("click"))
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(value)) => out.push_str(value),
            Some(NodeKind::Element(_)) => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
            None => {}
        }
    }

    /// Descendants of `root` with the given tag, in document order.
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.tag(id) == Some(tag) {
                found.push(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        found
    }

    /// HTML-like serialization of `id` and its subtree.
    ///
    /// Attributes and properties are written in the order they were set;
    /// handlers are omitted.
    pub fn to_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else { return };
        match &node.kind {
            Some(NodeKind::Text(value)) => out.push_str(value),
            Some(NodeKind::Element(tag)) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in &node.attributes {
                    let _ = write!(out, " {name}=\"{value}\"");
                }
                for (name, value) in &node.properties {
                    let _ = write!(out, " {name}=\"{}\"", value.to_attribute());
                }
                out.push('>');
                for &child in &node.children {
                    self.write_markup(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
            None => {}
        }
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.parent_of(child) else { return };
        if let Some(parent) = self.node_mut(parent) {
            parent.children.retain(|&c| c != child);
        }
        if let Some(child) = self.node_mut(child) {
            child.parent = None;
        }
    }
}

impl HostTree for MemoryHost {
    type Node = NodeId;

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.stats.elements_created += 1;
        let id = self.alloc(NodeKind::Element(tag.to_string()));
        trace!(?id, tag, "create element");
        id
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.stats.texts_created += 1;
        self.alloc(NodeKind::Text(text.to_string()))
    }

    fn set_text(&mut self, node: &NodeId, text: &str) {
        if let Some(NodeData {
            kind: Some(NodeKind::Text(value)),
            ..
        }) = self.node_mut(*node)
        {
            *value = text.to_string();
            self.stats.text_updates += 1;
        }
    }

    fn has_property(&self, _node: &NodeId, name: &str) -> bool {
        self.properties.contains(name)
    }

    fn set_property(&mut self, node: &NodeId, name: &str, value: &PropValue) {
        if let Some(data) = self.node_mut(*node) {
            data.properties.insert(name.to_string(), value.clone());
            self.stats.properties_set += 1;
        }
    }

    fn clear_property(&mut self, node: &NodeId, name: &str) {
        if let Some(data) = self.node_mut(*node) {
            data.properties.shift_remove(name);
            self.stats.properties_cleared += 1;
        }
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        if let Some(data) = self.node_mut(*node) {
            data.attributes.insert(name.to_string(), value.to_string());
            self.stats.attributes_set += 1;
        }
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) {
        if let Some(data) = self.node_mut(*node) {
            data.attributes.shift_remove(name);
            self.stats.attributes_removed += 1;
        }
    }

    fn set_handler(&mut self, node: &NodeId, name: &str, handler: Option<EventHandler>) {
        let Some(data) = self.node_mut(*node) else { return };
        match handler {
            Some(handler) => {
                data.handlers.insert(name.to_string(), handler);
                self.stats.handlers_set += 1;
            }
            None => {
                data.handlers.shift_remove(name);
                self.stats.handlers_cleared += 1;
            }
        }
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, before: Option<&NodeId>) {
        if self.node(*parent).is_none() || self.node(*child).is_none() {
            return;
        }
        self.detach(*child);

        if let Some(data) = self.node_mut(*parent) {
            let index = before
                .and_then(|b| data.children.iter().position(|c| c == b))
                .unwrap_or(data.children.len());
            data.children.insert(index, *child);
        }
        if let Some(data) = self.node_mut(*child) {
            data.parent = Some(*parent);
        }
        self.stats.inserted += 1;
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) {
        if self.parent_of(*child) != Some(*parent) {
            return;
        }
        self.detach(*child);
        self.stats.removed += 1;
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.parent_of(*node)
    }
}
