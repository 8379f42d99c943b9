//! Host boundary - the primitives the commit engine drives.
//!
//! The reconciler never knows what a host node is. It only creates nodes,
//! sets or clears named values on them and moves them around through
//! [`HostTree`]. [`MemoryHost`] is an in-memory document used by tests and
//! demos; a DOM or terminal backend implements the same trait.

mod memory;

pub use memory::{HostStats, MemoryHost, NodeId, NodeKind};

use std::fmt::Debug;

use crate::types::{EventHandler, PropValue};

/// Host tree primitives consumed by the reconciler and commit engine.
pub trait HostTree {
    /// Handle to a host node. Cheap to clone, compared by identity.
    type Node: Clone + PartialEq + Debug;

    /// Create a detached element node.
    fn create_element(&mut self, tag: &str) -> Self::Node;

    /// Create a detached text node.
    fn create_text(&mut self, text: &str) -> Self::Node;

    /// Replace the value of a text node.
    fn set_text(&mut self, node: &Self::Node, text: &str);

    /// Whether `name` is a property the host recognizes on `node` (as
    /// opposed to a plain attribute).
    fn has_property(&self, node: &Self::Node, name: &str) -> bool;

    fn set_property(&mut self, node: &Self::Node, name: &str, value: &PropValue);

    fn clear_property(&mut self, node: &Self::Node, name: &str);

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

    fn remove_attribute(&mut self, node: &Self::Node, name: &str);

    /// Bind (`Some`) or unbind (`None`) an event handler.
    fn set_handler(&mut self, node: &Self::Node, name: &str, handler: Option<EventHandler>);

    /// Attach `child` under `parent` before `before`, or last when `before`
    /// is `None`. A child attached elsewhere is moved.
    fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, before: Option<&Self::Node>);

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) {
        self.insert_before(parent, child, None);
    }

    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Current parent of `node`, if attached.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
}

/// Map framework prop names to host handler names.
///
/// Unrecognized names pass through unchanged.
pub fn normalize_prop_name(name: &str) -> &str {
    match name {
        "onClick" => "onclick",
        "onChange" => "onchange",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_known_events() {
        assert_eq!(normalize_prop_name("onClick"), "onclick");
        assert_eq!(normalize_prop_name("onChange"), "onchange");
    }

    #[test]
    fn test_normalize_passthrough() {
        assert_eq!(normalize_prop_name("className"), "className");
        assert_eq!(normalize_prop_name("onInput"), "onInput");
        assert_eq!(normalize_prop_name("onclick"), "onclick");
    }
}
