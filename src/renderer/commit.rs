//! Commit - apply a finished work-in-progress tree to the host.
//!
//! Deletions run first and detach only the topmost host node of each
//! removed subtree. The new tree is then walked in pre-order: placed nodes
//! are inserted before their next attached host sibling, updated nodes get
//! only the props that changed.

use tracing::{debug, trace};

use crate::engine::{FiberId, FiberTree};
use crate::host::{HostTree, normalize_prop_name};
use crate::types::{EffectTag, NODE_VALUE, PropValue, Props};

use super::RenderReport;

/// Apply the work-in-progress tree rooted at `root` to the host.
///
/// `deletions` are committed-tree fibers collected during the render phase.
pub fn commit_root<H: HostTree>(
    host: &mut H,
    tree: &mut FiberTree<H::Node>,
    root: FiberId,
    deletions: &[FiberId],
    report: &mut RenderReport,
) {
    for &deleted in deletions {
        commit_deletion(host, tree, deleted, report);
    }

    let mut next = tree.get(root).and_then(|fiber| fiber.child);
    while let Some(id) = next {
        commit_work(host, tree, id, report);
        next = tree.next_within(id, root);
    }

    if let Some(fiber) = tree.get_mut(root) {
        fiber.memoized_props = Some(fiber.props.clone());
        fiber.effect = EffectTag::NONE;
    }

    debug!(
        deletions = deletions.len(),
        inserted = report.nodes_inserted,
        removed = report.nodes_removed,
        props_set = report.props_set,
        text_updates = report.text_updates,
        "commit"
    );
}

/// Write the props of a freshly created element node.
pub(crate) fn apply_initial_props<H: HostTree>(
    host: &mut H,
    node: &H::Node,
    props: &Props,
    report: &mut RenderReport,
) {
    for (name, value) in props.iter() {
        set_prop(host, node, name, value, report);
    }
}

// =============================================================================
// Deletion
// =============================================================================

/// Detach the topmost host nodes of the subtree rooted at `id`.
///
/// Component fibers own no node, so the walk descends through them until
/// it reaches the host nodes they rendered.
fn commit_deletion<H: HostTree>(
    host: &mut H,
    tree: &mut FiberTree<H::Node>,
    id: FiberId,
    report: &mut RenderReport,
) {
    let Some(fiber) = tree.get_mut(id) else { return };
    fiber.effect = EffectTag::DELETION;

    match fiber.node.clone() {
        Some(node) => {
            if let Some(parent) = host.parent(&node) {
                trace!(?node, "remove");
                host.remove_child(&parent, &node);
                report.nodes_removed += 1;
            }
        }
        None => {
            for child in tree.children(id) {
                commit_deletion(host, tree, child, report);
            }
        }
    }
}

// =============================================================================
// Placement / Update
// =============================================================================

fn commit_work<H: HostTree>(
    host: &mut H,
    tree: &mut FiberTree<H::Node>,
    id: FiberId,
    report: &mut RenderReport,
) {
    let fiber = &tree[id];
    let props = fiber.props.clone();

    let Some(node) = fiber.node.clone() else {
        finish(tree, id, props);
        return;
    };

    let Some(parent) = tree.host_parent(id).cloned() else {
        trace!(?node, "fiber has no host parent; skipping");
        return;
    };

    if fiber.effect.contains(EffectTag::UPDATE) {
        let previous = fiber
            .alternate
            .and_then(|alternate| tree.get(alternate))
            .map(|alternate| alternate.applied_props().clone());

        if let Some(old) = previous {
            if fiber.ty.is_text() {
                let text = props.get_str(NODE_VALUE).unwrap_or("");
                if old.get_str(NODE_VALUE).unwrap_or("") != text {
                    host.set_text(&node, text);
                    report.text_updates += 1;
                }
            } else {
                update_props(host, &node, &old, &props, report);
            }
        }
    }

    if host.parent(&node).as_ref() != Some(&parent) {
        let before = next_host_sibling(host, tree, id, &parent);
        trace!(?node, ?before, "insert");
        host.insert_before(&parent, &node, before.as_ref());
        report.nodes_inserted += 1;
    }

    finish(tree, id, props);
}

fn finish<N>(tree: &mut FiberTree<N>, id: FiberId, props: Props) {
    let fiber = &mut tree[id];
    fiber.memoized_props = Some(props);
    fiber.effect = EffectTag::NONE;
}

/// First host node after `id` that is already attached under `parent`.
///
/// Climbs out of component fibers, since their siblings render into the
/// same host parent.
fn next_host_sibling<H: HostTree>(
    host: &H,
    tree: &FiberTree<H::Node>,
    id: FiberId,
    parent: &H::Node,
) -> Option<H::Node> {
    let mut current = id;
    loop {
        let mut sibling = tree[current].sibling;
        while let Some(candidate) = sibling {
            if let Some(node) = first_attached_node(host, tree, candidate, parent) {
                return Some(node);
            }
            sibling = tree[candidate].sibling;
        }

        let up = tree[current].parent?;
        if tree[up].node.is_some() {
            return None;
        }
        current = up;
    }
}

fn first_attached_node<H: HostTree>(
    host: &H,
    tree: &FiberTree<H::Node>,
    id: FiberId,
    parent: &H::Node,
) -> Option<H::Node> {
    if let Some(node) = &tree[id].node {
        return (host.parent(node).as_ref() == Some(parent)).then(|| node.clone());
    }
    tree.children(id)
        .into_iter()
        .find_map(|child| first_attached_node(host, tree, child, parent))
}

// =============================================================================
// Props
// =============================================================================

fn update_props<H: HostTree>(
    host: &mut H,
    node: &H::Node,
    old: &Props,
    new: &Props,
    report: &mut RenderReport,
) {
    for (name, value) in old.iter() {
        let gone = match new.get(name) {
            None => true,
            Some(next) => value.is_handler() != next.is_handler(),
        };
        if gone {
            remove_prop(host, node, name, value, report);
        }
    }

    for (name, value) in new.iter() {
        if old.get(name) != Some(value) {
            set_prop(host, node, name, value, report);
        }
    }
}

fn set_prop<H: HostTree>(
    host: &mut H,
    node: &H::Node,
    name: &str,
    value: &PropValue,
    report: &mut RenderReport,
) {
    let name = normalize_prop_name(name);
    match value {
        PropValue::Handler(handler) => host.set_handler(node, name, Some(handler.clone())),
        _ if host.has_property(node, name) => host.set_property(node, name, value),
        _ => host.set_attribute(node, name, &value.to_attribute()),
    }
    report.props_set += 1;
}

fn remove_prop<H: HostTree>(
    host: &mut H,
    node: &H::Node,
    name: &str,
    old: &PropValue,
    report: &mut RenderReport,
) {
    let name = normalize_prop_name(name);
    if old.is_handler() {
        host.set_handler(node, name, None);
    } else if host.has_property(node, name) {
        host.clear_property(node, name);
    } else {
        host.remove_attribute(node, name);
    }
    report.props_removed += 1;
}
