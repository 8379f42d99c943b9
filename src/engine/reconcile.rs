//! Child reconciliation - pairs new child elements with the previous
//! child fibers.
//!
//! Matching is a strategy ([`ChildMatcher`]). The default,
//! [`PositionalMatcher`], pairs the i-th new element with the i-th old
//! fiber and reuses it only when both have the same type. There are no
//! keys: removing the first of three same-typed siblings updates the first
//! two and deletes the last.

use crate::element::{Element, ElementType};
use crate::renderer::RenderReport;
use crate::types::EffectTag;

use super::fiber::{Fiber, FiberId, FiberTree};

/// Result of matching new children against old ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matching {
    /// For each new element, the index of the old fiber it reuses.
    pub reuse: Vec<Option<usize>>,
    /// Indices of old fibers that must be deleted.
    pub deleted: Vec<usize>,
}

/// Strategy for pairing new child elements with old child fibers.
///
/// Implementations must reuse an old index at most once, only pair equal
/// types, and list every old index that is not reused in `deleted`.
pub trait ChildMatcher {
    fn match_children(&self, new: &[Element], old: &[ElementType]) -> Matching;
}

/// Pair children by position.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalMatcher;

impl ChildMatcher for PositionalMatcher {
    fn match_children(&self, new: &[Element], old: &[ElementType]) -> Matching {
        let mut matching = Matching {
            reuse: Vec::with_capacity(new.len()),
            deleted: Vec::new(),
        };

        for i in 0..new.len().max(old.len()) {
            let same_type = match (new.get(i), old.get(i)) {
                (Some(element), Some(ty)) => element.ty() == ty,
                _ => false,
            };
            if i < new.len() {
                matching.reuse.push(same_type.then_some(i));
            }
            if i < old.len() && !same_type {
                matching.deleted.push(i);
            }
        }

        matching
    }
}

/// Build the child fibers of `wip` from `elements`.
///
/// Reused fibers carry the old host node and point at their alternate
/// (UPDATE); the rest start fresh (PLACEMENT). Old fibers that were not
/// reused are appended to `deletions`.
pub(crate) fn reconcile_children<N: Clone>(
    tree: &mut FiberTree<N>,
    wip: FiberId,
    elements: &[Element],
    matcher: &dyn ChildMatcher,
    deletions: &mut Vec<FiberId>,
    report: &mut RenderReport,
) {
    let old_ids = match tree[wip].alternate {
        Some(alternate) => tree.children(alternate),
        None => Vec::new(),
    };
    let old_types: Vec<ElementType> = old_ids.iter().map(|&id| tree[id].ty.clone()).collect();
    let matching = matcher.match_children(elements, &old_types);

    tree[wip].child = None;
    let mut previous: Option<FiberId> = None;

    for (element, reuse) in elements.iter().zip(matching.reuse) {
        let mut fiber = Fiber::new(element.ty().clone(), element.props().clone(), Some(wip));

        match reuse.and_then(|index| old_ids.get(index).copied()) {
            Some(old) => {
                fiber.node = tree[old].node.clone();
                fiber.alternate = Some(old);
                fiber.effect = EffectTag::UPDATE;
                report.fibers_updated += 1;
            }
            None => {
                fiber.effect = EffectTag::PLACEMENT;
                report.fibers_placed += 1;
            }
        }

        let id = tree.insert(fiber);
        match previous {
            None => tree[wip].child = Some(id),
            Some(prev) => tree[prev].sibling = Some(id),
        }
        previous = Some(id);
    }

    for index in matching.deleted {
        if let Some(&old) = old_ids.get(index) {
            deletions.push(old);
            report.fibers_deleted += 1;
        }
    }
}
