//! Fiber arena - one record per rendered element, two trees at a time.
//!
//! Both the committed tree and the work-in-progress tree live in the same
//! [`SlotMap`]. `child` / `sibling` are the ownership edges of a tree;
//! `parent` and `alternate` are plain back-references. Handles are
//! generation-checked, so a handle into a released tree simply stops
//! resolving instead of aliasing a new fiber.
//!
//! ```text
//!  committed (current)            work in progress
//!  root ◄──────── alternate ────── root'
//!   │                               │
//!   div ◄──────── alternate ─────── div'
//!   │                               │
//!   "0" ◄──────── alternate ─────── "1"
//! ```

use std::collections::HashSet;
use std::ops::{Index, IndexMut};

use slotmap::SlotMap;

use crate::element::{Element, ElementType};
use crate::state::{Hook, UpdateQueue};
use crate::types::{EffectTag, NODE_VALUE, Props};

slotmap::new_key_type! {
    /// Generation-checked handle to a fiber.
    pub struct FiberId;
}

/// Tag given to root fibers (they wrap the host container).
pub const ROOT_TAG: &str = "#root";

/// Work-tracking node mirroring one element.
pub struct Fiber<N> {
    pub ty: ElementType,
    pub props: Props,
    /// Host node owned by this fiber. Components never own one.
    pub node: Option<N>,
    pub parent: Option<FiberId>,
    pub child: Option<FiberId>,
    pub sibling: Option<FiberId>,
    /// Counterpart in the last committed tree.
    pub alternate: Option<FiberId>,
    pub effect: EffectTag,
    /// Props actually applied to the host node at the last commit.
    pub memoized_props: Option<Props>,
    /// Hooks committed for this component fiber.
    pub memoized_state: Vec<Hook>,
    /// Updates queued by setters handed out while this fiber rendered.
    pub update_queue: UpdateQueue,
}

impl<N> Fiber<N> {
    pub fn new(ty: ElementType, props: Props, parent: Option<FiberId>) -> Self {
        Self {
            ty,
            props,
            node: None,
            parent,
            child: None,
            sibling: None,
            alternate: None,
            effect: EffectTag::NONE,
            memoized_props: None,
            memoized_state: Vec::new(),
            update_queue: UpdateQueue::default(),
        }
    }

    /// Root fiber: owns the container and has `element` as its only child.
    pub fn root(container: N, element: Element) -> Self {
        let props = Props::new().with_children(vec![element]);
        let mut fiber = Self::new(ElementType::from(ROOT_TAG), props, None);
        fiber.node = Some(container);
        fiber
    }

    pub fn is_component(&self) -> bool {
        self.ty.is_component()
    }

    pub fn text_value(&self) -> Option<&str> {
        match self.ty {
            ElementType::Text => self.props.get_str(NODE_VALUE),
            _ => None,
        }
    }

    /// Diff baseline for the next pass.
    pub fn applied_props(&self) -> &Props {
        self.memoized_props.as_ref().unwrap_or(&self.props)
    }
}

/// Arena holding every live fiber.
pub struct FiberTree<N> {
    fibers: SlotMap<FiberId, Fiber<N>>,
}

impl<N> Default for FiberTree<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> FiberTree<N> {
    pub fn new() -> Self {
        Self {
            fibers: SlotMap::with_key(),
        }
    }

    pub fn insert(&mut self, fiber: Fiber<N>) -> FiberId {
        self.fibers.insert(fiber)
    }

    pub fn get(&self, id: FiberId) -> Option<&Fiber<N>> {
        self.fibers.get(id)
    }

    pub fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber<N>> {
        self.fibers.get_mut(id)
    }

    pub fn contains(&self, id: FiberId) -> bool {
        self.fibers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// Child chain of `id`, in order.
    pub fn children(&self, id: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut next = self.get(id).and_then(|f| f.child);
        while let Some(child) = next {
            out.push(child);
            next = self.get(child).and_then(|f| f.sibling);
        }
        out
    }

    /// Next fiber in pre-order: child, else sibling, else the nearest
    /// ancestor's sibling. `None` once the walk climbs past the root.
    pub fn next_unit(&self, id: FiberId) -> Option<FiberId> {
        let fiber = self.get(id)?;
        if fiber.child.is_some() {
            return fiber.child;
        }
        let mut current = Some(id);
        while let Some(cur) = current {
            let fiber = self.get(cur)?;
            if fiber.sibling.is_some() {
                return fiber.sibling;
            }
            current = fiber.parent;
        }
        None
    }

    /// Pre-order successor of `id` that stays inside the subtree of `root`.
    pub fn next_within(&self, id: FiberId, root: FiberId) -> Option<FiberId> {
        let fiber = self.get(id)?;
        if fiber.child.is_some() {
            return fiber.child;
        }
        let mut current = id;
        while current != root {
            let fiber = self.get(current)?;
            if fiber.sibling.is_some() {
                return fiber.sibling;
            }
            current = fiber.parent?;
        }
        None
    }

    /// Host node of the nearest ancestor that owns one.
    pub fn host_parent(&self, id: FiberId) -> Option<&N> {
        let mut current = self.get(id)?.parent;
        while let Some(cur) = current {
            let fiber = self.get(cur)?;
            if let Some(node) = &fiber.node {
                return Some(node);
            }
            current = fiber.parent;
        }
        None
    }

    /// `root` and its descendants in pre-order.
    pub fn subtree(&self, root: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut next = self.contains(root).then_some(root);
        while let Some(id) = next {
            out.push(id);
            next = self.next_within(id, root);
        }
        out
    }

    /// Release every fiber not reachable from `root` and clear the
    /// `alternate` links of the survivors. Returns how many were released.
    pub fn retain_tree(&mut self, root: FiberId) -> usize {
        self.sweep(Some(root), true)
    }

    /// Release every fiber not reachable from `current`, leaving the
    /// survivors untouched. With no committed tree the arena is emptied.
    pub fn release_detached(&mut self, current: Option<FiberId>) -> usize {
        self.sweep(current, false)
    }

    fn sweep(&mut self, root: Option<FiberId>, clear_alternates: bool) -> usize {
        let keep: HashSet<FiberId> = root
            .map(|root| self.subtree(root))
            .unwrap_or_default()
            .into_iter()
            .collect();
        let before = self.fibers.len();
        self.fibers.retain(|id, fiber| {
            let kept = keep.contains(&id);
            if kept && clear_alternates {
                fiber.alternate = None;
            }
            kept
        });
        before - self.fibers.len()
    }
}

impl<N> Index<FiberId> for FiberTree<N> {
    type Output = Fiber<N>;

    fn index(&self, id: FiberId) -> &Fiber<N> {
        &self.fibers[id]
    }
}

impl<N> IndexMut<FiberId> for FiberTree<N> {
    fn index_mut(&mut self, id: FiberId) -> &mut Fiber<N> {
        &mut self.fibers[id]
    }
}
