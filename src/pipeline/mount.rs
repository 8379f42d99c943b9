//! Mount API - the root, its work loop and the render lifecycle.
//!
//! A [`Root`] owns a host, the container node the UI renders into and the
//! fiber arena. Rendering is split into interruptible units of work (one
//! fiber each) followed by a single synchronous commit.
//!
//! # Example
//!
//! ```ignore
//! use spark_fiber::pipeline::{mount, FrameBudget};
//!
//! let mut host = MemoryHost::new();
//! let container = host.create_container("body");
//!
//! // Render and commit synchronously
//! let mut root = mount(host, container, app())?;
//!
//! // Option 1: drive with idle slices
//! let mut scheduler = FrameBudget::default();
//! while root.has_pending_work() {
//!     root.tick(&mut scheduler)?;
//! }
//!
//! // Option 2: run until state settles
//! root.flush()?;
//! ```

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::config::RootConfig;
use crate::element::{Element, ElementType};
use crate::engine::{ChildMatcher, Fiber, FiberId, FiberTree, PositionalMatcher, reconcile_children};
use crate::error::{Interrupt, RenderError, Result};
use crate::host::HostTree;
use crate::renderer::{RenderReport, apply_initial_props, commit_root};
use crate::state::hooks::transplant_updates;
use crate::state::{PendingHandle, ResourceCache, Scope, UpdateQueue};

use super::scheduler::{Deadline, IdleScheduler, Unbounded};
use super::trigger::RenderTrigger;

// =============================================================================
// Work Status
// =============================================================================

/// Outcome of one call to [`Root::work_loop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    /// Nothing to do.
    Idle,
    /// The slice ran out; work remains.
    Yielded,
    /// A pass finished and was committed.
    Committed(RenderReport),
}

impl WorkStatus {
    pub fn is_committed(&self) -> bool {
        matches!(self, WorkStatus::Committed(_))
    }
}

// =============================================================================
// Root
// =============================================================================

/// A mounted UI: host, container and the two fiber trees.
pub struct Root<H: HostTree> {
    host: H,
    container: H::Node,
    element: Option<Element>,
    tree: FiberTree<H::Node>,
    current: Option<FiberId>,
    wip: Option<FiberId>,
    next_unit: Option<FiberId>,
    deletions: Vec<FiberId>,
    resources: ResourceCache,
    trigger: RenderTrigger,
    matcher: Box<dyn ChildMatcher>,
    /// Tasks this root already waits on.
    waiting: Rc<RefCell<HashSet<u64>>>,
    config: RootConfig,
    report: RenderReport,
    last_report: Option<RenderReport>,
}

impl<H: HostTree> Root<H> {
    pub fn new(host: H, container: H::Node) -> Self {
        let trigger = RenderTrigger::new();
        Self {
            host,
            container,
            element: None,
            tree: FiberTree::new(),
            current: None,
            wip: None,
            next_unit: None,
            deletions: Vec::new(),
            resources: ResourceCache::new(trigger.clone()),
            trigger,
            matcher: Box::new(PositionalMatcher),
            waiting: Rc::default(),
            config: RootConfig::default(),
            report: RenderReport::default(),
            last_report: None,
        }
    }

    pub fn with_config(mut self, config: RootConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a resource cache with other roots.
    ///
    /// Suspended components still wake this root: it subscribes to every
    /// pending handle it renders a fallback for.
    pub fn with_resources(mut self, resources: ResourceCache) -> Self {
        self.resources = resources;
        self
    }

    /// Replace the child matching strategy.
    pub fn with_matcher(mut self, matcher: impl ChildMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    /// Start a new pass for `element`. Any pass in progress is discarded.
    pub fn render(&mut self, element: Element) {
        self.element = Some(element);
        self.start_pass();
    }

    /// Perform units of work until the deadline runs low, then commit if
    /// the pass is complete.
    ///
    /// A pending render request restarts the pass from the root first. A
    /// failing component aborts the pass: nothing is committed and the
    /// error is returned.
    pub fn work_loop(&mut self, deadline: &dyn Deadline) -> Result<WorkStatus> {
        if self.trigger.take() {
            trace!("render requested; restarting pass");
            self.start_pass();
        }

        let mut should_yield = false;
        while let Some(unit) = self.next_unit {
            if should_yield {
                break;
            }
            match self.perform_unit_of_work(unit) {
                Ok(next) => self.next_unit = next,
                Err(err) => {
                    self.abort();
                    return Err(err);
                }
            }
            should_yield = deadline.time_remaining() < self.config.yield_threshold;
        }

        if self.next_unit.is_some() {
            return Ok(WorkStatus::Yielded);
        }
        match self.wip {
            Some(wip) => Ok(WorkStatus::Committed(self.commit(wip))),
            None => Ok(WorkStatus::Idle),
        }
    }

    /// Run the work loop with the next slice from `scheduler`.
    pub fn tick<S: IdleScheduler>(&mut self, scheduler: &mut S) -> Result<WorkStatus> {
        let slice = scheduler.next_slice();
        self.work_loop(&slice)
    }

    /// Render and commit until no work and no render request remain.
    ///
    /// Returns the merged report of every committed pass.
    pub fn flush(&mut self) -> Result<RenderReport> {
        let mut total = RenderReport::default();
        let passes = self.config.max_flush_passes;

        for _ in 0..passes {
            match self.work_loop(&Unbounded)? {
                WorkStatus::Committed(report) => total.merge(&report),
                WorkStatus::Idle => return Ok(total),
                WorkStatus::Yielded => {}
            }
        }

        if self.has_pending_work() {
            warn!(passes, "render did not settle");
            return Err(RenderError::Unsettled { passes });
        }
        Ok(total)
    }

    /// Whether a pass is in progress or a render has been requested.
    pub fn has_pending_work(&self) -> bool {
        self.wip.is_some() || self.trigger.is_pending()
    }

    pub fn trigger(&self) -> &RenderTrigger {
        &self.trigger
    }

    pub fn resources(&self) -> &ResourceCache {
        &self.resources
    }

    pub fn config(&self) -> &RootConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn container(&self) -> &H::Node {
        &self.container
    }

    /// Root fiber of the committed tree.
    pub fn current_root(&self) -> Option<FiberId> {
        self.current
    }

    pub fn tree(&self) -> &FiberTree<H::Node> {
        &self.tree
    }

    /// Report of the most recent commit.
    pub fn last_report(&self) -> Option<&RenderReport> {
        self.last_report.as_ref()
    }

    // =========================================================================
    // Render phase
    // =========================================================================

    fn start_pass(&mut self) {
        let Some(element) = self.element.clone() else {
            return;
        };

        let released = self.tree.release_detached(self.current);
        if released > 0 {
            trace!(released, "discarded work-in-progress fibers");
        }

        let mut root = Fiber::root(self.container.clone(), element);
        root.alternate = self.current;
        let id = self.tree.insert(root);

        self.wip = Some(id);
        self.next_unit = Some(id);
        self.deletions.clear();
        self.report = RenderReport::default();
        debug!(restart = self.current.is_some(), "render pass started");
    }

    fn abort(&mut self) {
        self.tree.release_detached(self.current);
        self.wip = None;
        self.next_unit = None;
        self.deletions.clear();
        self.report = RenderReport::default();
    }

    fn perform_unit_of_work(&mut self, id: FiberId) -> Result<Option<FiberId>> {
        self.report.units_of_work += 1;
        trace!(ty = ?self.tree[id].ty, "unit of work");

        let elements = if self.tree[id].is_component() {
            self.update_component(id)?
        } else {
            self.update_host(id);
            self.tree[id].props.children().to_vec()
        };

        reconcile_children(
            &mut self.tree,
            id,
            &elements,
            self.matcher.as_ref(),
            &mut self.deletions,
            &mut self.report,
        );

        Ok(self.tree.next_unit(id))
    }

    fn update_component(&mut self, id: FiberId) -> Result<Vec<Element>> {
        let fiber = &self.tree[id];
        let ElementType::Component(component) = fiber.ty.clone() else {
            return Ok(Vec::new());
        };
        let props = fiber.props.clone();
        let alternate = fiber.alternate;

        let (queue, previous) = match alternate.and_then(|alt| self.tree.get_mut(alt)) {
            Some(committed) => {
                let moved = transplant_updates(&committed.update_queue, &mut committed.memoized_state);
                if moved > 0 {
                    trace!(component = component.name(), moved, "queued updates");
                }
                (committed.update_queue.clone(), committed.memoized_state.clone())
            }
            None => (UpdateQueue::default(), Vec::new()),
        };
        self.tree[id].update_queue = queue.clone();
        self.report.components_rendered += 1;

        let mut scope = Scope::new(
            component.name(),
            previous,
            queue,
            self.trigger.clone(),
            &self.resources,
        );
        let rendered = component.call(&mut scope, &props);
        let hooks = scope.finish();

        let child = match rendered {
            Ok(element) => element,
            Err(Interrupt::Pending(handle)) => {
                debug!(component = component.name(), key = handle.key(), "suspended");
                self.report.suspended += 1;
                self.wake_on_settle(&handle);
                self.config.fallback.clone()
            }
            Err(Interrupt::Failed(source)) => {
                warn!(component = component.name(), error = %source, "component failed; render aborted");
                return Err(RenderError::Component {
                    component: component.name(),
                    source,
                });
            }
        };

        self.tree[id].memoized_state = hooks;
        Ok(vec![child])
    }

    /// Subscribe this root to `handle` once per task.
    fn wake_on_settle(&self, handle: &PendingHandle) {
        let task = handle.task_id();
        let first = self.waiting.borrow_mut().insert(task);
        if !first {
            return;
        }
        let trigger = self.trigger.clone();
        let waiting = Rc::clone(&self.waiting);
        handle.on_settle(move || {
            waiting.borrow_mut().remove(&task);
            trigger.request();
        });
    }

    fn update_host(&mut self, id: FiberId) {
        let fiber = &self.tree[id];
        if fiber.node.is_some() {
            return;
        }

        let node = match &fiber.ty {
            ElementType::Text => self.host.create_text(fiber.text_value().unwrap_or("")),
            ElementType::Host(tag) => {
                let node = self.host.create_element(tag);
                apply_initial_props(&mut self.host, &node, &fiber.props, &mut self.report);
                node
            }
            ElementType::Component(_) => return,
        };

        self.report.nodes_created += 1;
        self.tree[id].node = Some(node);
    }

    // =========================================================================
    // Commit
    // =========================================================================

    fn commit(&mut self, wip: FiberId) -> RenderReport {
        let deletions = std::mem::take(&mut self.deletions);
        let mut report = std::mem::take(&mut self.report);

        commit_root(&mut self.host, &mut self.tree, wip, &deletions, &mut report);
        report.fibers_released = self.tree.retain_tree(wip);

        self.current = Some(wip);
        self.wip = None;

        debug!(
            units = report.units_of_work,
            components = report.components_rendered,
            fibers = self.tree.len(),
            released = report.fibers_released,
            "render committed"
        );
        self.last_report = Some(report);
        report
    }
}

// =============================================================================
// Mount Function
// =============================================================================

/// Create a root, render `element` into `container` and commit it.
pub fn mount<H: HostTree>(host: H, container: H::Node, element: Element) -> Result<Root<H>> {
    let mut root = Root::new(host, container);
    root.render(element);
    root.flush()?;
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::children;
    use crate::element::create_element;
    use crate::host::{MemoryHost, NodeId};
    use crate::pipeline::scheduler::Exhausted;
    use crate::types::Props;

    fn setup() -> Root<MemoryHost> {
        let mut host = MemoryHost::new();
        let container = host.create_container("body");
        Root::new(host, container)
    }

    fn markup(root: &Root<MemoryHost>) -> String {
        let container: NodeId = *root.container();
        root.host().to_markup(container)
    }

    #[test]
    fn test_idle_without_element() {
        let mut root = setup();
        assert_eq!(root.work_loop(&Unbounded).unwrap(), WorkStatus::Idle);
        assert!(!root.has_pending_work());
    }

    #[test]
    fn test_first_render_commits() {
        let mut root = setup();
        root.render(create_element("p", Props::new(), children!["hi"]));
        let status = root.work_loop(&Unbounded).unwrap();

        assert!(status.is_committed());
        assert_eq!(markup(&root), "<body><p>hi</p></body>");
        assert!(root.current_root().is_some());
        assert_eq!(root.last_report().map(|r| r.nodes_created), Some(2));
    }

    #[test]
    fn test_exhausted_slice_does_one_unit() {
        let mut root = setup();
        root.render(create_element("p", Props::new(), children!["hi"]));

        // root, p, "hi": three units, the commit follows the third.
        assert_eq!(root.work_loop(&Exhausted).unwrap(), WorkStatus::Yielded);
        assert_eq!(root.work_loop(&Exhausted).unwrap(), WorkStatus::Yielded);
        assert_eq!(markup(&root), "<body></body>");
        assert!(root.work_loop(&Exhausted).unwrap().is_committed());
        assert_eq!(markup(&root), "<body><p>hi</p></body>");
    }

    #[test]
    fn test_render_discards_pass_in_progress() {
        let mut root = setup();
        root.render(create_element("p", Props::new(), children!["old"]));
        root.work_loop(&Exhausted).unwrap();

        root.render(create_element("p", Props::new(), children!["new"]));
        root.flush().unwrap();
        assert_eq!(markup(&root), "<body><p>new</p></body>");
    }

    #[test]
    fn test_arena_holds_one_tree_after_commit() {
        let mut root = setup();
        root.render(create_element("p", Props::new(), children!["a"]));
        root.flush().unwrap();
        let after_first = root.tree().len();

        root.render(create_element("p", Props::new(), children!["b"]));
        let report = root.flush().unwrap();
        assert_eq!(root.tree().len(), after_first);
        assert_eq!(report.fibers_released, after_first);
    }

    #[test]
    fn test_restarts_do_not_grow_arena() {
        let mut root = setup();
        root.render(create_element("p", Props::new(), children!["a"]));
        root.flush().unwrap();
        let committed = root.tree().len();

        for _ in 0..100 {
            root.trigger().request();
            assert_eq!(root.work_loop(&Exhausted).unwrap(), WorkStatus::Yielded);
            assert!(root.tree().len() <= committed * 2);
        }

        root.flush().unwrap();
        assert_eq!(root.tree().len(), committed);
        assert_eq!(markup(&root), "<body><p>a</p></body>");
    }
}
