//! Hooks Module - Ordered per-component state that survives re-renders
//!
//! Each component fiber owns a list of [`Hook`]s indexed by call order.
//! On every render the component gets a [`Scope`] whose cursor starts at
//! zero; the Nth `use_state` call reads the Nth hook committed last time.
//!
//! # Update flow
//!
//! ```text
//! setter.update(f) ──► committed fiber's UpdateQueue[index] ──► request render
//!                                                                    │
//! next pass: transplant queue onto committed Hook[index].queue ◄─────┘
//!            use_state() copies that hook, applies its queue in order
//! ```
//!
//! The transplant lands on the *committed* hook record and is not consumed
//! there, so a work-in-progress pass that gets discarded never loses an
//! update: the next pass replays the same actions from the same baseline.
//!
//! # API
//!
//! - `Scope::use_state(initial)` - `(value, Setter<T>)`
//! - `Setter::set(value)` - replace the state
//! - `Setter::update(f)` - derive the next state from the previous one
//! - `Scope::resource(key, task)` - read an async resource (see [`super::resource`])

use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use tracing::{trace, warn};

use super::resource::{Resolver, Resource, ResourceCache};
use crate::pipeline::RenderTrigger;

pub(crate) type StateValue = Rc<dyn Any>;

// =============================================================================
// TYPES
// =============================================================================

/// A pending state update.
#[derive(Clone)]
pub enum Action {
    /// Replace the state outright.
    Replace(StateValue),
    /// Compute the next state from the previous one. Must be pure: it may be
    /// replayed if a render pass is discarded.
    Update(Rc<dyn Fn(&StateValue) -> StateValue>),
}

impl Action {
    fn apply(&self, state: &StateValue) -> StateValue {
        match self {
            Action::Replace(value) => Rc::clone(value),
            Action::Update(f) => f(state),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Replace(_) => f.write_str("Replace"),
            Action::Update(_) => f.write_str("Update"),
        }
    }
}

/// One state slot of a component.
#[derive(Clone)]
pub struct Hook {
    pub(crate) state: StateValue,
    pub(crate) queue: Vec<Action>,
}

impl Hook {
    fn new<T: 'static>(initial: T) -> Self {
        Self {
            state: Rc::new(initial),
            queue: Vec::new(),
        }
    }

    /// Current state if it has type `T`.
    pub fn value<T: Clone + 'static>(&self) -> Option<T> {
        self.state.downcast_ref::<T>().cloned()
    }

    pub fn holds<T: 'static>(&self) -> bool {
        self.state.is::<T>()
    }

    /// Number of actions waiting to be applied.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Apply queued actions in enqueue order, then clear the queue.
    ///
    /// An action producing a value of a different type is skipped.
    fn drain(&mut self) {
        for action in self.queue.drain(..) {
            let next = action.apply(&self.state);
            if (*next).type_id() == (*self.state).type_id() {
                self.state = next;
            } else {
                warn!("skipping state update of a different type");
            }
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").field("queue", &self.queue).finish_non_exhaustive()
    }
}

/// Pending actions for a fiber, keyed by hook index.
///
/// Shared (Rc) between the fiber and every setter handed out while it
/// rendered, so setters keep working after the fiber is committed.
#[derive(Clone, Default)]
pub struct UpdateQueue(Rc<RefCell<BTreeMap<usize, Vec<Action>>>>);

impl UpdateQueue {
    pub fn push(&self, index: usize, action: Action) {
        self.0.borrow_mut().entry(index).or_default().push(action);
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Total number of queued actions.
    pub fn len(&self) -> usize {
        self.0.borrow().values().map(Vec::len).sum()
    }

    fn take(&self) -> BTreeMap<usize, Vec<Action>> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

impl fmt::Debug for UpdateQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.borrow().iter()).finish()
    }
}

/// Move queued actions onto the committed hooks they target.
///
/// Returns how many actions were transplanted.
pub(crate) fn transplant_updates(queue: &UpdateQueue, hooks: &mut [Hook]) -> usize {
    let mut moved = 0;
    for (index, actions) in queue.take() {
        match hooks.get_mut(index) {
            Some(hook) => {
                moved += actions.len();
                hook.queue.extend(actions);
            }
            None => warn!(index, "dropping updates for a hook that was never committed"),
        }
    }
    moved
}

// =============================================================================
// SETTER
// =============================================================================

/// State setter returned by [`Scope::use_state`].
///
/// Appends to the queue of the fiber that rendered it and requests a render
/// pass. Safe to call any time after the render, e.g. from event handlers.
pub struct Setter<T> {
    queue: UpdateQueue,
    index: usize,
    trigger: RenderTrigger,
    _marker: PhantomData<fn(T)>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            index: self.index,
            trigger: self.trigger.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: 'static> Setter<T> {
    /// Replace the state with `value`.
    pub fn set(&self, value: T) {
        self.dispatch(Action::Replace(Rc::new(value)));
    }

    /// Compute the next state from the previous one.
    pub fn update(&self, f: impl Fn(&T) -> T + 'static) {
        self.dispatch(Action::Update(Rc::new(move |prev: &StateValue| {
            match prev.downcast_ref::<T>() {
                Some(prev) => Rc::new(f(prev)) as StateValue,
                None => Rc::clone(prev),
            }
        })));
    }

    fn dispatch(&self, action: Action) {
        trace!(index = self.index, ?action, "state update queued");
        self.queue.push(self.index, action);
        self.trigger.request();
    }
}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter").field("index", &self.index).finish()
    }
}

// =============================================================================
// SCOPE
// =============================================================================

/// Render context handed to a component for one invocation.
pub struct Scope<'a> {
    component: &'static str,
    previous: Vec<Hook>,
    working: Vec<Hook>,
    queue: UpdateQueue,
    trigger: RenderTrigger,
    resources: &'a ResourceCache,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(
        component: &'static str,
        previous: Vec<Hook>,
        queue: UpdateQueue,
        trigger: RenderTrigger,
        resources: &'a ResourceCache,
    ) -> Self {
        Self {
            component,
            previous,
            working: Vec::new(),
            queue,
            trigger,
            resources,
        }
    }

    /// Persistent state slot.
    ///
    /// Returns `initial` on the first render of this call site, otherwise
    /// the committed state with any queued updates applied. Call order must
    /// be the same on every render.
    pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, Setter<T>) {
        let index = self.working.len();

        let mut hook = match self.previous.get(index) {
            Some(prev) if prev.holds::<T>() => prev.clone(),
            Some(_) => {
                warn!(
                    component = self.component,
                    index, "hook order changed between renders; resetting state"
                );
                Hook::new(initial.clone())
            }
            None => Hook::new(initial.clone()),
        };
        hook.drain();

        let value = hook.value::<T>().unwrap_or(initial);
        self.working.push(hook);

        let setter = Setter {
            queue: self.queue.clone(),
            index,
            trigger: self.trigger.clone(),
            _marker: PhantomData,
        };
        (value, setter)
    }

    /// Read an asynchronous resource, starting its task if needed.
    pub fn resource<T, F>(&self, key: &str, task: F) -> Resource<T>
    where
        T: Clone + 'static,
        F: FnOnce(Resolver<T>),
    {
        self.resources.request(key, task)
    }

    /// Ask for another render pass.
    pub fn request_render(&self) {
        self.trigger.request();
    }

    pub fn component_name(&self) -> &'static str {
        self.component
    }

    /// Hooks used so far in this invocation.
    pub fn hook_count(&self) -> usize {
        self.working.len()
    }

    pub(crate) fn finish(self) -> Vec<Hook> {
        self.working
    }
}

// =============================================================================
// TESTS
// =============================================================================
