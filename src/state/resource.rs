//! Resource Module - Memoized asynchronous values with suspense semantics
//!
//! A resource is requested synchronously but produced asynchronously:
//!
//! - settled key: [`Resource::Ready`] with the cached value
//! - no task yet: the task is started, [`Resource::Pending`] is returned
//! - task in flight: the same [`PendingHandle`] is returned (deduplicated)
//!
//! The task receives a [`Resolver`]. Resolving it stores the value, clears
//! the in-flight marker, wakes anything waiting on the handle and requests a
//! render pass, so the component that suspended renders again and finds the
//! settled value.
//!
//! # Example
//!
//! ```ignore
//! fn playlist(cx: &mut Scope<'_>, _props: &Props) -> Rendered {
//!     let tracks: Vec<Track> = cx.resource("playlist", |resolver| {
//!         fetch_later(move |tracks| resolver.resolve(tracks));
//!     }).ready()?;
//!     Ok(render_tracks(&tracks))
//! }
//! ```

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::pipeline::RenderTrigger;

/// Entries are keyed by caller key and value type.
type CacheKey = (String, TypeId);

// =============================================================================
// TYPES
// =============================================================================

/// Result of [`ResourceCache::request`].
#[derive(Debug)]
pub enum Resource<T> {
    Ready(T),
    Pending(PendingHandle),
}

impl<T> Resource<T> {
    /// Convert for use with `?` inside a component.
    pub fn ready(self) -> Result<T, Suspend> {
        match self {
            Resource::Ready(value) => Ok(value),
            Resource::Pending(handle) => Err(Suspend(handle)),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Resource::Ready(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Resource::Pending(_))
    }
}

/// "Not ready" signal; converts into [`crate::Interrupt::Pending`].
#[derive(Debug, Clone)]
pub struct Suspend(pub PendingHandle);

struct PendingState {
    key: String,
    task: u64,
    settled: Cell<bool>,
    abandoned: Cell<bool>,
    waiters: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// Handle to an in-flight resource task.
#[derive(Clone)]
pub struct PendingHandle {
    inner: Rc<PendingState>,
}

impl PendingHandle {
    fn new(key: &str, task: u64) -> Self {
        Self {
            inner: Rc::new(PendingState {
                key: key.to_string(),
                task,
                settled: Cell::new(false),
                abandoned: Cell::new(false),
                waiters: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Sequence number of the task behind this handle.
    pub fn task_id(&self) -> u64 {
        self.inner.task
    }

    pub fn is_settled(&self) -> bool {
        self.inner.settled.get()
    }

    /// Whether the task was dropped without resolving.
    pub fn is_abandoned(&self) -> bool {
        self.inner.abandoned.get()
    }

    /// Callbacks still waiting on this task.
    pub fn waiter_count(&self) -> usize {
        self.inner.waiters.borrow().len()
    }

    /// Run `f` once the task settles (immediately if it already has).
    ///
    /// Waiters registered before the task is abandoned are woken too, so
    /// they can request it again. Registering after that is a no-op.
    pub fn on_settle(&self, f: impl FnOnce() + 'static) {
        if self.is_settled() {
            f();
        } else if self.is_abandoned() {
            trace!(key = %self.inner.key, task = self.inner.task, "task abandoned; not waiting");
        } else {
            self.inner.waiters.borrow_mut().push(Box::new(f));
        }
    }

    fn settle(&self) {
        self.inner.settled.set(true);
        self.wake();
    }

    fn abandon(&self) {
        self.inner.abandoned.set(true);
        self.wake();
    }

    fn wake(&self) {
        let waiters = std::mem::take(&mut *self.inner.waiters.borrow_mut());
        for waiter in waiters {
            waiter();
        }
    }

    fn same_task(&self, other: &PendingHandle) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for PendingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingHandle")
            .field("key", &self.inner.key)
            .field("task", &self.inner.task)
            .field("settled", &self.inner.settled.get())
            .field("abandoned", &self.inner.abandoned.get())
            .finish()
    }
}

// =============================================================================
// CACHE STATE
// =============================================================================

#[derive(Default)]
struct CacheState {
    settled: HashMap<CacheKey, Rc<dyn Any>>,
    in_flight: HashMap<CacheKey, PendingHandle>,
    next_task: u64,
}

impl CacheState {
    /// Clear the in-flight marker if it still belongs to `handle`.
    fn finish_task(&mut self, key: &CacheKey, handle: &PendingHandle) {
        if self
            .in_flight
            .get(key)
            .is_some_and(|current| current.same_task(handle))
        {
            self.in_flight.remove(key);
        }
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Completion handle passed to a resource task.
///
/// Dropping it without calling [`Resolver::resolve`] abandons the task: the
/// in-flight marker is cleared and anything waiting on the handle is woken,
/// so the next render requests the key again and starts a new task.
pub struct Resolver<T> {
    key: CacheKey,
    handle: PendingHandle,
    state: Weak<RefCell<CacheState>>,
    trigger: RenderTrigger,
    done: bool,
    _marker: PhantomData<fn(T)>,
}

impl<T: 'static> Resolver<T> {
    pub fn key(&self) -> &str {
        &self.key.0
    }

    pub fn handle(&self) -> &PendingHandle {
        &self.handle
    }

    /// Store the value and request a render pass.
    pub fn resolve(mut self, value: T) {
        self.done = true;
        if let Some(state) = self.state.upgrade() {
            let mut state = state.borrow_mut();
            state.settled.insert(self.key.clone(), Rc::new(value));
            state.finish_task(&self.key, &self.handle);
        }
        debug!(key = %self.key.0, task = self.handle.task_id(), "resource settled");
        self.handle.settle();
        self.trigger.request();
    }
}

impl<T> Drop for Resolver<T> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        warn!(key = %self.key.0, task = self.handle.task_id(), "resource task dropped without resolving");
        if let Some(state) = self.state.upgrade() {
            state.borrow_mut().finish_task(&self.key, &self.handle);
        }
        self.handle.abandon();
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").field("handle", &self.handle).finish()
    }
}

// =============================================================================
// RESOURCE CACHE
// =============================================================================

/// Cache of settled resource values plus in-flight task markers.
///
/// Cloning shares the same cache.
#[derive(Clone)]
pub struct ResourceCache {
    state: Rc<RefCell<CacheState>>,
    trigger: RenderTrigger,
}

impl ResourceCache {
    /// Create a cache whose settled tasks request renders through `trigger`.
    pub fn new(trigger: RenderTrigger) -> Self {
        Self {
            state: Rc::new(RefCell::new(CacheState::default())),
            trigger,
        }
    }

    /// Read `key`, starting `task` if nothing is cached or in flight.
    pub fn request<T, F>(&self, key: &str, task: F) -> Resource<T>
    where
        T: Clone + 'static,
        F: FnOnce(Resolver<T>),
    {
        let cache_key = (key.to_string(), TypeId::of::<T>());

        let handle = {
            let mut state = self.state.borrow_mut();
            if let Some(value) = state.settled.get(&cache_key).and_then(|v| v.downcast_ref::<T>()) {
                return Resource::Ready(value.clone());
            }
            if let Some(handle) = state.in_flight.get(&cache_key) {
                trace!(key, task = handle.task_id(), "resource already in flight");
                return Resource::Pending(handle.clone());
            }
            state.next_task += 1;
            let handle = PendingHandle::new(key, state.next_task);
            state.in_flight.insert(cache_key.clone(), handle.clone());
            handle
        };

        debug!(key, task = handle.task_id(), "starting resource task");
        task(Resolver {
            key: cache_key,
            handle: handle.clone(),
            state: Rc::downgrade(&self.state),
            trigger: self.trigger.clone(),
            done: false,
            _marker: PhantomData,
        });

        Resource::Pending(handle)
    }

    /// Drop a settled value so the next request fetches again.
    pub fn invalidate<T: 'static>(&self, key: &str) -> bool {
        let cache_key = (key.to_string(), TypeId::of::<T>());
        self.state.borrow_mut().settled.remove(&cache_key).is_some()
    }

    pub fn is_settled<T: 'static>(&self, key: &str) -> bool {
        let cache_key = (key.to_string(), TypeId::of::<T>());
        self.state.borrow().settled.contains_key(&cache_key)
    }

    pub fn is_pending<T: 'static>(&self, key: &str) -> bool {
        let cache_key = (key.to_string(), TypeId::of::<T>());
        self.state.borrow().in_flight.contains_key(&cache_key)
    }

    pub fn in_flight_count(&self) -> usize {
        self.state.borrow().in_flight.len()
    }

    /// Forget every settled value. In-flight tasks are left alone.
    pub fn clear(&self) {
        self.state.borrow_mut().settled.clear();
    }
}

impl fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ResourceCache")
            .field("settled", &state.settled.len())
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
