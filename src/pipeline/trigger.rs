//! Render trigger - the "please render again" flag.
//!
//! Setters and settled resources do not render synchronously. They raise
//! this flag; the next [`super::Root::work_loop`] call sees it and restarts
//! the pass from the application root element. Raising it repeatedly before
//! that is the same as raising it once.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

#[derive(Default)]
struct TriggerState {
    pending: Cell<bool>,
    requests: Cell<u64>,
}

/// Cloneable handle to a root's re-render request flag.
#[derive(Clone, Default)]
pub struct RenderTrigger {
    state: Rc<TriggerState>,
}

impl RenderTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a new render pass.
    pub fn request(&self) {
        self.state.pending.set(true);
        self.state.requests.set(self.state.requests.get() + 1);
    }

    /// Whether a request is waiting to be honoured.
    pub fn is_pending(&self) -> bool {
        self.state.pending.get()
    }

    /// Total number of requests ever made (including coalesced ones).
    pub fn requests(&self) -> u64 {
        self.state.requests.get()
    }

    /// Consume the pending request, if any.
    pub(crate) fn take(&self) -> bool {
        self.state.pending.replace(false)
    }

    /// The trigger as a plain zero-argument callback.
    pub fn to_callback(&self) -> impl Fn() + 'static {
        let trigger = self.clone();
        move || trigger.request()
    }
}

impl fmt::Debug for RenderTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTrigger")
            .field("pending", &self.is_pending())
            .field("requests", &self.requests())
            .finish()
    }
}
