//! State Module - Component-local state and asynchronous resources
//!
//! - **Hooks** - Ordered per-component state slots (`use_state`) that persist
//!   across renders of the same component instance
//! - **Resource** - Memoized async values; a pending value suspends the
//!   component and renders the fallback until it settles

pub mod hooks;
pub mod resource;

pub use hooks::{Action, Hook, Scope, Setter, UpdateQueue};
pub use resource::{PendingHandle, Resolver, Resource, ResourceCache, Suspend};
