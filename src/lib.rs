//! # spark-fiber
//!
//! Incremental UI reconciler for Rust.
//!
//! ## Architecture
//!
//! Applications describe their UI as immutable [`Element`] trees. Each render
//! pass turns the element tree into a tree of fibers, one unit of work per
//! fiber, and can yield between units. A finished pass is applied to the
//! host in a single commit that touches only what changed.
//!
//! ```text
//! Element tree → work loop (fibers, interruptible) → commit → HostTree
//!      ▲                                                   │
//!      └──── use_state setters / resources ── RenderTrigger ◄┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Props, prop values, events, effect tags
//! - [`element`] - Element model and `create_element`
//! - [`engine`] - Fiber arena and child matching
//! - [`renderer`] - Commit engine
//! - [`state`] - Hooks (`use_state`) and the resource cache
//! - [`pipeline`] - Root, work loop and scheduler shim
//! - [`host`] - Host tree boundary and the in-memory host
//!
//! ## Example
//!
//! ```ignore
//! use spark_fiber::*;
//!
//! fn counter(cx: &mut Scope<'_>, _props: &Props) -> Rendered {
//!     let (count, set_count) = cx.use_state(0);
//!     Ok(create_element(
//!         "button",
//!         Props::new().on("onClick", move |_| set_count.update(|n| n + 1)),
//!         children![count],
//!     ))
//! }
//!
//! let mut host = MemoryHost::new();
//! let body = host.create_container("body");
//! let root = mount(host, body, component(Component::new("counter", counter), Props::new()))?;
//! ```

pub mod config;
pub mod element;
pub mod engine;
pub mod error;
pub mod host;
pub mod pipeline;
pub mod renderer;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::RootConfig;

pub use element::{Child, Component, ComponentFn, Element, ElementType, component, create_element, text_element};

pub use engine::{ChildMatcher, FiberId, Matching, PositionalMatcher};

pub use error::{Interrupt, RenderError, Rendered, Result};

pub use host::{HostTree, MemoryHost, NodeId, normalize_prop_name};

pub use pipeline::{
    Deadline, Exhausted, FrameBudget, IdleScheduler, ImmediateFallback, RenderTrigger, Root,
    TimeSlice, Unbounded, WorkStatus, mount,
};

pub use renderer::RenderReport;

pub use state::{Resolver, Resource, ResourceCache, Scope, Setter, Suspend};
