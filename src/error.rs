//! Error types.
//!
//! Two channels exist and they are deliberately separate:
//! - [`Interrupt`] is what a component returns instead of an element. Its
//!   `Pending` variant is the suspense protocol ("render the fallback and
//!   retry once the resource settles"), not a failure.
//! - [`RenderError`] is what the work loop reports to the caller when a
//!   pass is aborted.

use std::error::Error;
use std::fmt;

use crate::element::Element;
use crate::state::{PendingHandle, Suspend};

/// Return type of a component render function.
pub type Rendered = std::result::Result<Element, Interrupt>;

/// Why a component did not produce an element.
pub enum Interrupt {
    /// A resource the component depends on has not settled yet.
    Pending(PendingHandle),
    /// The component failed; the render pass is aborted.
    Failed(Box<dyn Error + 'static>),
}

impl Interrupt {
    /// Wrap any error as a component failure.
    pub fn fail(error: impl Into<Box<dyn Error + 'static>>) -> Self {
        Interrupt::Failed(error.into())
    }
}

impl From<Suspend> for Interrupt {
    fn from(suspend: Suspend) -> Self {
        Interrupt::Pending(suspend.0)
    }
}

impl fmt::Debug for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupt::Pending(handle) => f.debug_tuple("Pending").field(handle).finish(),
            Interrupt::Failed(err) => f.debug_tuple("Failed").field(&err.to_string()).finish(),
        }
    }
}

/// A render pass that could not complete.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A component returned [`Interrupt::Failed`]. Nothing was committed.
    #[error("component `{component}` failed while rendering: {source}")]
    Component {
        component: &'static str,
        source: Box<dyn Error + 'static>,
    },

    /// State kept changing after every commit.
    #[error("render did not settle after {passes} passes")]
    Unsettled { passes: usize },
}

/// Convenience Result type with RenderError.
pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_error_message() {
        let err = RenderError::Component {
            component: "Playlist",
            source: "bad track".into(),
        };
        assert_eq!(
            err.to_string(),
            "component `Playlist` failed while rendering: bad track"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_interrupt_fail_from_str() {
        let interrupt = Interrupt::fail("boom");
        match interrupt {
            Interrupt::Failed(err) => assert_eq!(err.to_string(), "boom"),
            Interrupt::Pending(_) => panic!("expected failure"),
        }
    }
}
