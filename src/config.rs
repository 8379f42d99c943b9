//! Root configuration.

use std::time::Duration;

use crate::element::{Element, create_element};
use crate::types::Props;

/// Tunables for a [`Root`](crate::pipeline::Root).
#[derive(Debug, Clone)]
pub struct RootConfig {
    /// The work loop yields once the slice has less than this left.
    pub yield_threshold: Duration,

    /// Rendered in place of a component whose resource is still pending.
    pub fallback: Element,

    /// Upper bound on passes run by `flush()` before giving up.
    pub max_flush_passes: usize,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
            fallback: default_fallback(),
            max_flush_passes: 64,
        }
    }
}

impl RootConfig {
    pub fn with_yield_threshold(mut self, threshold: Duration) -> Self {
        self.yield_threshold = threshold;
        self
    }

    pub fn with_fallback(mut self, fallback: Element) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_max_flush_passes(mut self, passes: usize) -> Self {
        self.max_flush_passes = passes.max(1);
        self
    }
}

/// `<h2>resource loading</h2>`
pub fn default_fallback() -> Element {
    create_element("h2", Props::new(), crate::children!["resource loading"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RootConfig::default();
        assert_eq!(config.yield_threshold, Duration::from_millis(1));
        assert_eq!(config.max_flush_passes, 64);
        assert_eq!(config.fallback.ty().tag(), Some("h2"));
        assert_eq!(config.fallback.children()[0].text_value(), Some("resource loading"));
    }

    #[test]
    fn test_flush_passes_at_least_one() {
        assert_eq!(RootConfig::default().with_max_flush_passes(0).max_flush_passes, 1);
    }
}
