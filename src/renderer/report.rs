/// What one render pass did.
///
/// Counters accumulate from the moment a pass starts until its commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Fibers processed by the work loop.
    pub units_of_work: usize,

    /// Component invocations.
    pub components_rendered: usize,

    /// Components that rendered the fallback instead.
    pub suspended: usize,

    pub fibers_placed: usize,
    pub fibers_updated: usize,
    pub fibers_deleted: usize,

    /// Fibers released from the arena after the commit.
    pub fibers_released: usize,

    pub nodes_created: usize,
    pub nodes_inserted: usize,
    pub nodes_removed: usize,

    /// Props, attributes and handlers written.
    pub props_set: usize,

    /// Props, attributes and handlers cleared.
    pub props_removed: usize,

    pub text_updates: usize,
}

impl RenderReport {
    /// Whether the host tree was touched at all.
    pub fn any_host_mutation(&self) -> bool {
        self.nodes_created > 0
            || self.nodes_inserted > 0
            || self.nodes_removed > 0
            || self.props_set > 0
            || self.props_removed > 0
            || self.text_updates > 0
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: &RenderReport) {
        self.units_of_work += other.units_of_work;
        self.components_rendered += other.components_rendered;
        self.suspended += other.suspended;
        self.fibers_placed += other.fibers_placed;
        self.fibers_updated += other.fibers_updated;
        self.fibers_deleted += other.fibers_deleted;
        self.fibers_released += other.fibers_released;
        self.nodes_created += other.nodes_created;
        self.nodes_inserted += other.nodes_inserted;
        self.nodes_removed += other.nodes_removed;
        self.props_set += other.props_set;
        self.props_removed += other.props_removed;
        self.text_updates += other.text_updates;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_mutation() {
        assert!(!RenderReport::default().any_host_mutation());
    }

    #[test]
    fn test_merge_adds_counters() {
        let mut a = RenderReport {
            units_of_work: 3,
            text_updates: 1,
            ..Default::default()
        };
        let b = RenderReport {
            units_of_work: 2,
            nodes_removed: 1,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.units_of_work, 5);
        assert_eq!(a.nodes_removed, 1);
        assert!(a.any_host_mutation());
    }
}
