//! Per-walk vertex filtering.
//!
//! The filter is a mutable overlay on the graph: it never changes the
//! graph itself, only which vertices a walk treats as allowed. It is
//! written during pre-traversal filtering and during dynamic expansion,
//! and read concurrently by every in-flight visit, so it is backed by a
//! concurrent map and shared behind an `Arc`.

use crate::graph::VertexId;
use dashmap::DashMap;

/// The label a walk assigns to a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterLabel {
    /// The vertex participates in the walk.
    Allowed,
    /// The vertex was filtered out by targeting or exclusion.
    ExplicitlyExcluded,
}

/// Mutable overlay labeling vertices for one top-level walk.
///
/// One filter exists per top-level walk and is shared with every
/// sub-walk. Exclusion dominates: once a vertex is explicitly excluded,
/// [`TraversalFilter::include`] will not bring it back.
#[derive(Debug, Default)]
pub struct TraversalFilter {
    labels: DashMap<VertexId, FilterLabel>,
}

impl TraversalFilter {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a vertex as allowed, unless it is already explicitly
    /// excluded.
    pub fn include(&self, id: &VertexId) {
        self.labels
            .entry(id.clone())
            .or_insert(FilterLabel::Allowed);
    }

    /// Marks a vertex as explicitly excluded. Overrides any earlier
    /// inclusion.
    pub fn exclude(&self, id: &VertexId) {
        self.labels.insert(id.clone(), FilterLabel::ExplicitlyExcluded);
    }

    /// Returns whether the vertex currently carries the given label.
    pub fn matches(&self, id: &VertexId, label: FilterLabel) -> bool {
        self.labels.get(id).map_or(false, |l| *l == label)
    }

    /// Returns true only if the vertex is known to be allowed.
    ///
    /// An unlabeled vertex is not allowed: callers sometimes ask about a
    /// vertex identity the filter was never populated with, and the safe
    /// answer is to treat it as excluded downstream.
    pub fn allowed(&self, id: &VertexId) -> bool {
        self.matches(id, FilterLabel::Allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> VertexId {
        VertexId::new(name)
    }

    #[test]
    fn test_unlabeled_is_not_allowed() {
        let filter = TraversalFilter::new();
        assert!(!filter.allowed(&id("a")));
        assert!(!filter.matches(&id("a"), FilterLabel::ExplicitlyExcluded));
    }

    #[test]
    fn test_include_then_query() {
        let filter = TraversalFilter::new();
        filter.include(&id("a"));
        assert!(filter.allowed(&id("a")));
        assert!(filter.matches(&id("a"), FilterLabel::Allowed));
    }

    #[test]
    fn test_exclude_dominates_include() {
        let filter = TraversalFilter::new();
        filter.exclude(&id("a"));
        filter.include(&id("a"));
        assert!(!filter.allowed(&id("a")));
        assert!(filter.matches(&id("a"), FilterLabel::ExplicitlyExcluded));
    }

    #[test]
    fn test_exclude_overrides_earlier_include() {
        let filter = TraversalFilter::new();
        filter.include(&id("a"));
        filter.exclude(&id("a"));
        assert!(filter.matches(&id("a"), FilterLabel::ExplicitlyExcluded));
    }
}
