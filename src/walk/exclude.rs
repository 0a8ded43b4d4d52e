//! Exclusion resolution: inverse targeting.
//!
//! An excluded address removes the vertices it covers and, transitively,
//! everything that depends on them. A dependent cannot proceed without
//! its dependency, so the cascade runs toward dependents only; a pure
//! dependency of an excluded vertex stays eligible.

use super::filter::{FilterLabel, TraversalFilter};
use super::target::targetable_addr;
use crate::core::Address;
use crate::graph::{AcyclicGraph, Vertex};

/// Returns true when the vertex's own address, or the address of any of
/// its transitive dependencies, is contained by one of the exclusions.
fn is_excluded(graph: &AcyclicGraph, vertex: &dyn Vertex, excluded: &[Address]) -> bool {
    let contains = |addr: &Address| excluded.iter().any(|e| e.contains(addr));

    if let Some(addr) = targetable_addr(vertex) {
        if contains(&addr) {
            return true;
        }
    }

    for ancestor_id in graph.ancestors(&vertex.id()) {
        if let Some(ancestor) = graph.vertex(&ancestor_id) {
            if let Some(addr) = targetable_addr(ancestor.as_ref()) {
                if contains(&addr) {
                    return true;
                }
            }
        }
    }
    false
}

/// Marks every vertex covered by the exclusion list, or depending on a
/// covered vertex, as explicitly excluded in the filter.
pub fn apply_exclusions(graph: &AcyclicGraph, excluded: &[Address], filter: &TraversalFilter) {
    for vertex in graph.vertices() {
        let id = vertex.id();
        if filter.matches(&id, FilterLabel::ExplicitlyExcluded) {
            continue;
        }
        if is_excluded(graph, vertex.as_ref(), excluded) {
            filter.exclude(&id);
        }
    }
}
