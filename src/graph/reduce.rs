//! Reduction of a full graph to a resource-address-level graph.
//!
//! Downstream deferral analysis only cares about relationships between
//! config-level resource addresses. The reducer drops every other vertex
//! while reconnecting its dependents to its dependencies, so transitive
//! ordering survives the removal.

use super::dag::AcyclicGraph;
use super::vertex::{Vertex, VertexId};
use crate::core::Address;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// A small directed graph over addresses, the output of
/// [`AcyclicGraph::resource_graph`].
///
/// Iteration order is the address ordering, which keeps renderings and
/// comparisons stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressGraph {
    edges: BTreeMap<Address, BTreeSet<Address>>,
}

impl AddressGraph {
    /// Creates an empty address graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an address with no dependencies.
    pub fn add(&mut self, addr: Address) {
        self.edges.entry(addr).or_default();
    }

    /// Records that `from` depends on `to`. Both addresses are added if
    /// they are not yet present.
    pub fn add_dependency(&mut self, from: Address, to: Address) {
        self.edges.entry(to.clone()).or_default();
        self.edges.entry(from).or_default().insert(to);
    }

    /// Returns true if the address is present.
    pub fn contains(&self, addr: &Address) -> bool {
        self.edges.contains_key(addr)
    }

    /// Returns the number of addresses.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if no addresses are present.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Iterates over all addresses in order.
    pub fn all_nodes(&self) -> impl Iterator<Item = &Address> {
        self.edges.keys()
    }

    /// Iterates over the direct dependencies of an address.
    pub fn dependencies_of(&self, addr: &Address) -> impl Iterator<Item = &Address> {
        self.edges.get(addr).into_iter().flatten()
    }
}

impl AcyclicGraph {
    /// Removes every vertex for which `keep` returns false, adding edges
    /// from each of its dependents to each of its dependencies first.
    ///
    /// For every pair of kept vertices, reachability in the reduced graph
    /// equals reachability in the original. The reconnection often adds
    /// redundant edges; [`AcyclicGraph::transitive_reduction`] cleans
    /// them up.
    pub fn reduce_preserving_relationships<F>(&mut self, keep: F)
    where
        F: Fn(&dyn Vertex) -> bool,
    {
        let ids: Vec<VertexId> = self.vertex_ids().cloned().collect();
        for id in ids {
            let Some(vertex) = self.vertex(&id) else {
                continue;
            };
            if keep(vertex.as_ref()) {
                continue;
            }

            let dependents: Vec<VertexId> = self.up_edges(&id).cloned().collect();
            let dependencies: Vec<VertexId> = self.down_edges(&id).cloned().collect();
            for dependent in &dependents {
                for dependency in &dependencies {
                    self.link(dependent, dependency);
                }
            }
            self.remove(&id);
        }
    }

    /// Derives the graph of config-level resource addresses.
    ///
    /// Vertices without a config resource address are discarded, but the
    /// result preserves the dependency relationships between the
    /// addresses that remain, including indirect dependencies through
    /// discarded vertices.
    pub fn resource_graph(&self) -> AddressGraph {
        trace!("resource graph: copying source graph");
        let mut tmp = AcyclicGraph::new();
        tmp.subsume(self);

        trace!("resource graph: dropping non-resource vertices");
        tmp.reduce_preserving_relationships(|v| v.config_resource_addr().is_some());

        trace!("resource graph: transitive reduction");
        tmp.transitive_reduction();

        let mut ret = AddressGraph::new();
        for vertex in tmp.vertices() {
            let Some(source) = vertex.config_resource_addr() else {
                continue;
            };
            ret.add(source.clone());
            for dep_id in tmp.down_edges(&vertex.id()) {
                let target = tmp
                    .vertex(dep_id)
                    .and_then(|dep| dep.config_resource_addr());
                if let Some(target) = target {
                    ret.add_dependency(source.clone(), target);
                }
            }
        }
        trace!("resource graph: completed with {} nodes", ret.len());
        ret
    }
}
