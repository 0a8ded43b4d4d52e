//! Target selection: restricting a walk to an address-selected subset.

use crate::core::Address;
use crate::graph::{AcyclicGraph, Vertex, VertexId};
use std::collections::BTreeSet;

/// Extracts the address targeting operates on.
///
/// The order of the probes matters: an instance-level address takes
/// precedence over the coarser config-level one.
pub(crate) fn targetable_addr(vertex: &dyn Vertex) -> Option<Address> {
    vertex
        .resource_instance_addr()
        .or_else(|| vertex.config_resource_addr())
}

/// Selects every vertex whose address is contained by one of `targets`,
/// plus the transitive ancestors (dependencies) of each selected vertex,
/// so that every target is runnable.
///
/// Vertices without a targetable address are never selected directly;
/// they only enter the selection as a dependency of a targeted vertex.
pub fn select_targeted_vertices(graph: &AcyclicGraph, targets: &[Address]) -> BTreeSet<VertexId> {
    let mut selected = BTreeSet::new();
    for vertex in graph.vertices() {
        let Some(addr) = targetable_addr(vertex.as_ref()) else {
            continue;
        };
        if targets.iter().any(|target| target.contains(&addr)) {
            let id = vertex.id();
            selected.extend(graph.ancestors(&id));
            selected.insert(id);
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Resource {
        name: &'static str,
        instance: Option<&'static str>,
    }

    impl Vertex for Resource {
        fn id(&self) -> VertexId {
            VertexId::new(self.name)
        }

        fn resource_instance_addr(&self) -> Option<Address> {
            self.instance.map(Address::new)
        }

        fn config_resource_addr(&self) -> Option<Address> {
            Some(Address::new(self.name))
        }
    }

    #[derive(Debug)]
    struct Provider(&'static str);

    impl Vertex for Provider {
        fn id(&self) -> VertexId {
            VertexId::new(self.0)
        }
    }

    fn id(name: &str) -> VertexId {
        VertexId::new(name)
    }

    /// Two unrelated resources, both depending on one provider vertex.
    fn provider_graph() -> AcyclicGraph {
        let mut g = AcyclicGraph::new();
        g.add(Arc::new(Provider("provider.aws")));
        g.add(Arc::new(Resource {
            name: "aws_s3.a",
            instance: None,
        }));
        g.add(Arc::new(Resource {
            name: "aws_s3.b",
            instance: None,
        }));
        g.connect(&id("aws_s3.a"), &id("provider.aws")).unwrap();
        g.connect(&id("aws_s3.b"), &id("provider.aws")).unwrap();
        g
    }

    #[test]
    fn test_target_pulls_in_dependencies() {
        let g = provider_graph();
        let selected = select_targeted_vertices(&g, &[Address::new("aws_s3.a")]);
        assert_eq!(
            selected,
            [id("aws_s3.a"), id("provider.aws")].into_iter().collect()
        );
    }

    #[test]
    fn test_target_containment_selects_instances() {
        let mut g = AcyclicGraph::new();
        g.add(Arc::new(Resource {
            name: "aws_s3.a",
            instance: Some("aws_s3.a[0]"),
        }));
        let selected = select_targeted_vertices(&g, &[Address::new("aws_s3.a")]);
        assert_eq!(selected, [id("aws_s3.a")].into_iter().collect());
    }

    #[test]
    fn test_instance_addr_wins_over_config() {
        let mut g = AcyclicGraph::new();
        g.add(Arc::new(Resource {
            name: "aws_s3.a",
            instance: Some("aws_s3.a[1]"),
        }));
        // the instance-level target only contains instance [1], and the
        // vertex is judged by its instance address, not the config one
        let selected = select_targeted_vertices(&g, &[Address::new("aws_s3.a[0]")]);
        assert!(selected.is_empty());
    }

    #[test]
    fn test_targeting_is_monotonic() {
        let g = provider_graph();
        let narrow = select_targeted_vertices(&g, &[Address::new("aws_s3.a")]);
        let wide = select_targeted_vertices(
            &g,
            &[Address::new("aws_s3.a"), Address::new("aws_s3.b")],
        );
        assert!(narrow.is_subset(&wide));
        assert_eq!(wide.len(), 3);
    }

    #[test]
    fn test_no_match_selects_nothing() {
        let g = provider_graph();
        let selected = select_targeted_vertices(&g, &[Address::new("aws_iam.role")]);
        assert!(selected.is_empty());
    }
}
