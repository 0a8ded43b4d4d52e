//! Vertex identity and runtime capabilities.
//!
//! A vertex is an opaque unit of work; what it can do is discovered at
//! traversal time through capability accessors. Each accessor defaults to
//! "not supported", so a vertex implementation only states what it has.
//!
//! The scope accessors are mutually exclusive by group: a vertex belongs
//! to exactly one of a custom evaluation scope, an expanded module
//! instance, or a partially-expanded module, and the walker probes them
//! in that order.
//!
//! # Design
//!
//! Capabilities are narrow trait objects rather than downcasts: a vertex
//! that can be expanded returns `Some(&dyn Expandable)` from
//! [`Vertex::as_expandable`], usually just `Some(self)`.

use crate::core::{Address, Diagnostics, OverrideValue, ProviderAddr};
use crate::walk::EvalContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::dag::AcyclicGraph;

/// Unique identity of a vertex within a graph.
///
/// Identity is the name: two vertices with the same id are merged when
/// graphs are combined.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId {
    name: String,
}

impl VertexId {
    /// Creates a vertex id from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The distinguished id of the subgraph root sentinel.
    pub fn root() -> Self {
        Self {
            name: "root".to_string(),
        }
    }

    /// Returns true if this is the root sentinel id.
    pub fn is_root(&self) -> bool {
        self.name == "root"
    }

    /// Returns the name portion of the id.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Debug for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VertexId({})", self.name)
    }
}

impl From<&str> for VertexId {
    fn from(s: &str) -> Self {
        VertexId::new(s)
    }
}

impl From<String> for VertexId {
    fn from(s: String) -> Self {
        VertexId::new(s)
    }
}

/// A unit of work in the dependency graph.
///
/// Only [`Vertex::id`] is required. Everything else is a capability the
/// walker probes for during a visit.
pub trait Vertex: Send + Sync + fmt::Debug {
    /// Stable identity of the vertex within its graph.
    fn id(&self) -> VertexId;

    /// Human-readable name used in logs and diagnostics.
    fn name(&self) -> String {
        self.id().to_string()
    }

    /// Instance-level resource address, when the vertex represents a
    /// single resource instance. Takes precedence over
    /// [`Vertex::config_resource_addr`] for targeting.
    fn resource_instance_addr(&self) -> Option<Address> {
        None
    }

    /// Config-level resource address, when the vertex represents a
    /// resource block that may expand into several instances.
    fn config_resource_addr(&self) -> Option<Address> {
        None
    }

    /// Provider config address, when the vertex configures a provider.
    fn provider_addr(&self) -> Option<ProviderAddr> {
        None
    }

    /// Arbitrary named evaluation scope. Probed first.
    fn custom_scope(&self) -> Option<String> {
        None
    }

    /// Expanded module instance the vertex belongs to. Probed second.
    fn module_instance(&self) -> Option<Address> {
        None
    }

    /// Partially-expanded module path the vertex belongs to. Probed last.
    fn partial_module(&self) -> Option<Address> {
        None
    }

    /// The vertex's per-visit action, if it has one.
    fn as_executable(&self) -> Option<&dyn Executable> {
        None
    }

    /// Dynamic subgraph production, if the vertex supports it.
    fn as_expandable(&self) -> Option<&dyn Expandable> {
        None
    }

    /// Refined sub-targets carried into a dynamic subgraph's walk.
    fn as_targetable(&self) -> Option<&dyn Targetable> {
        None
    }

    /// Override injection for test/mock runs.
    fn as_overridable(&self) -> Option<&dyn Overridable> {
        None
    }

    /// Exclusion signalling, for vertices that short-circuit their own
    /// work when the walk has filtered them out.
    fn as_exclusion_aware(&self) -> Option<&dyn ExclusionAware> {
        None
    }
}

/// A vertex with a per-visit action. The host performs the actual work;
/// the walker only hands the vertex over.
pub trait Executable: Send + Sync {
    /// Identity of the executable vertex.
    fn id(&self) -> VertexId;
}

/// A vertex whose full subgraph is known only at traversal time.
#[async_trait]
pub trait Expandable: Send + Sync {
    /// Produces the dynamic subgraph, or `None` when there is nothing to
    /// expand. Failures are reported as diagnostics against the vertex.
    async fn expand(&self, ctx: Arc<dyn EvalContext>)
        -> Result<Option<AcyclicGraph>, Diagnostics>;
}

/// A vertex carrying refined targets for its dynamic subgraph.
///
/// When a target is more specific than the vertex itself (the target is
/// `resource.foo[0]` but the vertex represents `resource.foo`), the
/// refined target is applied inside the subgraph walk.
pub trait Targetable: Send + Sync {
    /// The refined target addresses.
    fn direct_targets(&self) -> Vec<Address>;
}

/// A vertex that accepts an override value in place of its computed one.
pub trait Overridable: Send + Sync {
    /// The instance address overrides are looked up by.
    fn resource_instance_addr(&self) -> Address;

    /// The provider config the vertex's resource belongs to.
    fn config_provider(&self) -> ProviderAddr;

    /// Injects the override value.
    fn set_override(&self, value: OverrideValue);
}

/// A vertex that observes whether the walk has excluded it.
pub trait ExclusionAware: Send + Sync {
    /// Tells the vertex it is excluded from this walk.
    fn set_excluded(&self, excluded: bool);
}

/// The singleton root of every dynamically expanded subgraph.
///
/// The sentinel is a canonical value, not a structural marker: subgraph
/// validation compares against its distinguished [`VertexId`].
#[derive(Debug)]
pub struct RootVertex;

impl Vertex for RootVertex {
    fn id(&self) -> VertexId {
        VertexId::root()
    }
}

lazy_static::lazy_static! {
    static ref ROOT_VERTEX: Arc<RootVertex> = Arc::new(RootVertex);
}

/// Returns the shared [`RootVertex`] sentinel.
pub fn root_vertex() -> Arc<dyn Vertex> {
    Arc::clone(&*ROOT_VERTEX) as Arc<dyn Vertex>
}
