//! DAG structures for resource orchestration.
//!
//! This module provides the graph the walker traverses:
//!
//! - Vertex identity and runtime capabilities ([`Vertex`] and friends)
//! - The mutable [`AcyclicGraph`] with its parallel walk primitive
//! - Reduction to a resource-address-level [`AddressGraph`]
//!
//! The graph hides its adjacency representation; callers see only
//! abstract operations such as `connect`, `ancestors`, and `walk`.

mod dag;
mod error;
mod reduce;
mod vertex;

pub use dag::{AcyclicGraph, VertexFuture, WalkFn};
pub use error::{GraphError, GraphResult};
pub use reduce::AddressGraph;
pub use vertex::{
    root_vertex, Executable, ExclusionAware, Expandable, Overridable, RootVertex, Targetable,
    Vertex, VertexId,
};
