//! Hodos: Parallel Dependency-Graph Walker
//!
//! `hodos` (ὁδός, Greek for "way" or "road") is the dependency-graph
//! walker at the heart of a resource orchestration engine. Resources,
//! providers, and module instances are vertices in a directed acyclic
//! graph; edges express must-happen-before ordering; the walker
//! traverses the graph with maximum safe parallelism.
//!
//! # Features
//!
//! - **Parallel traversal**: one task per vertex, gated only by edges
//! - **Targeting and exclusion**: address-based pruning of the walk,
//!   with dependency-closure semantics
//! - **Dynamic expansion**: vertices can emit a nested subgraph at
//!   traversal time, walked in place with inherited filtering
//! - **Scoped evaluation**: per-vertex scope entry and guaranteed exit
//! - **Panic isolation**: a panicking visit is logged, named, and
//!   surfaced as an error diagnostic instead of tearing the walk down
//!
//! # Quick Start
//!
//! ```ignore
//! use hodos::prelude::*;
//!
//! let mut graph = AcyclicGraph::new();
//! graph.add(Arc::new(ProviderNode::new("aws")));
//! graph.add(Arc::new(BucketNode::new("aws_s3.assets")));
//! graph.connect(&VertexId::new("aws_s3.assets"), &VertexId::new("provider.aws"))?;
//!
//! let host: Arc<dyn WalkerHost> = Arc::new(MyHost::default());
//! let walker = Walker::new(host);
//! let diags = walker.walk(&graph).await;
//! assert!(!diags.has_errors());
//! ```
//!
//! # Module Organization
//!
//! Each module hides a design decision that is likely to change:
//!
//! - [`core`]: addresses, diagnostics, overrides (hides address syntax)
//! - [`graph`]: DAG structures and the walk primitive (hides the
//!   adjacency representation)
//! - [`walk`]: filtering and the per-vertex visit (hides scheduling)
//!
//! The walker does not construct graphs, decide what a vertex's work is,
//! or persist state; those belong to the embedding engine behind the
//! [`WalkerHost`] contract.

pub mod core;
pub mod graph;
pub mod walk;

// Re-export commonly used types for convenience
pub use crate::core::{
    Address, Diagnostic, Diagnostics, OverrideValue, Overrides, ProviderAddr, Severity,
};

pub use graph::{
    root_vertex, AcyclicGraph, AddressGraph, Executable, ExclusionAware, Expandable, GraphError,
    GraphResult, Overridable, RootVertex, Targetable, Vertex, VertexId,
};

pub use walk::{EvalContext, FilterLabel, TraversalFilter, VertexScope, Walker, WalkerHost};

// Re-export dependencies that appear in the public API, so embedders
// don't fight version mismatches.
pub use async_trait::async_trait;
pub use serde_json;

/// Prelude module for convenient glob imports
///
/// # Example
///
/// ```ignore
/// use hodos::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{Address, Diagnostic, Diagnostics, Overrides, ProviderAddr, Severity};
    pub use crate::graph::{AcyclicGraph, RootVertex, Vertex, VertexId};
    pub use crate::walk::{EvalContext, Walker, WalkerHost};

    // External types used throughout embedder code
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
