//! Error types for graph operations.

use super::vertex::VertexId;
use thiserror::Error;

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur while building or validating a graph
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum GraphError {
    /// The graph contains a dependency cycle
    #[error("cycle in dependency graph: {path}")]
    Cyclic {
        /// Human-readable description of the cycle
        path: String,
    },

    /// The graph has more than one root vertex
    #[error("graph is not connected: multiple roots {roots:?}")]
    NotConnected {
        /// Every vertex with no dependents
        roots: Vec<VertexId>,
    },

    /// The graph has no root vertex at all
    #[error("graph has no root vertex")]
    MissingRoot,

    /// An edge would connect a vertex to itself
    #[error("invalid edge: vertex '{vertex}' cannot depend on itself")]
    InvalidEdge {
        /// The vertex on both ends of the rejected edge
        vertex: VertexId,
    },

    /// An edge endpoint does not exist in the graph
    #[error("vertex not found: {vertex}")]
    VertexNotFound {
        /// The missing vertex
        vertex: VertexId,
    },
}

impl GraphError {
    /// Creates a cycle error with the given description
    pub fn cyclic(path: impl Into<String>) -> Self {
        Self::Cyclic { path: path.into() }
    }

    /// Creates a not-connected error listing the competing roots
    pub fn not_connected(roots: Vec<VertexId>) -> Self {
        Self::NotConnected { roots }
    }

    /// Creates a self-loop edge error
    pub fn invalid_edge(vertex: VertexId) -> Self {
        Self::InvalidEdge { vertex }
    }

    /// Creates a missing-vertex error
    pub fn vertex_not_found(vertex: VertexId) -> Self {
        Self::VertexNotFound { vertex }
    }
}
