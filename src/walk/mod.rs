//! The traversal engine.
//!
//! This module hides how a walk is scheduled and filtered:
//!
//! - [`TraversalFilter`]: the per-walk allowed/excluded overlay
//! - Target selection and exclusion resolution over vertex addresses
//! - [`WalkerHost`]: the contract the embedding engine implements
//! - [`Walker`]: pre-traversal filtering plus the per-vertex visit
//!
//! # Entry Point
//!
//! Build an [`crate::graph::AcyclicGraph`], implement [`WalkerHost`],
//! then:
//!
//! ```ignore
//! let walker = Walker::new(host);
//! let diags = walker.walk(&graph).await;
//! ```

mod exclude;
mod filter;
mod host;
mod target;
mod walker;

pub use exclude::apply_exclusions;
pub use filter::{FilterLabel, TraversalFilter};
pub use host::{EvalContext, VertexScope, WalkerHost};
pub use target::select_targeted_vertices;
pub use walker::Walker;
