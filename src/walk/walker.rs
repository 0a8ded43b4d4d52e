//! The walk driver.
//!
//! A [`Walker`] binds a graph traversal to a [`WalkerHost`]: it applies
//! targeting and exclusion before any task launches, then visits every
//! vertex with full parallelism, entering scopes, injecting overrides,
//! executing per-vertex work, and expanding dynamic subgraphs in place.
//!
//! # Concurrency
//!
//! Visits run concurrently, one task per vertex, gated only by edges.
//! The filter is the single piece of shared mutable state; the graph is
//! read-only for the duration of the walk. A sub-walk shares the parent
//! walk's host and filter but re-runs pre-traversal filtering on the
//! subgraph with the expanding vertex's refined targets.

use super::exclude::apply_exclusions;
use super::filter::{FilterLabel, TraversalFilter};
use super::host::{EvalContext, ScopeGuard, VertexScope, WalkerHost};
use super::target::select_targeted_vertices;
use crate::core::{Address, Diagnostic, Diagnostics};
use crate::graph::{AcyclicGraph, Vertex, WalkFn};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Drives one top-level walk over a graph.
///
/// The walker owns the traversal filter for its walk and shares it with
/// every dynamically expanded subgraph, so decisions made at the top
/// level hold all the way down. Create a fresh walker per top-level
/// walk.
///
/// Cloning is cheap: clones share the same host and filter.
#[derive(Clone)]
pub struct Walker {
    host: Arc<dyn WalkerHost>,
    filter: Arc<TraversalFilter>,
}

impl Walker {
    /// Creates a walker for one top-level walk against the given host.
    pub fn new(host: Arc<dyn WalkerHost>) -> Self {
        Self {
            host,
            filter: Arc::new(TraversalFilter::new()),
        }
    }

    /// Returns the walk's traversal filter.
    pub fn filter(&self) -> &TraversalFilter {
        &self.filter
    }

    /// Walks the graph, visiting vertices concurrently in dependency
    /// order, and returns the merged diagnostics of every visit.
    pub async fn walk(&self, graph: &AcyclicGraph) -> Diagnostics {
        let ctx = self.host.eval_context();
        let mut targets = self.host.target_addrs();
        // String ordering keeps pre-traversal filtering order-stable.
        targets.sort();
        self.walk_graph(graph, ctx, targets).await
    }

    async fn walk_graph(
        &self,
        graph: &AcyclicGraph,
        ctx: Arc<dyn EvalContext>,
        targets: Vec<Address>,
    ) -> Diagnostics {
        let excluded = self.host.excluded_addrs();
        if !excluded.is_empty() {
            apply_exclusions(graph, &excluded, &self.filter);
        }

        if targets.is_empty() {
            // No restriction: everything that survived exclusion runs.
            for vertex in graph.vertices() {
                let id = vertex.id();
                if !self.filter.matches(&id, FilterLabel::ExplicitlyExcluded) {
                    self.filter.include(&id);
                }
            }
        } else {
            for id in select_targeted_vertices(graph, &targets) {
                self.filter.include(&id);
            }
            // Whatever targeting did not allow is excluded.
            for vertex in graph.vertices() {
                let id = vertex.id();
                if !self.filter.matches(&id, FilterLabel::Allowed) {
                    self.filter.exclude(&id);
                }
            }
        }

        let action: WalkFn = {
            let walker = self.clone();
            Arc::new(move |vertex: Arc<dyn Vertex>| {
                walker.clone().visit(vertex, Arc::clone(&ctx))
            })
        };
        graph.walk(action).await
    }

    /// One vertex visit, wrapped in a panic barrier.
    ///
    /// A panicking visit logs the vertex name and re-raises without ever
    /// logging completion; the walk driver records the failure so the
    /// top-level walk returns it.
    fn visit(
        self,
        vertex: Arc<dyn Vertex>,
        ctx: Arc<dyn EvalContext>,
    ) -> Pin<Box<dyn Future<Output = Diagnostics> + Send>> {
        Box::pin(async move {
            let name = vertex.name();
            trace!("vertex {:?}: starting visit", name);

            let result = AssertUnwindSafe(self.visit_vertex(&vertex, ctx))
                .catch_unwind()
                .await;
            match result {
                Ok(diags) => {
                    if diags.has_errors() {
                        for diag in diags.errors() {
                            error!("vertex {:?} error: {}", name, diag.summary());
                        }
                        trace!("vertex {:?}: visit complete, with errors", name);
                    } else {
                        trace!("vertex {:?}: visit complete", name);
                    }
                    diags
                }
                Err(payload) => {
                    error!("vertex {:?} panicked", name);
                    std::panic::resume_unwind(payload);
                }
            }
        })
    }

    async fn visit_vertex(
        &self,
        vertex: &Arc<dyn Vertex>,
        ctx: Arc<dyn EvalContext>,
    ) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let name = vertex.name();
        let overrides = self.host.overrides();
        let have_overrides = !overrides.is_empty();

        if have_overrides {
            if let Some(overridable) = vertex.as_overridable() {
                let addr = overridable.resource_instance_addr();
                let provider = overridable.config_provider();
                if let Some(value) = overrides.resource_override(&addr, &provider) {
                    overridable.set_override(value.clone());
                }
            }

            if let Some(provider) = vertex.provider_addr() {
                // Provider config inside an overridden module can never
                // be evaluated. The module address is compared unkeyed
                // because provider configs cannot exist within an
                // expanded instance.
                if overrides.is_overridden(&provider.module().unkeyed()) {
                    debug!(
                        "skipping provider {} found within overridden module",
                        provider
                    );
                    return diags;
                }
            }
        }

        // Scope selection: the groups are mutually exclusive, first
        // match wins.
        let scope = if let Some(custom) = vertex.custom_scope() {
            Some(VertexScope::Custom(custom))
        } else if let Some(addr) = vertex.module_instance() {
            Some(VertexScope::ModuleInstance(addr))
        } else if let Some(addr) = vertex.partial_module() {
            Some(VertexScope::PartialModule(addr))
        } else {
            None
        };

        let (vertex_ctx, _scope_guard) = match scope {
            Some(scope) => {
                trace!("vertex {:?}: belongs to {}", name, scope);
                let (scoped, guard) = ScopeGuard::enter(Arc::clone(&self.host), scope);
                (scoped, Some(guard))
            }
            None => {
                trace!("vertex {:?}: does not belong to any module instance", name);
                (Arc::clone(&ctx), None)
            }
        };

        // The filter may have been populated with a wrapping vertex
        // identity; when this one is not known to be allowed, tell it so
        // it can short-circuit its own work.
        let id = vertex.id();
        if !self.filter.allowed(&id) {
            if let Some(aware) = vertex.as_exclusion_aware() {
                aware.set_excluded(true);
            }
        }

        if let Some(executable) = vertex.as_executable() {
            diags.extend(self.host.execute(Arc::clone(&vertex_ctx), executable).await);
            if diags.has_errors() {
                return diags;
            }
        }

        if let Some(expandable) = vertex.as_expandable() {
            trace!("vertex {:?}: expanding dynamic subgraph", name);
            let sub = match expandable.expand(Arc::clone(&vertex_ctx)).await {
                Ok(Some(sub)) => sub,
                Ok(None) => {
                    trace!("vertex {:?}: produced no dynamic subgraph", name);
                    return diags;
                }
                Err(expand_diags) => {
                    trace!("vertex {:?}: failed expanding dynamic subgraph", name);
                    diags.extend(expand_diags);
                    return diags;
                }
            };

            if let Err(err) = sub.validate() {
                diags.push(
                    Diagnostic::error(format!(
                        "vertex {:?} produced an invalid dynamic subgraph",
                        name
                    ))
                    .with_detail(err.to_string()),
                );
                return diags;
            }
            match sub.root() {
                Ok(root) if root.id().is_root() => {}
                Ok(root) => {
                    diags.push(
                        Diagnostic::error(format!(
                            "vertex {:?} produced an invalid dynamic subgraph",
                            name
                        ))
                        .with_detail(format!(
                            "the subgraph root is {:?}, not the root sentinel",
                            root.name()
                        )),
                    );
                    return diags;
                }
                Err(err) => {
                    diags.push(
                        Diagnostic::error(format!(
                            "vertex {:?} produced an invalid dynamic subgraph",
                            name
                        ))
                        .with_detail(err.to_string()),
                    );
                    return diags;
                }
            }

            trace!("vertex {:?}: entering dynamic subgraph", name);

            // An excluded vertex excludes its entire subgraph.
            if self.filter.matches(&id, FilterLabel::ExplicitlyExcluded) {
                for sub_vertex in sub.vertices() {
                    self.filter.exclude(&sub_vertex.id());
                }
            }

            // A target can be more specific than the expanding vertex
            // itself; the refinement applies inside the subgraph.
            let direct_targets = vertex
                .as_targetable()
                .map(|t| t.direct_targets())
                .unwrap_or_default();

            // The sub-walk starts from the outer context, not the
            // scoped one.
            let sub_diags = self.walk_graph(&sub, ctx, direct_targets).await;
            let failed = sub_diags.has_errors();
            diags.extend(sub_diags);
            if failed {
                trace!("vertex {:?}: dynamic subgraph encountered errors", name);
                return diags;
            }
            trace!("vertex {:?}: dynamic subgraph completed successfully", name);
        }

        diags
    }
}
