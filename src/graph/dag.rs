//! Mutable directed acyclic graph with a parallel walk primitive.
//!
//! # Design
//!
//! Vertices are owned by the graph and shared as `Arc<dyn Vertex>`; edges
//! are id pairs kept in two derived adjacency maps:
//! - `down`: dependencies of a vertex (outgoing edges)
//! - `up`: dependents of a vertex (incoming edges)
//!
//! An edge `(from, to)` means `from` depends on `to`, so `to`'s action
//! runs first. Both directions are maintained on every mutation, which
//! gives O(1) access to dependents and dependencies alike.
//!
//! Vertices iterate in insertion order. That order is only a determinism
//! aid for callers; during a walk the edges are the sole ordering
//! guarantee.

use super::error::{GraphError, GraphResult};
use super::vertex::{Vertex, VertexId};
use crate::core::{Diagnostic, Diagnostics};
use futures::FutureExt;
use petgraph::dot::{Config, Dot};
use petgraph::graph::DiGraph;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::debug;

// Type aliases for the boxed per-vertex action type
pub type VertexFuture = Pin<Box<dyn Future<Output = Diagnostics> + Send>>;
pub type WalkFn = Arc<dyn Fn(Arc<dyn Vertex>) -> VertexFuture + Send + Sync>;

/// A directed acyclic graph of work vertices.
///
/// # Example
///
/// ```
/// use hodos::graph::{AcyclicGraph, Vertex, VertexId};
/// use std::sync::Arc;
///
/// #[derive(Debug)]
/// struct Node(&'static str);
///
/// impl Vertex for Node {
///     fn id(&self) -> VertexId {
///         VertexId::new(self.0)
///     }
/// }
///
/// let mut graph = AcyclicGraph::new();
/// graph.add(Arc::new(Node("a")));
/// graph.add(Arc::new(Node("b")));
///
/// // a depends on b: b's action runs first
/// graph.connect(&VertexId::new("a"), &VertexId::new("b")).unwrap();
/// assert!(graph.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AcyclicGraph {
    /// Vertex arena keyed by identity
    vertices: HashMap<VertexId, Arc<dyn Vertex>>,
    /// Insertion order for deterministic iteration
    insertion_order: Vec<VertexId>,
    /// Dependencies: `down[v]` holds what `v` depends on
    down: HashMap<VertexId, BTreeSet<VertexId>>,
    /// Dependents: `up[v]` holds what depends on `v`
    up: HashMap<VertexId, BTreeSet<VertexId>>,
}

impl AcyclicGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns true if the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Adds a vertex. Vertices are merged by identity: adding an id that
    /// is already present keeps the existing vertex.
    pub fn add(&mut self, vertex: Arc<dyn Vertex>) {
        let id = vertex.id();
        if self.vertices.contains_key(&id) {
            return;
        }
        self.insertion_order.push(id.clone());
        self.vertices.insert(id, vertex);
    }

    /// Removes a vertex and every edge incident to it.
    pub fn remove(&mut self, id: &VertexId) {
        if self.vertices.remove(id).is_none() {
            return;
        }
        self.insertion_order.retain(|v| v != id);
        if let Some(deps) = self.down.remove(id) {
            for dep in deps {
                if let Some(set) = self.up.get_mut(&dep) {
                    set.remove(id);
                }
            }
        }
        if let Some(dependents) = self.up.remove(id) {
            for dependent in dependents {
                if let Some(set) = self.down.get_mut(&dependent) {
                    set.remove(id);
                }
            }
        }
    }

    /// Returns true if the vertex exists in the graph.
    pub fn contains(&self, id: &VertexId) -> bool {
        self.vertices.contains_key(id)
    }

    /// Returns the vertex with the given id.
    pub fn vertex(&self, id: &VertexId) -> Option<&Arc<dyn Vertex>> {
        self.vertices.get(id)
    }

    /// Iterates over all vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = &Arc<dyn Vertex>> {
        self.insertion_order
            .iter()
            .filter_map(|id| self.vertices.get(id))
    }

    /// Iterates over all vertex ids in insertion order.
    pub fn vertex_ids(&self) -> impl Iterator<Item = &VertexId> {
        self.insertion_order.iter()
    }

    /// Connects `from` to `to`, meaning `from` depends on `to`.
    ///
    /// Idempotent. Fails with [`GraphError::InvalidEdge`] on a self-loop
    /// and [`GraphError::VertexNotFound`] when either endpoint is absent.
    /// Cycles are not rejected here; [`AcyclicGraph::validate`] reports
    /// them.
    pub fn connect(&mut self, from: &VertexId, to: &VertexId) -> GraphResult<()> {
        if from == to {
            return Err(GraphError::invalid_edge(from.clone()));
        }
        if !self.vertices.contains_key(from) {
            return Err(GraphError::vertex_not_found(from.clone()));
        }
        if !self.vertices.contains_key(to) {
            return Err(GraphError::vertex_not_found(to.clone()));
        }
        self.link(from, to);
        Ok(())
    }

    /// Removes the edge from `from` to `to`, if present.
    pub fn disconnect(&mut self, from: &VertexId, to: &VertexId) {
        if let Some(set) = self.down.get_mut(from) {
            set.remove(to);
        }
        if let Some(set) = self.up.get_mut(to) {
            set.remove(from);
        }
    }

    /// Inserts the edge without endpoint checks. Callers guarantee both
    /// vertices are present and distinct.
    pub(crate) fn link(&mut self, from: &VertexId, to: &VertexId) {
        if from == to || !self.vertices.contains_key(from) || !self.vertices.contains_key(to) {
            return;
        }
        self.down.entry(from.clone()).or_default().insert(to.clone());
        self.up.entry(to.clone()).or_default().insert(from.clone());
    }

    /// The direct dependencies of a vertex.
    pub fn down_edges(&self, id: &VertexId) -> impl Iterator<Item = &VertexId> {
        self.down.get(id).into_iter().flatten()
    }

    /// The direct dependents of a vertex.
    pub fn up_edges(&self, id: &VertexId) -> impl Iterator<Item = &VertexId> {
        self.up.get(id).into_iter().flatten()
    }

    /// Transitive dependencies of a vertex, not including the vertex.
    ///
    /// Ancestors run before the vertex during a walk.
    pub fn ancestors(&self, id: &VertexId) -> BTreeSet<VertexId> {
        self.closure(id, &self.down)
    }

    /// Transitive dependents of a vertex, not including the vertex.
    pub fn descendants(&self, id: &VertexId) -> BTreeSet<VertexId> {
        self.closure(id, &self.up)
    }

    fn closure(
        &self,
        start: &VertexId,
        edges: &HashMap<VertexId, BTreeSet<VertexId>>,
    ) -> BTreeSet<VertexId> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<&VertexId> = edges.get(start).into_iter().flatten().collect();
        while let Some(next) = stack.pop() {
            if seen.insert(next.clone()) {
                stack.extend(edges.get(next).into_iter().flatten());
            }
        }
        seen
    }

    /// Returns the unique vertex with no dependents.
    ///
    /// Fails with [`GraphError::MissingRoot`] on an empty or rootless
    /// graph and [`GraphError::NotConnected`] when several vertices
    /// compete for the root.
    pub fn root(&self) -> GraphResult<Arc<dyn Vertex>> {
        let roots: Vec<&VertexId> = self
            .insertion_order
            .iter()
            .filter(|id| self.up.get(*id).map_or(true, |set| set.is_empty()))
            .collect();
        match roots.as_slice() {
            [] => Err(GraphError::MissingRoot),
            [id] => Ok(Arc::clone(&self.vertices[*id])),
            many => Err(GraphError::not_connected(
                many.iter().map(|id| (*id).clone()).collect(),
            )),
        }
    }

    /// Validates the graph: no cycles, exactly one root.
    pub fn validate(&self) -> GraphResult<()> {
        if self.has_cycle() {
            return Err(GraphError::cyclic("graph contains a cycle"));
        }
        self.root().map(|_| ())
    }

    /// Detects a dependency cycle using three-color DFS.
    pub fn has_cycle(&self) -> bool {
        let mut visited = BTreeSet::new();
        let mut on_stack = BTreeSet::new();
        for id in &self.insertion_order {
            if !visited.contains(id) && self.dfs_has_cycle(id, &mut visited, &mut on_stack) {
                return true;
            }
        }
        false
    }

    fn dfs_has_cycle(
        &self,
        id: &VertexId,
        visited: &mut BTreeSet<VertexId>,
        on_stack: &mut BTreeSet<VertexId>,
    ) -> bool {
        visited.insert(id.clone());
        on_stack.insert(id.clone());

        for dep in self.down_edges(id) {
            if !visited.contains(dep) {
                if self.dfs_has_cycle(dep, visited, on_stack) {
                    return true;
                }
            } else if on_stack.contains(dep) {
                return true;
            }
        }

        on_stack.remove(id);
        false
    }

    /// Removes every edge `(a, c)` for which a longer path `a -> .. -> c`
    /// exists. Preserves reachability.
    pub fn transitive_reduction(&mut self) {
        let ids = self.insertion_order.clone();
        for u in &ids {
            let direct: Vec<VertexId> = self.down_edges(u).cloned().collect();
            for v in &direct {
                for w in self.ancestors(v) {
                    if self.down.get(u).is_some_and(|set| set.contains(&w)) {
                        self.disconnect(u, &w);
                    }
                }
            }
        }
    }

    /// Copies every vertex and edge of `other` into the receiver.
    /// Duplicate vertices are merged by identity.
    pub fn subsume(&mut self, other: &AcyclicGraph) {
        for vertex in other.vertices() {
            self.add(Arc::clone(vertex));
        }
        for (from, deps) in &other.down {
            for to in deps {
                self.link(from, to);
            }
        }
    }

    /// Renders the graph in Graphviz DOT format.
    pub fn to_dot(&self) -> String {
        /// Zero-sized edge weight with an empty `Display` so `Dot` can
        /// render via `Display` (no Debug-escaped quotes on labels).
        struct DotEdge;
        impl std::fmt::Display for DotEdge {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "")
            }
        }

        let mut dot_graph = DiGraph::<String, DotEdge>::new();
        let mut indices = HashMap::new();
        for id in &self.insertion_order {
            indices.insert(id.clone(), dot_graph.add_node(id.to_string()));
        }
        for (from, deps) in &self.down {
            for to in deps {
                if let (Some(&a), Some(&b)) = (indices.get(from), indices.get(to)) {
                    dot_graph.add_edge(a, b, DotEdge);
                }
            }
        }
        format!("{}", Dot::with_config(&dot_graph, &[Config::EdgeNoLabel]))
    }

    /// Renders a plain-text listing: each vertex followed by its indented
    /// dependencies, sorted for stable comparison in tests.
    pub fn as_text(&self) -> String {
        let mut out = String::new();
        let mut ids: Vec<&VertexId> = self.vertices.keys().collect();
        ids.sort();
        for id in ids {
            out.push_str(&format!("{}\n", id));
            for dep in self.down_edges(id) {
                out.push_str(&format!("  {}\n", dep));
            }
        }
        out
    }

    /// Walks the graph in dependency order with maximum parallelism.
    ///
    /// One task is spawned per vertex; a vertex's action starts only once
    /// every dependency's action has completed, and independent vertices
    /// run concurrently. The walk returns the merged diagnostics of every
    /// action.
    ///
    /// A panicking action aborts its own chain: dependents of the
    /// panicked vertex never run, sibling tasks finish, and the panic is
    /// surfaced as an error diagnostic naming the vertex.
    pub async fn walk(&self, action: WalkFn) -> Diagnostics {
        if self.has_cycle() {
            return Diagnostic::error("cannot walk graph: dependency cycle detected").into();
        }

        debug!("walking {} vertices", self.len());

        let mut completions: HashMap<VertexId, (watch::Sender<bool>, watch::Receiver<bool>)> =
            HashMap::new();
        for id in &self.insertion_order {
            completions.insert(id.clone(), watch::channel(false));
        }

        // Dependency receivers are gathered up front, before the senders
        // move into their tasks.
        let mut pending: Vec<(VertexId, Vec<watch::Receiver<bool>>)> = Vec::new();
        for id in &self.insertion_order {
            let deps = self
                .down
                .get(id)
                .into_iter()
                .flatten()
                .filter_map(|dep| completions.get(dep).map(|(_, rx)| rx.clone()))
                .collect();
            pending.push((id.clone(), deps));
        }

        type VisitOutcome = (String, Result<Diagnostics, String>);

        let mut tasks: JoinSet<VisitOutcome> = JoinSet::new();
        for (id, deps) in pending {
            let Some(vertex) = self.vertices.get(&id).map(Arc::clone) else {
                continue;
            };
            let Some((done, _)) = completions.remove(&id) else {
                continue;
            };
            let action = Arc::clone(&action);
            let name = vertex.name();
            tasks.spawn(async move {
                for mut rx in deps {
                    if rx.wait_for(|finished| *finished).await.is_err() {
                        // An upstream visit never completed; leave
                        // without running the action.
                        return (name, Ok(Diagnostics::new()));
                    }
                }
                match AssertUnwindSafe(action(vertex)).catch_unwind().await {
                    Ok(diags) => {
                        let _ = done.send(true);
                        (name, Ok(diags))
                    }
                    // The completion sender drops unsent, so dependents
                    // never run.
                    Err(payload) => (name, Err(panic_message(payload))),
                }
            });
        }

        let mut diags = Diagnostics::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(vertex_diags))) => diags.extend(vertex_diags),
                Ok((name, Err(detail))) => {
                    diags.push(
                        Diagnostic::error(format!("vertex {:?} panicked", name))
                            .with_detail(detail),
                    );
                }
                Err(_) => {}
            }
        }
        diags
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic payload of unknown type".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug)]
    struct Node(&'static str);

    impl Vertex for Node {
        fn id(&self) -> VertexId {
            VertexId::new(self.0)
        }
    }

    fn node(name: &'static str) -> Arc<dyn Vertex> {
        Arc::new(Node(name))
    }

    fn id(name: &str) -> VertexId {
        VertexId::new(name)
    }

    /// a depends on b depends on c
    fn chain() -> AcyclicGraph {
        let mut g = AcyclicGraph::new();
        g.add(node("a"));
        g.add(node("b"));
        g.add(node("c"));
        g.connect(&id("a"), &id("b")).unwrap();
        g.connect(&id("b"), &id("c")).unwrap();
        g
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut g = AcyclicGraph::new();
        g.add(node("a"));
        g.add(node("a"));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut g = AcyclicGraph::new();
        g.add(node("a"));
        let result = g.connect(&id("a"), &id("a"));
        assert!(matches!(result, Err(GraphError::InvalidEdge { .. })));
    }

    #[test]
    fn test_connect_requires_both_endpoints() {
        let mut g = AcyclicGraph::new();
        g.add(node("a"));
        let result = g.connect(&id("a"), &id("missing"));
        assert!(matches!(result, Err(GraphError::VertexNotFound { .. })));
    }

    #[test]
    fn test_edges_both_directions() {
        let g = chain();
        assert_eq!(g.down_edges(&id("a")).collect::<Vec<_>>(), vec![&id("b")]);
        assert_eq!(g.up_edges(&id("b")).collect::<Vec<_>>(), vec![&id("a")]);
        assert_eq!(g.down_edges(&id("c")).count(), 0);
    }

    #[test]
    fn test_ancestors_are_dependencies() {
        let g = chain();
        let ancestors = g.ancestors(&id("a"));
        assert_eq!(ancestors, [id("b"), id("c")].into_iter().collect());
        assert!(g.ancestors(&id("c")).is_empty());
    }

    #[test]
    fn test_descendants_are_dependents() {
        let g = chain();
        let descendants = g.descendants(&id("c"));
        assert_eq!(descendants, [id("a"), id("b")].into_iter().collect());
        assert!(g.descendants(&id("a")).is_empty());
    }

    #[test]
    fn test_root_is_vertex_without_dependents() {
        let g = chain();
        assert_eq!(g.root().unwrap().id(), id("a"));
    }

    #[test]
    fn test_multiple_roots_not_connected() {
        let mut g = AcyclicGraph::new();
        g.add(node("a"));
        g.add(node("b"));
        g.add(node("c"));
        g.connect(&id("a"), &id("c")).unwrap();
        g.connect(&id("b"), &id("c")).unwrap();
        assert!(matches!(g.root(), Err(GraphError::NotConnected { .. })));
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_validate_detects_cycle() {
        let mut g = chain();
        g.connect(&id("c"), &id("a")).unwrap();
        assert!(g.has_cycle());
        assert!(matches!(g.validate(), Err(GraphError::Cyclic { .. })));
    }

    #[test]
    fn test_remove_drops_incident_edges() {
        let mut g = chain();
        g.remove(&id("b"));
        assert!(!g.contains(&id("b")));
        assert_eq!(g.down_edges(&id("a")).count(), 0);
        assert_eq!(g.up_edges(&id("c")).count(), 0);
    }

    #[test]
    fn test_transitive_reduction_removes_shortcut() {
        let mut g = chain();
        g.connect(&id("a"), &id("c")).unwrap();
        g.transitive_reduction();
        // a -> c is implied by a -> b -> c
        assert_eq!(g.down_edges(&id("a")).collect::<Vec<_>>(), vec![&id("b")]);
        assert_eq!(g.down_edges(&id("b")).collect::<Vec<_>>(), vec![&id("c")]);
    }

    #[test]
    fn test_transitive_reduction_idempotent() {
        let mut g = chain();
        g.connect(&id("a"), &id("c")).unwrap();
        g.transitive_reduction();
        let once = g.as_text();
        g.transitive_reduction();
        assert_eq!(g.as_text(), once);
    }

    #[test]
    fn test_subsume_unions_vertices_and_edges() {
        let mut g = AcyclicGraph::new();
        g.add(node("a"));
        g.add(node("b"));
        g.connect(&id("a"), &id("b")).unwrap();

        let mut h = AcyclicGraph::new();
        h.add(node("b"));
        h.add(node("c"));
        h.connect(&id("b"), &id("c")).unwrap();

        g.subsume(&h);
        assert_eq!(g.len(), 3);
        assert_eq!(g.down_edges(&id("a")).collect::<Vec<_>>(), vec![&id("b")]);
        assert_eq!(g.down_edges(&id("b")).collect::<Vec<_>>(), vec![&id("c")]);
    }

    #[test]
    fn test_to_dot_contains_vertices() {
        let g = chain();
        let dot = g.to_dot();
        assert!(dot.contains("\"a\""));
        assert!(dot.contains("\"c\""));
    }

    fn recording_action(log: Arc<Mutex<Vec<String>>>) -> WalkFn {
        Arc::new(move |vertex: Arc<dyn Vertex>| {
            let log = Arc::clone(&log);
            Box::pin(async move {
                log.lock().unwrap().push(vertex.name());
                Diagnostics::new()
            })
        })
    }

    #[tokio::test]
    async fn test_walk_runs_dependencies_first() {
        let g = chain();
        let log = Arc::new(Mutex::new(Vec::new()));
        let diags = g.walk(recording_action(Arc::clone(&log))).await;
        assert!(diags.is_empty());
        assert_eq!(*log.lock().unwrap(), vec!["c", "b", "a"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_walk_runs_independent_vertices_concurrently() {
        // r depends on a, b, c; the three leaves sleep concurrently
        let mut g = AcyclicGraph::new();
        g.add(node("r"));
        for name in ["a", "b", "c"] {
            g.add(node(name));
            g.connect(&id("r"), &id(name)).unwrap();
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        let action: WalkFn = {
            let log = Arc::clone(&log);
            Arc::new(move |vertex: Arc<dyn Vertex>| {
                let log = Arc::clone(&log);
                Box::pin(async move {
                    if vertex.id() != VertexId::new("r") {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                    log.lock().unwrap().push(vertex.name());
                    Diagnostics::new()
                })
            })
        };

        let start = std::time::Instant::now();
        g.walk(action).await;
        let elapsed = start.elapsed();

        // Sequential leaves would need 300ms; allow generous scheduling
        // overhead while still catching serial execution.
        assert!(
            elapsed < Duration::from_millis(250),
            "expected concurrent leaves, walk took {:?}",
            elapsed
        );
        assert_eq!(log.lock().unwrap().last().map(String::as_str), Some("r"));
    }

    #[tokio::test]
    async fn test_walk_panic_becomes_error_and_blocks_dependents() {
        let g = chain();
        let log = Arc::new(Mutex::new(Vec::new()));
        let action: WalkFn = {
            let log = Arc::clone(&log);
            Arc::new(move |vertex: Arc<dyn Vertex>| {
                let log = Arc::clone(&log);
                Box::pin(async move {
                    if vertex.id() == VertexId::new("b") {
                        panic!("boom");
                    }
                    log.lock().unwrap().push(vertex.name());
                    Diagnostics::new()
                })
            })
        };

        let diags = g.walk(action).await;
        assert!(diags.has_errors());
        let summary = diags.errors().next().unwrap().summary().to_string();
        assert!(summary.contains("\"b\" panicked"), "summary: {}", summary);

        // c ran, a was blocked by b's panic
        assert_eq!(*log.lock().unwrap(), vec!["c"]);
    }

    #[tokio::test]
    async fn test_walk_cyclic_graph_reports_error() {
        let mut g = chain();
        g.connect(&id("c"), &id("a")).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let diags = g.walk(recording_action(Arc::clone(&log))).await;
        assert!(diags.has_errors());
        assert!(log.lock().unwrap().is_empty());
    }
}
