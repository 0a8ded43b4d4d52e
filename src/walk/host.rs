//! The contract between the walker and its host.
//!
//! The walker decides *when* each vertex is visited; the host decides
//! *what* a visit does. Everything the walker needs from its embedder
//! goes through [`WalkerHost`]: evaluation contexts, target and
//! exclusion addresses, scope management, per-vertex execution, and
//! overrides.

use crate::core::{Address, Diagnostics, Overrides};
use crate::graph::Executable;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Opaque scoped evaluation handle produced by the host.
///
/// The walker never looks inside a context; it only threads the right
/// one into each visit. Hosts downcast to their own concrete type.
pub trait EvalContext: Send + Sync + fmt::Debug {}

/// The evaluation scope a vertex belongs to, in probe order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VertexScope {
    /// An arbitrary named evaluation scope.
    Custom(String),
    /// A fully expanded module instance.
    ModuleInstance(Address),
    /// A partially expanded module path.
    PartialModule(Address),
}

impl fmt::Display for VertexScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VertexScope::Custom(name) => write!(f, "{}", name),
            VertexScope::ModuleInstance(addr) => write!(f, "{}", addr),
            VertexScope::PartialModule(addr) => write!(f, "all of {}", addr),
        }
    }
}

/// The interface a walk consumes.
///
/// Scope handling must tolerate concurrent enters of disjoint scopes;
/// the walker guarantees that enters and exits for one vertex are
/// strictly nested and that every entered scope is exited, on every
/// path out of a visit.
#[async_trait]
pub trait WalkerHost: Send + Sync {
    /// The context a top-level walk starts from.
    fn eval_context(&self) -> Arc<dyn EvalContext>;

    /// Addresses the walk is restricted to. Empty means no restriction.
    fn target_addrs(&self) -> Vec<Address>;

    /// Addresses removed from the walk, together with their dependents.
    fn excluded_addrs(&self) -> Vec<Address>;

    /// Enters a scope, returning the child context for it.
    fn enter_scope(&self, scope: &VertexScope) -> Arc<dyn EvalContext>;

    /// Releases a scope previously entered.
    fn exit_scope(&self, scope: &VertexScope);

    /// Performs the per-vertex work. Cancellation, throttling, and
    /// retries all live here; the walker only observes diagnostics.
    async fn execute(&self, ctx: Arc<dyn EvalContext>, vertex: &dyn Executable) -> Diagnostics;

    /// The override set for test/mock runs.
    fn overrides(&self) -> Arc<Overrides>;
}

/// Releases a scope on drop, so exits happen on every path out of a
/// visit, early returns and panics included.
pub(crate) struct ScopeGuard {
    host: Arc<dyn WalkerHost>,
    scope: VertexScope,
}

impl ScopeGuard {
    /// Enters the scope on the host and arms the guard.
    pub(crate) fn enter(
        host: Arc<dyn WalkerHost>,
        scope: VertexScope,
    ) -> (Arc<dyn EvalContext>, Self) {
        let ctx = host.enter_scope(&scope);
        (ctx, Self { host, scope })
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.host.exit_scope(&self.scope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct Ctx;

    impl EvalContext for Ctx {}

    #[derive(Default)]
    struct CountingHost {
        entered: AtomicUsize,
        exited: AtomicUsize,
        scopes: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WalkerHost for CountingHost {
        fn eval_context(&self) -> Arc<dyn EvalContext> {
            Arc::new(Ctx)
        }

        fn target_addrs(&self) -> Vec<Address> {
            Vec::new()
        }

        fn excluded_addrs(&self) -> Vec<Address> {
            Vec::new()
        }

        fn enter_scope(&self, scope: &VertexScope) -> Arc<dyn EvalContext> {
            self.entered.fetch_add(1, Ordering::SeqCst);
            self.scopes.lock().unwrap().push(scope.to_string());
            Arc::new(Ctx)
        }

        fn exit_scope(&self, _scope: &VertexScope) {
            self.exited.fetch_add(1, Ordering::SeqCst);
        }

        async fn execute(
            &self,
            _ctx: Arc<dyn EvalContext>,
            _vertex: &dyn Executable,
        ) -> Diagnostics {
            Diagnostics::new()
        }

        fn overrides(&self) -> Arc<Overrides> {
            Arc::new(Overrides::new())
        }
    }

    #[test]
    fn test_scope_guard_exits_on_drop() {
        let host = Arc::new(CountingHost::default());
        {
            let (_ctx, _guard) = ScopeGuard::enter(
                Arc::clone(&host) as Arc<dyn WalkerHost>,
                VertexScope::ModuleInstance(Address::new("module.app")),
            );
            assert_eq!(host.entered.load(Ordering::SeqCst), 1);
            assert_eq!(host.exited.load(Ordering::SeqCst), 0);
        }
        assert_eq!(host.exited.load(Ordering::SeqCst), 1);
        assert_eq!(*host.scopes.lock().unwrap(), vec!["module.app"]);
    }

    #[test]
    fn test_scope_guard_exits_on_panic() {
        let host = Arc::new(CountingHost::default());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let (_ctx, _guard) = ScopeGuard::enter(
                Arc::clone(&host) as Arc<dyn WalkerHost>,
                VertexScope::Custom("ephemeral".to_string()),
            );
            panic!("visit failed");
        }));
        assert!(result.is_err());
        assert_eq!(host.exited.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(
            VertexScope::ModuleInstance(Address::new("module.app")).to_string(),
            "module.app"
        );
        assert_eq!(
            VertexScope::PartialModule(Address::new("module.each")).to_string(),
            "all of module.each"
        );
        assert_eq!(VertexScope::Custom("validate".into()).to_string(), "validate");
    }
}
