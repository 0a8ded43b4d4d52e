//! Override values for test and mock runs.
//!
//! An override replaces the computed value of a resource instance, or marks
//! a whole module as overridden so the walker skips evaluation that cannot
//! happen inside it. Lookups resolve an exact instance-address entry first
//! and fall back to a provider-level default.

use super::address::{Address, ProviderAddr};
use std::collections::{HashMap, HashSet};

/// The payload substituted for a resource or module's computed value.
pub type OverrideValue = serde_json::Value;

/// The set of overrides a host carries into a walk.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    resources: HashMap<Address, OverrideValue>,
    providers: HashMap<ProviderAddr, OverrideValue>,
    modules: HashSet<Address>,
}

impl Overrides {
    /// Creates an empty override set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an override for a specific resource instance.
    pub fn with_resource(mut self, addr: Address, value: OverrideValue) -> Self {
        self.resources.insert(addr, value);
        self
    }

    /// Registers a default override for every resource of a provider.
    pub fn with_provider_default(mut self, provider: ProviderAddr, value: OverrideValue) -> Self {
        self.providers.insert(provider, value);
        self
    }

    /// Marks a module (by its unkeyed address) as overridden.
    pub fn with_overridden_module(mut self, module: Address) -> Self {
        self.modules.insert(module);
        self
    }

    /// Returns true if no overrides are registered at all.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.providers.is_empty() && self.modules.is_empty()
    }

    /// Looks up the override for a resource instance.
    ///
    /// An entry registered for the exact instance address wins; otherwise
    /// the provider-level default applies, if one exists.
    pub fn resource_override(
        &self,
        addr: &Address,
        provider: &ProviderAddr,
    ) -> Option<&OverrideValue> {
        self.resources
            .get(addr)
            .or_else(|| self.providers.get(provider))
    }

    /// Returns true if the given module address is overridden.
    pub fn is_overridden(&self, module: &Address) -> bool {
        self.modules.contains(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty() {
        let overrides = Overrides::new();
        assert!(overrides.is_empty());
        assert!(!overrides.is_overridden(&Address::new("module.app")));
    }

    #[test]
    fn test_exact_resource_wins_over_provider_default() {
        let provider = ProviderAddr::in_root("aws");
        let addr = Address::new("aws_s3.a[0]");
        let overrides = Overrides::new()
            .with_provider_default(provider.clone(), json!({"id": "default"}))
            .with_resource(addr.clone(), json!({"id": "exact"}));

        assert_eq!(
            overrides.resource_override(&addr, &provider),
            Some(&json!({"id": "exact"}))
        );
        assert_eq!(
            overrides.resource_override(&Address::new("aws_s3.b"), &provider),
            Some(&json!({"id": "default"}))
        );
    }

    #[test]
    fn test_module_membership() {
        let overrides = Overrides::new().with_overridden_module(Address::new("module.mocked"));
        assert!(overrides.is_overridden(&Address::new("module.mocked")));
        assert!(!overrides.is_overridden(&Address::new("module.real")));
        assert!(!overrides.is_empty());
    }
}
