//! Address types for graph vertices.
//!
//! Addresses are rendered dotted paths (`module.app.aws_s3.bucket[0]`)
//! treated as opaque values by the walker. The only structure the walker
//! relies on is containment: a module address contains every address
//! beneath it, and a config-level resource address contains each of its
//! instance addresses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque, ordered address for a resource, module, or provider config.
///
/// Ordering is the total ordering of the rendered string form, which is
/// what keeps target iteration stable across runs.
///
/// # Examples
///
/// ```
/// use hodos::Address;
///
/// let module = Address::new("module.app");
/// let instance = Address::new("module.app.aws_s3.bucket[0]");
/// assert!(module.contains(&instance));
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address {
    raw: String,
}

impl Address {
    /// Creates an address from its rendered form.
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The root module address, which contains every other address.
    pub fn root() -> Self {
        Self { raw: String::new() }
    }

    /// Returns true if this is the root module address.
    pub fn is_root(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the rendered form of the address.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Containment: `self` contains `other` when `other` is `self` itself,
    /// or extends it at a step boundary (`.`) or with an instance key (`[`).
    ///
    /// `aws_s3.a` contains `aws_s3.a[0]` but not `aws_s3.ab`.
    pub fn contains(&self, other: &Address) -> bool {
        if self.is_root() {
            return true;
        }
        match other.raw.strip_prefix(&self.raw) {
            Some("") => true,
            Some(rest) => rest.starts_with('.') || rest.starts_with('['),
            None => false,
        }
    }

    /// Strips the instance key from every step of the address.
    ///
    /// `module.app[0].aws_s3.bucket[1]` becomes `module.app.aws_s3.bucket`.
    /// Used when a per-instance address has to be compared against config
    /// that can never exist inside an expanded instance.
    pub fn unkeyed(&self) -> Address {
        let steps: Vec<&str> = self
            .raw
            .split('.')
            .map(|step| step.split('[').next().unwrap_or(step))
            .collect();
        Address {
            raw: steps.join("."),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.raw)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address::new(s)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Address::new(s)
    }
}

/// Address of a provider configuration: the enclosing module plus the
/// provider's local name.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderAddr {
    module: Address,
    name: String,
}

impl ProviderAddr {
    /// Creates a provider address inside the given module.
    pub fn new(module: Address, name: impl Into<String>) -> Self {
        Self {
            module,
            name: name.into(),
        }
    }

    /// Creates a provider address in the root module.
    pub fn in_root(name: impl Into<String>) -> Self {
        Self::new(Address::root(), name)
    }

    /// Returns the enclosing module address.
    pub fn module(&self) -> &Address {
        &self.module
    }

    /// Returns the provider's local name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ProviderAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_root() {
            write!(f, "provider[\"{}\"]", self.name)
        } else {
            write!(f, "{}.provider[\"{}\"]", self.module, self.name)
        }
    }
}

impl fmt::Debug for ProviderAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderAddr({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_self() {
        let addr = Address::new("aws_s3.a");
        assert!(addr.contains(&addr));
    }

    #[test]
    fn test_contains_instance() {
        let config = Address::new("aws_s3.a");
        let instance = Address::new("aws_s3.a[0]");
        assert!(config.contains(&instance));
        assert!(!instance.contains(&config));
    }

    #[test]
    fn test_contains_module_children() {
        let module = Address::new("module.app");
        assert!(module.contains(&Address::new("module.app.aws_s3.a")));
        assert!(module.contains(&Address::new("module.app[1].aws_s3.a")));
        assert!(!module.contains(&Address::new("module.application.aws_s3.a")));
    }

    #[test]
    fn test_contains_rejects_sibling_prefix() {
        let a = Address::new("aws_s3.a");
        assert!(!a.contains(&Address::new("aws_s3.ab")));
    }

    #[test]
    fn test_root_contains_everything() {
        let root = Address::root();
        assert!(root.contains(&Address::new("aws_s3.a")));
        assert!(root.contains(&Address::new("module.app.aws_s3.a[0]")));
    }

    #[test]
    fn test_unkeyed_strips_instance_keys() {
        let addr = Address::new("module.app[0].aws_s3.bucket[\"blue\"]");
        assert_eq!(addr.unkeyed(), Address::new("module.app.aws_s3.bucket"));
    }

    #[test]
    fn test_string_ordering() {
        let mut addrs = vec![Address::new("b"), Address::new("a"), Address::new("a[0]")];
        addrs.sort();
        assert_eq!(
            addrs,
            vec![Address::new("a"), Address::new("a[0]"), Address::new("b")]
        );
    }

    #[test]
    fn test_provider_addr_display() {
        let root = ProviderAddr::in_root("aws");
        assert_eq!(root.to_string(), "provider[\"aws\"]");

        let nested = ProviderAddr::new(Address::new("module.app"), "aws");
        assert_eq!(nested.to_string(), "module.app.provider[\"aws\"]");
    }
}
