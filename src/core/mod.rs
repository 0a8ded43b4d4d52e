//! Foundation types shared by the graph and walk layers.
//!
//! # Domain Model
//! - [`Address`]: opaque ordered address with a containment relation
//! - [`ProviderAddr`]: provider config address (module + local name)
//! - [`Severity`], [`Diagnostic`], [`Diagnostics`]: walk result reporting
//! - [`Overrides`], [`OverrideValue`]: test/mock value substitution
//!
//! This module hides how addresses are rendered and compared; the rest of
//! the crate only sees containment, ordering, and display.

mod address;
mod diagnostic;
mod overrides;

pub use address::{Address, ProviderAddr};
pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use overrides::{OverrideValue, Overrides};
