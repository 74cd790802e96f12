//! Procedure registry keyed by name.
//!
//! The [`ProcedureRegistry`] is populated during startup and then handed to
//! the dispatch loop, which only reads from it. Registering a name twice keeps
//! the most recent handler. Lookups never fail: a miss is reported as `None`
//! and the dispatch loop turns it into an `invalid_procedure` error.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::procedure::{Call, FnProcedure, Procedure, ProcedureError};

/// Tracing target for registry events.
pub(crate) const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Mapping from procedure name to handler.
///
/// # Example
///
/// ```
/// use linecall::{Call, ProcedureRegistry};
///
/// let mut registry = ProcedureRegistry::new();
/// registry.register("add", |call: &Call| {
///     let a: i64 = call.arg(0)?;
///     let b: i64 = call.arg(1)?;
///     Ok(a + b)
/// });
/// assert!(registry.contains("add"));
/// assert!(registry.lookup("sub").is_none());
/// ```
#[derive(Default)]
pub struct ProcedureRegistry {
    procedures: HashMap<String, Box<dyn Procedure>>,
}

impl ProcedureRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a closure under `name`.
    ///
    /// Returns `true` when an earlier handler with the same name was replaced.
    pub fn register<F, T>(&mut self, name: impl Into<String>, handler: F) -> bool
    where
        F: Fn(&Call) -> Result<T, ProcedureError> + Send + Sync + 'static,
        T: Serialize + 'static,
    {
        self.register_procedure(name, FnProcedure::new(handler))
    }

    /// Registers any [`Procedure`] implementation under `name`.
    ///
    /// Returns `true` when an earlier handler with the same name was replaced.
    pub fn register_procedure(
        &mut self,
        name: impl Into<String>,
        procedure: impl Procedure + 'static,
    ) -> bool {
        let name = name.into();
        let replaced = self
            .procedures
            .insert(name.clone(), Box::new(procedure))
            .is_some();
        if replaced {
            debug!(target: REGISTRY_TARGET, procedure = %name, "replaced registered procedure");
        } else {
            debug!(target: REGISTRY_TARGET, procedure = %name, "registered procedure");
        }
        replaced
    }

    /// Looks up a procedure by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&dyn Procedure> {
        self.procedures.get(name).map(|procedure| &**procedure)
    }

    /// Returns `true` when a procedure is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    /// Registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.procedures.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered procedures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    /// Returns `true` when no procedures are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}

impl fmt::Debug for ProcedureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcedureRegistry")
            .field("procedures", &self.names())
            .finish()
    }
}
