//! Handler-side view of a call and the failure type handlers raise.
//!
//! A procedure receives a [`Call`] holding the positional and named arguments
//! of one request, and answers with a JSON-serializable value or a
//! [`ProcedureError`]. The error's `classe` becomes the `classe` of the error
//! envelope, so handlers choose it to let clients branch on the failure kind.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

#[cfg(test)]
use mockall::mock;

/// Error category for missing or ill-typed arguments.
pub const INVALID_ARGUMENTS: &str = "InvalidArguments";
/// Error category for results that cannot be encoded as JSON.
pub const SERIALIZATION_ERROR: &str = "SerializationError";
/// Error category for handlers that panicked.
pub const PANIC: &str = "Panic";

/// Arguments of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Call {
    args: Vec<Value>,
    kwargs: Map<String, Value>,
}

impl Call {
    /// Creates a call from positional and named arguments.
    #[must_use]
    pub const fn new(args: Vec<Value>, kwargs: Map<String, Value>) -> Self {
        Self { args, kwargs }
    }

    /// Returns the positional arguments.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Returns the named arguments.
    #[must_use]
    pub const fn kwargs(&self) -> &Map<String, Value> {
        &self.kwargs
    }

    /// Number of positional arguments.
    #[must_use]
    pub fn positional_len(&self) -> usize {
        self.args.len()
    }

    /// Returns `true` when there are no positional or named arguments.
    ///
    /// Unlike [`Call::positional_len`], named arguments count here.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    /// Decodes the positional argument at `index`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArguments` error when the argument is absent or does
    /// not decode as `T`.
    pub fn arg<T: DeserializeOwned>(&self, index: usize) -> Result<T, ProcedureError> {
        let value = self.args.get(index).ok_or_else(|| {
            ProcedureError::invalid_arguments(format!("missing positional argument {index}"))
        })?;
        decode(value, &format!("positional argument {index}"))
    }

    /// Decodes the named argument `name`, if present.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArguments` error when the argument is present but
    /// does not decode as `T`.
    pub fn kwarg<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ProcedureError> {
        self.kwargs
            .get(name)
            .map(|value| decode(value, &format!("argument '{name}'")))
            .transpose()
    }

    /// Decodes a parameter passed either by position or by name.
    ///
    /// Supplying the same parameter both ways is rejected.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArguments` error when the parameter is missing,
    /// supplied twice, or does not decode as `T`.
    pub fn param<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T, ProcedureError> {
        self.optional(index, name)?.ok_or_else(|| {
            ProcedureError::invalid_arguments(format!("missing required argument '{name}'"))
        })
    }

    /// Decodes a parameter that may be omitted, by position or by name.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArguments` error when the parameter is supplied
    /// twice or does not decode as `T`.
    pub fn optional<T: DeserializeOwned>(
        &self,
        index: usize,
        name: &str,
    ) -> Result<Option<T>, ProcedureError> {
        match (self.args.get(index), self.kwargs.get(name)) {
            (Some(_), Some(_)) => Err(ProcedureError::invalid_arguments(format!(
                "got multiple values for argument '{name}'"
            ))),
            (Some(value), None) | (None, Some(value)) => {
                decode(value, &format!("argument '{name}'")).map(Some)
            }
            (None, None) => Ok(None),
        }
    }

    /// Rejects calls with more than `max` positional arguments.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArguments` error naming both counts.
    pub fn at_most(&self, max: usize) -> Result<(), ProcedureError> {
        if self.args.len() > max {
            return Err(ProcedureError::invalid_arguments(format!(
                "takes at most {max} positional arguments but {} were given",
                self.args.len()
            )));
        }
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(value: &Value, what: &str) -> Result<T, ProcedureError> {
    T::deserialize(value)
        .map_err(|error| ProcedureError::invalid_arguments(format!("{what}: {error}")))
}

/// Failure raised by a procedure.
///
/// # Example
///
/// ```
/// use linecall::procedure::{ProcedureError, ResultExt};
///
/// let error = "x".parse::<i64>().or_raise().expect_err("not a number");
/// assert_eq!(error.classe(), "ParseIntError");
///
/// let custom = ProcedureError::new("KeyError", "'missing'");
/// assert_eq!(custom.message(), "'missing'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{classe}: {message}")]
pub struct ProcedureError {
    classe: String,
    message: String,
}

impl ProcedureError {
    /// Creates an error with an explicit category.
    pub fn new(classe: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            classe: classe.into(),
            message: message.into(),
        }
    }

    /// Lifts any error, using its concrete type name as the category.
    pub fn raised<E: std::error::Error>(error: &E) -> Self {
        Self::new(short_type_name::<E>(), error.to_string())
    }

    /// Creates an `InvalidArguments` error.
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(INVALID_ARGUMENTS, message)
    }

    /// Creates a `SerializationError` from a failed result encoding.
    #[must_use]
    pub fn serialization(error: &serde_json::Error) -> Self {
        Self::new(SERIALIZATION_ERROR, error.to_string())
    }

    /// Creates a `Panic` error from a handler panic message.
    pub fn panic(message: impl Into<String>) -> Self {
        Self::new(PANIC, message)
    }

    /// Returns the failure category.
    #[must_use]
    pub const fn classe(&self) -> &str {
        self.classe.as_str()
    }

    /// Returns the failure description.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Converts foreign errors into [`ProcedureError`] inside handlers.
pub trait ResultExt<T> {
    /// Maps the error with [`ProcedureError::raised`].
    ///
    /// # Errors
    ///
    /// Returns the lifted error when `self` is `Err`.
    fn or_raise(self) -> Result<T, ProcedureError>;
}

impl<T, E: std::error::Error> ResultExt<T> for Result<T, E> {
    fn or_raise(self) -> Result<T, ProcedureError> {
        self.map_err(|error| ProcedureError::raised(&error))
    }
}

/// Last path segment of a type name, without generic arguments.
fn short_type_name<E>() -> &'static str {
    let full = type_name::<E>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// A callable registered under a name.
pub trait Procedure: Send + Sync {
    /// Runs the procedure and returns its JSON-encoded result.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcedureError`] when the procedure fails or its result
    /// cannot be encoded.
    fn invoke(&self, call: &Call) -> Result<Value, ProcedureError>;
}

/// Adapts a closure returning any serializable value into a [`Procedure`].
pub struct FnProcedure<F, T> {
    handler: F,
    _output: PhantomData<fn() -> T>,
}

impl<F, T> FnProcedure<F, T>
where
    F: Fn(&Call) -> Result<T, ProcedureError> + Send + Sync,
    T: Serialize,
{
    /// Wraps `handler`.
    pub const fn new(handler: F) -> Self {
        Self {
            handler,
            _output: PhantomData,
        }
    }
}

impl<F, T> Procedure for FnProcedure<F, T>
where
    F: Fn(&Call) -> Result<T, ProcedureError> + Send + Sync,
    T: Serialize,
{
    fn invoke(&self, call: &Call) -> Result<Value, ProcedureError> {
        let output = (self.handler)(call)?;
        serde_json::to_value(output).map_err(|error| ProcedureError::serialization(&error))
    }
}

impl<F, T> fmt::Debug for FnProcedure<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProcedure")
            .field("output", &type_name::<T>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mock! {
    pub Handler {}
    impl Procedure for Handler {
        fn invoke(&self, call: &Call) -> Result<Value, ProcedureError>;
    }
}
