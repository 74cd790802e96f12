//! Envelope types for the line protocol.
//!
//! Every message is one JSON object on one line. The object always carries an
//! `rpc` key whose `op` field says what the rest of the object means:
//!
//! ```json
//! {"rpc":{"op":"call"},"procedure":"add","args":[2,3],"kwargs":{}}
//! {"rpc":{"op":"return"},"result":5}
//! {"rpc":{"op":"error"},"classe":"invalid_procedure","message":"missing"}
//! ```
//!
//! Inbound lines are validated step by step so that each failure maps to a
//! distinct [`ProtocolError`] and therefore a distinct `classe`.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Error category for lines that are not valid JSON.
pub const MALFORMED_REQUEST: &str = "MalformedRequest";
/// Error category for JSON objects that do not have the envelope shape.
pub const INVALID_ENVELOPE: &str = "InvalidEnvelope";
/// Error category for envelopes whose `op` is not `call`.
pub const INVALID_OPERATION: &str = "InvalidOperation";
/// Error category for calls naming a procedure that is not registered.
pub const INVALID_PROCEDURE: &str = "invalid_procedure";

/// Discriminator carried in `rpc.op`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Inbound procedure invocation.
    Call,
    /// Outbound successful result.
    Return,
    /// Outbound failure.
    Error,
}

impl Operation {
    /// Returns the wire name of the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Return => "return",
            Self::Error => "error",
        }
    }
}

/// The `rpc` object present on every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcHeader {
    op: Operation,
}

impl RpcHeader {
    /// Creates a header for the given operation.
    #[must_use]
    pub const fn new(op: Operation) -> Self {
        Self { op }
    }

    /// Returns the operation.
    #[must_use]
    pub const fn op(&self) -> Operation {
        self.op
    }
}

/// A validated `call` envelope.
///
/// `args` and `kwargs` default to empty when the caller omits them.
///
/// # Example
///
/// ```
/// use linecall::protocol::parse_call;
///
/// let request = parse_call(r#"{"rpc":{"op":"call"},"procedure":"add","args":[2,3]}"#)
///     .expect("valid call");
/// assert_eq!(request.procedure(), "add");
/// assert_eq!(request.args().len(), 2);
/// assert!(request.kwargs().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CallRequest {
    procedure: String,
    #[serde(default)]
    args: Vec<Value>,
    #[serde(default)]
    kwargs: Map<String, Value>,
}

impl CallRequest {
    /// Creates a call with positional and named arguments.
    #[must_use]
    pub fn new(procedure: impl Into<String>, args: Vec<Value>, kwargs: Map<String, Value>) -> Self {
        Self {
            procedure: procedure.into(),
            args,
            kwargs,
        }
    }

    /// Returns the requested procedure name.
    #[must_use]
    pub const fn procedure(&self) -> &str {
        self.procedure.as_str()
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

    /// Splits the request into its procedure name and arguments.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<Value>, Map<String, Value>) {
        (self.procedure, self.args, self.kwargs)
    }
}

impl Serialize for CallRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("rpc", &RpcHeader::new(Operation::Call))?;
        map.serialize_entry("procedure", &self.procedure)?;
        map.serialize_entry("args", &self.args)?;
        map.serialize_entry("kwargs", &self.kwargs)?;
        map.end()
    }
}

/// An outbound envelope: exactly one is written per request line.
///
/// Serialization always emits `rpc` first, followed by `result` for returns or
/// `classe` then `message` for errors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawResponse")]
pub enum Response {
    /// Successful invocation.
    Return {
        /// Value produced by the procedure.
        result: Value,
    },
    /// Failed request or invocation.
    Error {
        /// Failure category name.
        classe: String,
        /// Human-readable description.
        message: String,
    },
}

impl Response {
    /// Creates a `return` envelope.
    #[must_use]
    pub const fn success(result: Value) -> Self {
        Self::Return { result }
    }

    /// Creates an `error` envelope.
    #[must_use]
    pub fn error(classe: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            classe: classe.into(),
            message: message.into(),
        }
    }

    /// Returns the operation written into `rpc.op`.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Return { .. } => Operation::Return,
            Self::Error { .. } => Operation::Error,
        }
    }

    /// Returns `true` for `return` envelopes.
    #[must_use]
    pub const fn is_return(&self) -> bool {
        matches!(self, Self::Return { .. })
    }

    /// Returns the failure category of an `error` envelope.
    #[must_use]
    pub fn classe(&self) -> Option<&str> {
        match self {
            Self::Return { .. } => None,
            Self::Error { classe, .. } => Some(classe.as_str()),
        }
    }

    /// Parses one outbound line, as a client on the other end of the pipe would.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not a well-formed `return` or `error`
    /// envelope.
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim_end())
    }
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let header = RpcHeader::new(self.operation());
        match self {
            Self::Return { result } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("rpc", &header)?;
                map.serialize_entry("result", result)?;
                map.end()
            }
            Self::Error { classe, message } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("rpc", &header)?;
                map.serialize_entry("classe", classe)?;
                map.serialize_entry("message", message)?;
                map.end()
            }
        }
    }
}

#[derive(Deserialize)]
struct RawResponse {
    rpc: RpcHeader,
    #[serde(default)]
    result: Value,
    classe: Option<String>,
    message: Option<String>,
}

impl TryFrom<RawResponse> for Response {
    type Error = String;

    fn try_from(raw: RawResponse) -> Result<Self, String> {
        match raw.rpc.op() {
            Operation::Return => Ok(Self::Return { result: raw.result }),
            Operation::Error => match (raw.classe, raw.message) {
                (Some(classe), Some(message)) => Ok(Self::Error { classe, message }),
                _ => Err(String::from("error envelope requires classe and message")),
            },
            Operation::Call => Err(String::from("call is not a response operation")),
        }
    }
}

/// Failures detected before a procedure is invoked.
///
/// Each variant carries its own `classe` so a client can tell them apart
/// programmatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The line is not valid JSON (or not valid UTF-8).
    #[error("malformed request: {message}")]
    MalformedRequest {
        /// Parser diagnostic.
        message: String,
    },
    /// The JSON does not have the envelope shape.
    #[error("invalid envelope: {message}")]
    InvalidEnvelope {
        /// Description of the violated expectation.
        message: String,
    },
    /// `rpc.op` names an operation this side does not accept.
    #[error("Can't handle the RPC operation: {operation}")]
    InvalidOperation {
        /// The operation value received.
        operation: String,
    },
    /// No procedure is registered under the requested name.
    #[error("unknown procedure: {name}")]
    UnknownProcedure {
        /// The requested procedure name.
        name: String,
    },
}

impl ProtocolError {
    /// Creates a malformed request error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }

    /// Creates an invalid envelope error.
    pub fn invalid_envelope(message: impl Into<String>) -> Self {
        Self::InvalidEnvelope {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(operation: impl Into<String>) -> Self {
        Self::InvalidOperation {
            operation: operation.into(),
        }
    }

    /// Creates an unknown procedure error.
    pub fn unknown_procedure(name: impl Into<String>) -> Self {
        Self::UnknownProcedure { name: name.into() }
    }

    /// Returns the `classe` written into the error envelope.
    #[must_use]
    pub const fn classe(&self) -> &'static str {
        match self {
            Self::MalformedRequest { .. } => MALFORMED_REQUEST,
            Self::InvalidEnvelope { .. } => INVALID_ENVELOPE,
            Self::InvalidOperation { .. } => INVALID_OPERATION,
            Self::UnknownProcedure { .. } => INVALID_PROCEDURE,
        }
    }

    /// Returns the `message` written into the error envelope.
    ///
    /// Unknown procedures report the bare name so clients can match on it.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::MalformedRequest { message } | Self::InvalidEnvelope { message } => {
                message.clone()
            }
            Self::UnknownProcedure { name } => name.clone(),
            Self::InvalidOperation { .. } => self.to_string(),
        }
    }

    /// Converts the failure into the envelope sent to the client.
    #[must_use]
    pub fn to_response(&self) -> Response {
        Response::error(self.classe(), self.message())
    }
}

/// Parses and validates one inbound line as a `call` envelope.
///
/// # Errors
///
/// - [`ProtocolError::MalformedRequest`] when the line is not JSON.
/// - [`ProtocolError::InvalidEnvelope`] when `rpc.op` is missing or the call
///   fields have the wrong types.
/// - [`ProtocolError::InvalidOperation`] when `rpc.op` is not `"call"`.
pub fn parse_call(line: &str) -> Result<CallRequest, ProtocolError> {
    let value: Value = serde_json::from_str(line.trim())
        .map_err(|error| ProtocolError::malformed(error.to_string()))?;

    let operation = envelope_operation(&value)?;
    if operation != Operation::Call.as_str() {
        return Err(ProtocolError::invalid_operation(operation));
    }

    CallRequest::deserialize(value)
        .map_err(|error| ProtocolError::invalid_envelope(error.to_string()))
}

fn envelope_operation(value: &Value) -> Result<&str, ProtocolError> {
    let envelope = value
        .as_object()
        .ok_or_else(|| ProtocolError::invalid_envelope("request must be a JSON object"))?;
    let header = envelope
        .get("rpc")
        .and_then(Value::as_object)
        .ok_or_else(|| ProtocolError::invalid_envelope("request must carry an 'rpc' object"))?;
    match header.get("op") {
        Some(Value::String(op)) => Ok(op.as_str()),
        Some(_) => Err(ProtocolError::invalid_envelope("'rpc.op' must be a string")),
        None => Err(ProtocolError::invalid_envelope("'rpc.op' is missing")),
    }
}

#[cfg(test)]
mod tests;
