//! Newline-delimited JSON procedure calls over a pair of byte streams.
//!
//! A host process registers named procedures in a [`ProcedureRegistry`] and
//! hands the registry to a [`Dispatcher`], which reads one request per line,
//! invokes the named procedure, and writes exactly one response line back:
//!
//! ```text
//! -> {"rpc":{"op":"call"},"procedure":"add","args":[2,3],"kwargs":{}}
//! <- {"rpc":{"op":"return"},"result":5}
//! ```
//!
//! Failures are reported in-band as `error` envelopes carrying a `classe`
//! (the failure category) and a `message`, and the loop keeps serving. See
//! the [`dispatch`] module for the loop itself and [`protocol`] for the wire
//! format.

pub mod dispatch;
pub mod procedure;
pub mod protocol;
pub mod registry;

pub use dispatch::{DispatchError, Dispatcher, ResponseWriter, SessionSummary};
pub use linecall_config::MalformedPolicy;
pub use procedure::{Call, FnProcedure, Procedure, ProcedureError, ResultExt};
pub use protocol::{CallRequest, Operation, ProtocolError, Response, parse_call};
pub use registry::ProcedureRegistry;

#[cfg(test)]
mod tests;
