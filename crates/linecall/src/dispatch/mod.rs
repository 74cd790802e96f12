//! Line-by-line request dispatch over a pair of byte streams.
//!
//! The [`Dispatcher`] reads one request per line, answers it with exactly one
//! response line, flushes, and only then reads the next line. End of input
//! ends the loop normally.
//!
//! ## Protocol
//!
//! ```json
//! {"rpc":{"op":"call"},"procedure":"add","args":[2,3],"kwargs":{}}
//! ```
//!
//! is answered with
//!
//! ```json
//! {"rpc":{"op":"return"},"result":5}
//! ```
//!
//! ## Failure handling
//!
//! Problems with a request (bad JSON, bad envelope, unsupported `op`, unknown
//! procedure) and failures inside a procedure (including panics) are written
//! back as `error` envelopes and the loop carries on. Blank lines are skipped
//! without a response. Only stream I/O failures, and unparseable lines under
//! [`MalformedPolicy::Abort`], stop the loop with a [`DispatchError`].

mod errors;
mod response;

use std::any::Any;
use std::io::{BufRead, Write};
use std::panic::{self, AssertUnwindSafe};

use linecall_config::MalformedPolicy;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::procedure::{Call, Procedure, ProcedureError};
use crate::protocol::{CallRequest, ProtocolError, Response, parse_call};
use crate::registry::ProcedureRegistry;

pub use self::errors::DispatchError;
pub use self::response::ResponseWriter;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Counters describing a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Non-blank request lines handled.
    pub requests: u64,
    /// `return` envelopes written.
    pub returns: u64,
    /// `error` envelopes written.
    pub errors: u64,
}

impl SessionSummary {
    fn record(&mut self, response: &Response) {
        self.requests += 1;
        if response.is_return() {
            self.returns += 1;
        } else {
            self.errors += 1;
        }
    }
}

/// Reads requests, invokes procedures, and writes responses.
///
/// The dispatcher borrows its registry, so the set of procedures cannot change
/// while a session is running.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
///
/// use linecall::{Call, Dispatcher, ProcedureRegistry};
///
/// let mut registry = ProcedureRegistry::new();
/// registry.register("add", |call: &Call| {
///     let a: i64 = call.arg(0)?;
///     let b: i64 = call.arg(1)?;
///     Ok(a + b)
/// });
///
/// let input = Cursor::new(r#"{"rpc":{"op":"call"},"procedure":"add","args":[2,3],"kwargs":{}}"#);
/// let mut output = Vec::new();
/// Dispatcher::new(&registry)
///     .run(input, &mut output)
///     .expect("session completes");
/// assert_eq!(output, b"{\"rpc\":{\"op\":\"return\"},\"result\":5}\n");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'r> {
    registry: &'r ProcedureRegistry,
    on_malformed: MalformedPolicy,
}

impl<'r> Dispatcher<'r> {
    /// Creates a dispatcher that answers malformed lines with an error envelope.
    #[must_use]
    pub const fn new(registry: &'r ProcedureRegistry) -> Self {
        Self {
            registry,
            on_malformed: MalformedPolicy::Respond,
        }
    }

    /// Sets how lines that are not valid JSON are handled.
    #[must_use]
    pub const fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.on_malformed = policy;
        self
    }

    /// Returns the registry consulted for lookups.
    #[must_use]
    pub const fn registry(&self) -> &'r ProcedureRegistry {
        self.registry
    }

    /// Runs the loop until `input` is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Io`] if reading, writing, or flushing fails,
    /// and [`DispatchError::Malformed`] for an unparseable line when the
    /// policy is [`MalformedPolicy::Abort`].
    pub fn run<R: BufRead, W: Write>(
        &self,
        mut input: R,
        output: W,
    ) -> Result<SessionSummary, DispatchError> {
        let mut writer = ResponseWriter::new(output);
        let mut summary = SessionSummary::default();
        let mut buffer = Vec::new();
        let mut line_number = 0_u64;

        info!(
            target: DISPATCH_TARGET,
            procedures = self.registry.len(),
            "awaiting requests"
        );

        loop {
            buffer.clear();
            if input.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            line_number += 1;

            let Some(response) = self.handle_line(line_number, &buffer)? else {
                continue;
            };
            summary.record(&response);
            writer.write_response(&response)?;
        }

        info!(
            target: DISPATCH_TARGET,
            requests = summary.requests,
            returns = summary.returns,
            errors = summary.errors,
            "input exhausted"
        );
        Ok(summary)
    }

    /// Invokes the procedure named by `request` and builds its response.
    ///
    /// Never fails: every outcome, including an unknown name or a panicking
    /// handler, is expressed as a [`Response`].
    #[must_use]
    pub fn dispatch(&self, request: CallRequest) -> Response {
        let (name, args, kwargs) = request.into_parts();
        let Some(procedure) = self.registry.lookup(&name) else {
            warn!(target: DISPATCH_TARGET, procedure = %name, "unknown procedure");
            return ProtocolError::unknown_procedure(name).to_response();
        };

        debug!(
            target: DISPATCH_TARGET,
            procedure = %name,
            args = args.len(),
            kwargs = kwargs.len(),
            "invoking procedure"
        );

        let call = Call::new(args, kwargs);
        match invoke_guarded(procedure, &call) {
            Ok(result) => Response::success(result),
            Err(error) => {
                debug!(
                    target: DISPATCH_TARGET,
                    procedure = %name,
                    classe = error.classe(),
                    message = error.message(),
                    "procedure failed"
                );
                Response::error(error.classe(), error.message())
            }
        }
    }

    /// Turns one raw input line into zero or one response.
    fn handle_line(
        &self,
        line_number: u64,
        bytes: &[u8],
    ) -> Result<Option<Response>, DispatchError> {
        let parsed = match std::str::from_utf8(bytes) {
            Ok(text) if text.trim().is_empty() => return Ok(None),
            Ok(text) => parse_call(text),
            Err(error) => Err(ProtocolError::malformed(format!(
                "request is not valid UTF-8: {error}"
            ))),
        };

        match parsed {
            Ok(request) => Ok(Some(self.dispatch(request))),
            Err(ProtocolError::MalformedRequest { message })
                if self.on_malformed == MalformedPolicy::Abort =>
            {
                Err(DispatchError::malformed(line_number, message))
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, line = line_number, %error, "rejected request");
                Ok(Some(error.to_response()))
            }
        }
    }
}

/// Invokes `procedure`, converting a panic into a `Panic` error.
fn invoke_guarded(procedure: &dyn Procedure, call: &Call) -> Result<Value, ProcedureError> {
    panic::catch_unwind(AssertUnwindSafe(|| procedure.invoke(call)))
        .unwrap_or_else(|payload| Err(ProcedureError::panic(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_owned()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        String::from("procedure panicked")
    }
}
