//! Process wiring for the `linecall` binary.
//!
//! The binary loads [`Config`], installs telemetry on standard error, and
//! serves the demonstration procedures from [`builtins`] over standard input
//! and output until the input ends.

pub mod builtins;
pub mod telemetry;

use std::io::{BufRead, Write};

use linecall::{DispatchError, Dispatcher, ProcedureRegistry, SessionSummary};
use linecall_config::Config;
use tracing::info;

pub use builtins::{KvStore, register_builtins};
pub use telemetry::{TelemetryError, TelemetryHandle};

const HOST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::host");

/// Exit status used when configuration or telemetry setup fails.
pub const SETUP_FAILURE: u8 = 2;

/// Serves the demonstration procedures until `input` is exhausted.
///
/// # Errors
///
/// Returns the [`DispatchError`] that ended the loop early.
pub fn serve<R: BufRead, W: Write>(
    config: &Config,
    input: R,
    output: W,
) -> Result<SessionSummary, DispatchError> {
    let mut registry = ProcedureRegistry::new();
    register_builtins(&mut registry, &KvStore::new());

    info!(
        target: HOST_TARGET,
        environment = %config.environment(),
        on_malformed = %config.on_malformed(),
        procedures = ?registry.names(),
        "serving procedures"
    );

    Dispatcher::new(&registry)
        .with_malformed_policy(config.on_malformed())
        .run(input, output)
}
