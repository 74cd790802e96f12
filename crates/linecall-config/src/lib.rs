//! Shared configuration for the `linecall` host.
//!
//! Settings are layered with `clap`: an explicit command-line flag wins over
//! the matching `LINECALL_*` environment variable, which wins over the
//! built-in default. A few defaults are derived rather than fixed: the
//! deployment [`Environment`] decides whether debug logging is on, and the
//! debug setting in turn decides the default log filter.
//!
//! ```text
//! linecall --environment prod --log-format compact
//! LINECALL_DEBUG=yes linecall
//! ```

mod defaults;
mod environment;
mod logging;
mod policy;

use std::ffi::OsString;

use clap::Parser;
use clap::error::ErrorKind;
use thiserror::Error;

pub use crate::defaults::{
    DEBUG_LOG_FILTER, DEFAULT_LOG_FILTER, default_environment, default_log_filter,
    default_log_format, default_malformed_policy,
};
pub use crate::environment::{Environment, InvalidFlag, UnknownEnvironment, parse_flag};
pub use crate::logging::LogFormat;
pub use crate::policy::MalformedPolicy;

/// Runtime configuration for the host binary.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "linecall",
    version,
    about = "Serve newline-delimited JSON procedure calls over stdin and stdout"
)]
pub struct Config {
    /// Deployment profile (`dev` or `prod`).
    #[arg(long, env = "LINECALL_ENV", default_value_t = default_environment())]
    pub environment: Environment,

    /// Enables debug logging; defaults to the profile's choice when unset.
    #[arg(
        long,
        env = "LINECALL_DEBUG",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = parse_flag
    )]
    pub debug: Option<bool>,

    /// `tracing` filter expression; defaults from the debug setting.
    #[arg(long, env = "LINECALL_LOG_FILTER")]
    pub log_filter: Option<String>,

    /// Log output format (`json` or `compact`).
    #[arg(long, env = "LINECALL_LOG_FORMAT", default_value_t = default_log_format())]
    pub log_format: LogFormat,

    /// Handling of request lines that are not valid JSON (`respond` or `abort`).
    #[arg(long, env = "LINECALL_ON_MALFORMED", default_value_t = default_malformed_policy())]
    pub on_malformed: MalformedPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            debug: None,
            log_filter: None,
            log_format: default_log_format(),
            on_malformed: default_malformed_policy(),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an argument or environment variable is
    /// rejected, or when help or version output was requested.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration from an explicit argument vector.
    ///
    /// The first item is treated as the program name, as with
    /// [`std::env::args_os`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an argument or environment variable is
    /// rejected, or when help or version output was requested.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Ok(Self::try_parse_from(args)?)
    }

    /// Deployment profile in effect.
    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.environment
    }

    /// Whether debug logging is enabled after applying the profile default.
    #[must_use]
    pub fn debug_enabled(&self) -> bool {
        self.debug
            .unwrap_or_else(|| self.environment.debug_default())
    }

    /// Effective `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter
            .as_deref()
            .unwrap_or_else(|| default_log_filter(self.debug_enabled()))
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Handling of request lines that are not valid JSON.
    #[must_use]
    pub const fn on_malformed(&self) -> MalformedPolicy {
        self.on_malformed
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An argument or environment variable was rejected, or help or version
    /// output was requested.
    #[error(transparent)]
    Arguments(#[from] clap::Error),
}

impl ConfigError {
    /// Whether the error only carries help or version text for the user.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        match self {
            Self::Arguments(error) => matches!(
                error.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ),
        }
    }

    /// Prints the message to the stream `clap` chose for it.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub fn print(&self) -> std::io::Result<()> {
        match self {
            Self::Arguments(error) => error.print(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn load(args: &[&str]) -> Result<Config, ConfigError> {
        let argv = std::iter::once("linecall").chain(args.iter().copied());
        Config::load_from_iter(argv)
    }

    #[test]
    fn default_matches_parsed_defaults() {
        let config = load(&[]).expect("load defaults");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn dev_profile_enables_debug_logging() {
        let config = Config::default();
        assert!(config.debug_enabled());
        assert_eq!(config.log_filter(), DEBUG_LOG_FILTER);
    }

    #[test]
    fn prod_profile_disables_debug_logging() {
        let config = load(&["--environment", "prod"]).expect("load prod");
        assert_eq!(config.environment(), Environment::Prod);
        assert!(!config.debug_enabled());
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
    }

    #[rstest]
    #[case::bare(&["--debug"], true)]
    #[case::explicit_no(&["--debug=no"], false)]
    #[case::explicit_one(&["--environment=prod", "--debug", "1"], true)]
    fn debug_flag_overrides_profile(#[case] args: &[&str], #[case] expected: bool) {
        let config = load(args).expect("load debug flag");
        assert_eq!(config.debug_enabled(), expected);
    }

    #[test]
    fn explicit_filter_wins_over_debug_default() {
        let config = load(&["--log-filter", "linecall=trace"]).expect("load filter");
        assert_eq!(config.log_filter(), "linecall=trace");
    }

    #[test]
    fn parses_format_and_policy() {
        let config = load(&["--log-format", "compact", "--on-malformed", "abort"])
            .expect("load format and policy");
        assert_eq!(config.log_format(), LogFormat::Compact);
        assert_eq!(config.on_malformed(), MalformedPolicy::Abort);
    }

    #[test]
    fn rejects_unknown_environment() {
        let error = load(&["--environment", "staging"]).expect_err("staging is unknown");
        assert!(!error.is_informational());
        assert!(
            error.to_string().contains("Unknown environment name: staging"),
            "unexpected message: {error}"
        );
    }

    #[test]
    fn help_is_informational() {
        let error = load(&["--help"]).expect_err("help short-circuits");
        assert!(error.is_informational());
    }
}
