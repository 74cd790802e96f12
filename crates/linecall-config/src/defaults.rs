use crate::environment::Environment;
use crate::logging::LogFormat;
use crate::policy::MalformedPolicy;

/// Log filter applied when debug logging is off and no filter is configured.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Log filter applied when debug logging is on and no filter is configured.
pub const DEBUG_LOG_FILTER: &str = "debug";

/// Default log filter expression for the given debug setting.
#[must_use]
pub const fn default_log_filter(debug: bool) -> &'static str {
    if debug {
        DEBUG_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    }
}

/// Default logging format for the host binary.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default deployment profile.
#[must_use]
pub const fn default_environment() -> Environment {
    Environment::Dev
}

/// Default handling of request lines that are not valid JSON.
#[must_use]
pub const fn default_malformed_policy() -> MalformedPolicy {
    MalformedPolicy::Respond
}
