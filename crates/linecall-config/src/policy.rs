//! Handling policy for request lines that are not valid JSON.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What the dispatch loop does with a line it cannot parse as JSON.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MalformedPolicy {
    /// Answer with a `MalformedRequest` error envelope and keep reading.
    #[default]
    Respond,
    /// Stop the loop and surface the parse failure to the caller.
    Abort,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn defaults_to_respond() {
        assert_eq!(MalformedPolicy::default(), MalformedPolicy::Respond);
    }

    #[test]
    fn parses_abort() {
        assert_eq!(
            MalformedPolicy::from_str("ABORT").expect("parse policy"),
            MalformedPolicy::Abort
        );
    }
}
