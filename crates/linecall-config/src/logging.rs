//! Encoding of the log lines written to standard error.
//!
//! Standard output belongs to the protocol, so the format only affects the
//! diagnostic stream.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How each `tracing` event is rendered.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event with the event fields flattened in.
    #[default]
    Json,
    /// Single-line text for reading in a terminal.
    Compact,
}
