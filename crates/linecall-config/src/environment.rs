//! Deployment profiles and the boolean flag syntax used by environment
//! variables.
//!
//! A profile decides defaults that operators rarely want to spell out, such as
//! whether debug logging is on. Explicit settings always win over the profile.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deployment profile selected at startup.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Local development: debug logging on by default.
    #[default]
    Dev,
    /// Production: debug logging off by default.
    Prod,
}

impl Environment {
    /// Returns the canonical profile name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }

    /// Whether debug logging is enabled when nothing else says otherwise.
    #[must_use]
    pub const fn debug_default(self) -> bool {
        match self {
            Self::Dev => true,
            Self::Prod => false,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a profile name does not match any known [`Environment`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown environment name: {name}")]
pub struct UnknownEnvironment {
    /// The rejected profile name.
    pub name: String,
}

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            _ => Err(UnknownEnvironment {
                name: value.to_owned(),
            }),
        }
    }
}

/// Raised when a boolean flag value is not one of the accepted spellings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid boolean flag '{value}': expected one of 1, true, y, yes, 0, false, n, no")]
pub struct InvalidFlag {
    /// The rejected flag text.
    pub value: String,
}

/// Parses a boolean flag the way environment variables usually spell them.
///
/// # Errors
///
/// Returns [`InvalidFlag`] when the text is not a recognised spelling.
pub fn parse_flag(value: &str) -> Result<bool, InvalidFlag> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "y" | "yes" => Ok(true),
        "0" | "false" | "n" | "no" => Ok(false),
        _ => Err(InvalidFlag {
            value: value.to_owned(),
        }),
    }
}
