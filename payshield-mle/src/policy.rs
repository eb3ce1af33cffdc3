//! What `protect` does when it cannot encrypt.

use crate::error::ShieldError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Behaviour of [`FieldRedactor::protect`](crate::FieldRedactor::protect)
/// when the context is unconfigured or encryption fails.
///
/// `FailOpen` sends the sensitive fields in the clear and logs a warning.
/// `FailClosed` returns the error and nothing is sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtectionPolicy {
    FailOpen,
    #[default]
    FailClosed,
}

impl ProtectionPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ProtectionPolicy::FailOpen => "fail-open",
            ProtectionPolicy::FailClosed => "fail-closed",
        }
    }
}

impl fmt::Display for ProtectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtectionPolicy {
    type Err = ShieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-open" | "open" => Ok(ProtectionPolicy::FailOpen),
            "fail-closed" | "closed" => Ok(ProtectionPolicy::FailClosed),
            other => Err(ShieldError::Configuration(format!(
                "unknown protection policy {other:?} (expected fail-open or fail-closed)"
            ))),
        }
    }
}
