//! The stable error code value exposed on the wire.
//!
//! Codes are either numeric (the default tables use integers) or strings
//! (custom method names, caller-supplied identifiers). Whatever a caller
//! configures is carried through verbatim, never reinterpreted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable, machine-readable error code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Code {
    /// A numeric code such as `2011`.
    Int(i64),
    /// A textual code such as `"validate_comment"`.
    Str(String),
}

impl Code {
    /// Returns the numeric value, if this is a numeric code.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Str(_) => None,
        }
    }

    /// Returns the textual value, if this is a textual code.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Int(_) => None,
            Self::Str(value) => Some(value),
        }
    }

    /// True for an empty textual code, which no table accepts.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Str(s) if s.trim().is_empty())
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for Code {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Code {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for Code {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Code {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}
