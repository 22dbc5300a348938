use std::fmt;

use serde::Deserialize;

use crate::ApiError;

/// Error codes a project reserves for its own errors
///
/// Project-specific errors must fall inside the range unless they are core
/// errors or wrappers of core errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorCodeRange {
    /// Any code is accepted
    #[default]
    AllowAll,
    /// Codes that parse as integers within `start..=end`
    Integer { start: i64, end: i64 },
    /// Codes starting with `prefix`
    Prefix { prefix: String },
}

impl ErrorCodeRange {
    /// Whether the error's code belongs to this range
    pub fn contains(&self, error: &ApiError) -> bool {
        match self {
            Self::AllowAll => true,
            Self::Integer { start, end } => error
                .error_code()
                .trim()
                .parse::<i64>()
                .is_ok_and(|code| (*start..=*end).contains(&code)),
            Self::Prefix { prefix } => error.error_code().starts_with(prefix.as_str()),
        }
    }
}

impl fmt::Display for ErrorCodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllowAll => f.write_str("ALLOW_ALL"),
            Self::Integer { start, end } => write!(f, "{start}..={end}"),
            Self::Prefix { prefix } => write!(f, "{prefix}*"),
        }
    }
}
