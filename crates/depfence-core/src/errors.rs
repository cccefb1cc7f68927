//! Error types for depfence-core.
//!
//! Every fallible core operation returns [`FenceResult`]. Errors carry a
//! stable kind so callers (CLI, embedders) can branch on the failure class
//! without parsing messages.

use thiserror::Error;

pub type FenceResult<T> = Result<T, FenceError>;

#[derive(Debug, Error)]
pub enum FenceError {
    /// A caller-supplied value is structurally invalid (empty scope, empty rule, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A package pattern failed to compile.
    #[error("invalid pattern `{pattern}`: {reason}")]
    Pattern { pattern: String, reason: String },

    /// JSON decoding or encoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Dependency resolution of a package failed.
    #[error("resolution error: {0}")]
    Resolve(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal invariant does not hold.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl FenceError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn resolve(msg: impl Into<String>) -> Self {
        Self::Resolve(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }
}

impl From<serde_json::Error> for FenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
