//! Error types shared across the paged-file, index, and estimator layers.

use std::fmt;
use std::io;

use thiserror::Error;

/// Stable codes describing [`QalshError`] variants, usable for logging or
/// metrics without matching on the full error payload.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum QalshErrorCode {
    /// The underlying paged file could not be read or written.
    Io,
    /// A file did not match the expected binary or JSON layout.
    Format,
    /// A configuration value was out of its valid domain.
    InvalidConfig,
    /// An index, page number, or page offset fell outside its valid range.
    OutOfRange,
    /// A search or scan produced no candidate where one was required.
    EmptyResult,
}

impl QalshErrorCode {
    /// Return the stable machine-readable representation of this code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Io => "QALSH_IO",
            Self::Format => "QALSH_FORMAT",
            Self::InvalidConfig => "QALSH_INVALID_CONFIG",
            Self::OutOfRange => "QALSH_OUT_OF_RANGE",
            Self::EmptyResult => "QALSH_EMPTY_RESULT",
        }
    }
}

impl fmt::Display for QalshErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type produced by every component in this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QalshError {
    /// A read, write, or seek against a paged file failed.
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    /// A file's contents did not match the format this crate expects.
    #[error("malformed {what} in {path}: {reason}")]
    Format {
        path: String,
        what: &'static str,
        reason: String,
    },
    /// A configuration value was out of its valid domain.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
    /// An index, page number, or offset fell outside its valid range.
    #[error("{what} {value} is out of range (limit {limit})")]
    OutOfRange {
        what: &'static str,
        value: i64,
        limit: i64,
    },
    /// A search or estimate had nothing to return.
    #[error("{what} produced no result: {reason}")]
    EmptyResult { what: &'static str, reason: String },
}

impl QalshError {
    /// Retrieve the stable [`QalshErrorCode`] for this error.
    pub const fn code(&self) -> QalshErrorCode {
        match self {
            Self::Io { .. } => QalshErrorCode::Io,
            Self::Format { .. } => QalshErrorCode::Format,
            Self::InvalidConfig { .. } => QalshErrorCode::InvalidConfig,
            Self::OutOfRange { .. } => QalshErrorCode::OutOfRange,
            Self::EmptyResult { .. } => QalshErrorCode::EmptyResult,
        }
    }

    /// Wrap an [`io::Error`] that occurred while touching `path`.
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a [`QalshError::Format`] for `path`.
    pub fn format(path: impl Into<String>, what: &'static str, reason: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            what,
            reason: reason.into(),
        }
    }

    /// Build a [`QalshError::InvalidConfig`].
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Build a [`QalshError::OutOfRange`].
    pub fn out_of_range(what: &'static str, value: i64, limit: i64) -> Self {
        Self::OutOfRange { what, value, limit }
    }

    /// Build a [`QalshError::EmptyResult`].
    pub fn empty_result(what: &'static str, reason: impl Into<String>) -> Self {
        Self::EmptyResult {
            what,
            reason: reason.into(),
        }
    }
}

/// Convenient alias for results returned by this crate.
pub type Result<T> = core::result::Result<T, QalshError>;
