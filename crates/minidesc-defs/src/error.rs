//! Errors raised while adding files to a pool.

use minidesc_core::ArenaError;
use minidesc_table::{DecodeError, ErrorCategory, LinkError};

use crate::features::Edition;

/// Failure to add a file.
///
/// When this is returned nothing from the failed file remains visible in
/// the pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BuildError {
    category: ErrorCategory,
    message: String,
}

impl BuildError {
    pub(crate) fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Malformed, message)
    }

    pub(crate) fn structural(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Structural, message)
    }

    pub(crate) fn unresolved(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Unresolved, message)
    }

    pub(crate) fn duplicate(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Duplicate, message)
    }

    pub(crate) fn decode(err: DecodeError) -> Self {
        Self::new(err.category(), err.to_string())
    }

    pub(crate) fn link(err: LinkError, full_name: &str) -> Self {
        Self::new(err.category(), format!("unable to link {full_name}: {err}"))
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ArenaError> for BuildError {
    fn from(err: ArenaError) -> Self {
        Self::new(ErrorCategory::ResourceExceeded, err.to_string())
    }
}

/// Failure to replace a pool's feature set defaults.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefaultsError {
    #[error("feature set defaults can't be changed once the pool has started building")]
    FrozenDefaults,
    #[error("invalid edition range: {min:?} is after {max:?}")]
    InvalidRange { min: Edition, max: Edition },
    #[error("feature set defaults must be sorted by edition")]
    Unsorted,
    #[error("no feature set defaults cover {0:?}")]
    Uncovered(Edition),
    #[error("feature set defaults for {0:?} leave a feature unset")]
    Incomplete(Edition),
    #[error("invalid feature set defaults: {0}")]
    Parse(String),
}
