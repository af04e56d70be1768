//! Uniform success/failure shape for presentation layers.
//!
//! A [`Reply`] serializes as `{"success": true, ...value}` or
//! `{"success": false, "error": "<display string>", "kind": {...}}`. The display
//! string comes from the [`Operation`]; the underlying error is logged and only its
//! [`ErrorKind`] tag is kept.

use crate::{Error, ErrorKind, Operation, Result};
use serde::Serialize;

/// Boundary result of one public operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply<T> {
    /// Operation succeeded.
    Success {
        /// Always `true`.
        success: bool,
        /// Operation payload, flattened into the object.
        #[serde(flatten)]
        value: T,
    },
    /// Operation failed.
    Failure {
        /// Always `false`.
        success: bool,
        /// Short human string for display.
        error: &'static str,
        /// Cause classification.
        kind: ErrorKind,
    },
}

impl<T> Reply<T> {
    /// Wrap a successful value.
    pub fn success(value: T) -> Self {
        Self::Success {
            success: true,
            value,
        }
    }

    /// Collapse an error into the display string for `operation`, logging the cause.
    pub fn failure(operation: Operation, err: &Error) -> Self {
        log::warn!("{}: {err}", operation.failure_message());
        Self::Failure {
            success: false,
            error: operation.failure_message(),
            kind: err.kind(),
        }
    }

    /// Convert an operation result into a reply.
    pub fn from_result(operation: Operation, result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::success(value),
            Err(err) => Self::failure(operation, &err),
        }
    }

    /// `true` for [`Reply::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Display string of a failure.
    pub fn error(&self) -> Option<&'static str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }

    /// Transform the success value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        match self {
            Self::Success { success, value } => Reply::Success {
                success,
                value: f(value),
            },
            Self::Failure {
                success,
                error,
                kind,
            } => Reply::Failure {
                success,
                error,
                kind,
            },
        }
    }
}

/// Payload for operations that succeed without data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Done {}
