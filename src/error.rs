//! Error types used by the watchvisor runtime and managed units.
//!
//! This module defines two main error enums:
//!
//! - [`RuntimeError`]: structural errors returned by the supervisor itself.
//! - [`UnitError`]: errors raised by a unit's own `start`/`stop` operation.
//!
//! A [`UnitError`] never escapes the supervisor: it is captured into
//! [`UnitState::last_error`](crate::UnitState::last_error) and drives the unit into
//! [`Status::Failed`](crate::Status::Failed). Only [`RuntimeError`] reaches callers.

use std::time::Duration;
use thiserror::Error;

use crate::units::UnitId;

/// # Errors produced by the supervisor runtime.
///
/// These describe misuse of the supervisor (calls before initialization, unknown
/// identities) or conditions of the call itself (cancellation, shutdown grace).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// A start/stop/query call was made before [`Supervisor::initialize`](crate::Supervisor::initialize).
    #[error("supervisor is not initialized")]
    NotInitialized,

    /// [`Supervisor::initialize`](crate::Supervisor::initialize) was called more than once.
    #[error("supervisor is already initialized")]
    AlreadyInitialized,

    /// The identity is not present in the registry.
    #[error("unknown unit '{id}'")]
    UnknownUnit {
        /// The identity that was looked up.
        id: UnitId,
    },

    /// The call's cancellation token was triggered.
    #[error("operation cancelled")]
    Canceled,

    /// Shutdown grace period was exceeded; some units had not settled.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Units that were still starting, running or stopping.
        stuck: Vec<UnitId>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use watchvisor::RuntimeError;
    ///
    /// assert_eq!(RuntimeError::NotInitialized.as_label(), "runtime_not_initialized");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::NotInitialized => "runtime_not_initialized",
            RuntimeError::AlreadyInitialized => "runtime_already_initialized",
            RuntimeError::UnknownUnit { .. } => "runtime_unknown_unit",
            RuntimeError::Canceled => "runtime_canceled",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Errors produced by a unit's start/stop operation.
///
/// Stored verbatim as the unit's `last_error`, so the type is cheap to clone.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    /// The operation failed.
    #[error("operation failed: {reason}")]
    Fail {
        /// The underlying error message.
        reason: String,
    },

    /// The operation observed its cancellation token and gave up.
    #[error("operation cancelled")]
    Canceled,

    /// The operation panicked; the panic was caught by the supervisor.
    #[error("operation panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl UnitError {
    /// Shorthand for [`UnitError::Fail`].
    ///
    /// # Example
    /// ```
    /// use watchvisor::UnitError;
    ///
    /// let err = UnitError::fail("connection refused");
    /// assert_eq!(err.to_string(), "operation failed: connection refused");
    /// ```
    pub fn fail(reason: impl Into<String>) -> Self {
        UnitError::Fail {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            UnitError::Fail { .. } => "unit_failed",
            UnitError::Canceled => "unit_canceled",
            UnitError::Panicked { .. } => "unit_panicked",
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
