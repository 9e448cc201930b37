//! Guard error taxonomy.
//!
//! Three kinds, three audiences:
//! - `Configuration` — the call site cannot derive a usable key or merged
//!   config. Fatal to the call, surfaced immediately, never retried.
//! - `DuplicateRejected` — the normal outcome of a working guard. The only
//!   variant meant to reach end users, carrying the configured message.
//! - `StoreUnavailable` — the atomic store operation could not complete.
//!   Whether the call proceeds is decided by `StoreFailurePolicy`, never
//!   silently retried by the guard itself.

use std::fmt;

/// Error raised by key derivation, config resolution, or a claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    /// No usable key or merged config can be produced for this call.
    Configuration {
        /// What made the call-site configuration unusable.
        reason: String,
    },
    /// A marker already exists for the derived key within its TTL window.
    DuplicateRejected {
        /// Resolved user-facing rejection text.
        message: String,
    },
    /// The store round-trip failed and the policy is fail-closed.
    StoreUnavailable {
        /// Underlying store/transport failure description.
        reason: String,
    },
}

impl GuardError {
    /// True for the expected duplicate-rejection outcome (not a fault).
    pub fn is_duplicate(&self) -> bool {
        matches!(self, GuardError::DuplicateRejected { .. })
    }
}

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardError::Configuration { reason } => {
                write!(f, "guard configuration error: {reason}")
            }
            GuardError::DuplicateRejected { message } => write!(f, "{message}"),
            GuardError::StoreUnavailable { reason } => {
                write!(f, "claim store unavailable: {reason}")
            }
        }
    }
}

impl std::error::Error for GuardError {}
