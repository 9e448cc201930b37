//! Guard configuration: process-wide defaults with per-call overrides.
//!
//! Defaults are constructed once at startup and passed into the guard by
//! value. Call sites supply `GuardOverrides`; resolution is last-wins over
//! the defaults and fails closed on an unusable merged value (empty prefix,
//! zero TTL). There is no mutable global configuration anywhere.

use std::time::Duration;

use crate::error::GuardError;

/// Default key namespace prefix.
pub const DEFAULT_PREFIX: &str = "idempotent:";

/// Default claim window in seconds.
pub const DEFAULT_TIMEOUT_S: u64 = 5;

/// Default user-facing rejection text.
pub const DEFAULT_MESSAGE: &str = "too fast, try again";

// ─── Defaults ───────────────────────────────────────────────────────────

/// Process-wide guard defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardDefaults {
    /// Key namespace prefix, must be non-empty.
    pub prefix: String,
    /// Claim window; duplicates within this window are rejected.
    pub ttl: Duration,
    /// User-facing rejection text for duplicate calls.
    pub message: String,
}

impl Default for GuardDefaults {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            ttl: Duration::from_secs(DEFAULT_TIMEOUT_S),
            message: DEFAULT_MESSAGE.to_string(),
        }
    }
}

// ─── Per-call overrides ─────────────────────────────────────────────────

/// Call-site overrides. `None` fields fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardOverrides {
    /// Override the key namespace prefix for this call site.
    pub prefix: Option<String>,
    /// Override the claim window for this call site.
    pub ttl: Option<Duration>,
    /// Override the rejection text for this call site.
    pub message: Option<String>,
}

impl GuardOverrides {
    /// No overrides; resolution yields the defaults unchanged.
    pub fn none() -> Self {
        Self::default()
    }
}

// ─── Resolved configuration ─────────────────────────────────────────────

/// Fully merged configuration for one guarded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGuardConfig {
    pub prefix: String,
    pub ttl: Duration,
    pub message: String,
}

/// Merge call-site overrides over process-wide defaults, last-wins.
///
/// Fail-closed: an empty merged prefix or a zero merged TTL is rejected
/// with `GuardError::Configuration` rather than producing a guard that
/// cannot namespace or expire its markers.
pub fn resolve_guard_config(
    defaults: &GuardDefaults,
    overrides: &GuardOverrides,
) -> Result<ResolvedGuardConfig, GuardError> {
    let prefix = overrides
        .prefix
        .clone()
        .unwrap_or_else(|| defaults.prefix.clone());
    let ttl = overrides.ttl.unwrap_or(defaults.ttl);
    let message = overrides
        .message
        .clone()
        .unwrap_or_else(|| defaults.message.clone());

    if prefix.is_empty() {
        return Err(GuardError::Configuration {
            reason: "merged key prefix is empty".to_string(),
        });
    }
    if ttl.is_zero() {
        return Err(GuardError::Configuration {
            reason: "merged TTL is zero; markers would never be honored".to_string(),
        });
    }

    Ok(ResolvedGuardConfig {
        prefix,
        ttl,
        message,
    })
}
