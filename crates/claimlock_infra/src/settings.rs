//! Guard settings loaded from JSON.
//!
//! A thin deserialization layer over the core defaults: every field is
//! optional in the file and falls back to the documented default. Unknown
//! fields and unusable values (empty prefix, zero timeout) are rejected
//! rather than papered over.

use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;

use claimlock_core::config::{DEFAULT_MESSAGE, DEFAULT_PREFIX, DEFAULT_TIMEOUT_S, GuardDefaults};
use claimlock_core::guard::StoreFailurePolicy;
use serde::Deserialize;

// ─── Settings ───────────────────────────────────────────────────────────

/// On-disk guard settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuardSettings {
    /// Key namespace prefix.
    pub prefix: String,
    /// Claim window in whole seconds.
    pub timeout_s: u64,
    /// User-facing rejection text.
    pub message: String,
    /// Admit calls unguarded when the store is unreachable.
    pub fail_open: bool,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            timeout_s: DEFAULT_TIMEOUT_S,
            message: DEFAULT_MESSAGE.to_string(),
            fail_open: false,
        }
    }
}

// ─── Errors ─────────────────────────────────────────────────────────────

/// Error loading or validating guard settings.
#[derive(Debug)]
pub enum SettingsError {
    /// Settings file could not be read.
    Io { path: String, source: io::Error },
    /// Settings JSON could not be parsed.
    Parse { reason: String },
    /// Parsed settings contain an unusable value.
    Invalid { reason: String },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io { path, source } => {
                write!(f, "failed to read guard settings from {path}: {source}")
            }
            SettingsError::Parse { reason } => {
                write!(f, "invalid guard settings JSON: {reason}")
            }
            SettingsError::Invalid { reason } => {
                write!(f, "unusable guard settings: {reason}")
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ─── Loading ────────────────────────────────────────────────────────────

impl GuardSettings {
    /// Parse settings from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(json).map_err(|e| SettingsError::Parse {
            reason: e.to_string(),
        })
    }

    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json_str(&contents)
    }

    /// Validate and split into the guard's constructor inputs.
    ///
    /// Fail-closed: an empty prefix or a zero timeout is rejected here,
    /// before a guard is ever built from these settings.
    pub fn into_guard_parts(self) -> Result<(GuardDefaults, StoreFailurePolicy), SettingsError> {
        if self.prefix.is_empty() {
            return Err(SettingsError::Invalid {
                reason: "prefix must be non-empty".to_string(),
            });
        }
        if self.timeout_s == 0 {
            return Err(SettingsError::Invalid {
                reason: "timeout_s must be greater than zero".to_string(),
            });
        }
        let policy = if self.fail_open {
            StoreFailurePolicy::FailOpen
        } else {
            StoreFailurePolicy::FailClosed
        };
        let defaults = GuardDefaults {
            prefix: self.prefix,
            ttl: Duration::from_secs(self.timeout_s),
            message: self.message,
        };
        Ok((defaults, policy))
    }
}
