//! Implicit request fingerprint.
//!
//! `fingerprint = xxh64(token + ":" + method + ":" + path + ":" + args)`
//!
//! The digest only needs practical uniqueness for length-compression of the
//! key, not tamper-resistance. All inputs MUST be stable textual renderings;
//! wall-clock values never participate, or identical retries would stop
//! colliding.

use xxhash_rust::xxh64::xxh64;

/// Delimiter between fingerprint fields.
pub const FIELD_DELIMITER: &str = ":";

/// Input fields for computing a request fingerprint.
///
/// `token` is the caller identity credential, empty when none is present.
/// `args` is a stable rendering of the call arguments (see
/// [`crate::key::render_args`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintInput<'a> {
    /// Caller identity token, or `""` when no credential is present.
    pub token: &'a str,
    /// Invocation method/verb (e.g. "POST").
    pub method: &'a str,
    /// Logical path or operation name (e.g. "/order/submit").
    pub path: &'a str,
    /// Stable textual rendering of the call arguments.
    pub args: &'a str,
}

/// Compute the fingerprint over the fixed-order, delimiter-joined fields.
pub fn compute_fingerprint(input: &FingerprintInput<'_>) -> u64 {
    let raw = [input.token, input.method, input.path, input.args].join(FIELD_DELIMITER);
    xxh64(raw.as_bytes(), 0)
}

/// Format a fingerprint as a fixed-width lowercase hex string.
pub fn format_fingerprint(hash: u64) -> String {
    format!("{hash:016x}")
}
