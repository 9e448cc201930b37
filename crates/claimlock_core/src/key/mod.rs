//! Claim key derivation.
//!
//! A claim key names "this logical operation, as invoked by this caller" and
//! is derived one of two ways:
//! - **Explicit**: an injected extractor maps the call arguments to a
//!   business key (e.g. an order ID). The result never depends on ambient
//!   request context.
//! - **Implicit**: a fingerprint of the ambient request context (caller
//!   token, method, path) plus the rendered arguments. Strictly weaker than
//!   an explicit key: two different business operations with identical
//!   caller, path, and arguments collide. Requires ambient context; its
//!   absence is a configuration error, not a silent fallback.
//!
//! Final key = `prefix + extractor-result-or-fingerprint`.

pub mod fingerprint;

pub use fingerprint::{FingerprintInput, compute_fingerprint, format_fingerprint};

use crate::error::GuardError;

// ─── Call bindings ──────────────────────────────────────────────────────

/// A single named call argument, addressable by name or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallArg<'a> {
    /// Parameter name at the call site.
    pub name: &'a str,
    /// Stable textual rendering of the argument value.
    pub value: &'a str,
}

/// Ambient request context supplied by the caller.
///
/// Always an explicit input; the guard never reads thread-local or global
/// request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext<'a> {
    /// Caller identity credential (e.g. an Authorization header value).
    pub token: Option<&'a str>,
    /// Invocation method/verb.
    pub method: &'a str,
    /// Logical path or operation name.
    pub path: &'a str,
}

/// Everything the key builder may see about one invocation.
///
/// `args` belong to the invocation itself and are always present;
/// `request` is the ambient transport context and may be absent (non-web
/// callers), in which case only explicit key sources can work.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    /// Call arguments, in declaration order.
    pub args: &'a [CallArg<'a>],
    /// Ambient request context, if any.
    pub request: Option<&'a RequestContext<'a>>,
}

/// Look up an argument value by name.
pub fn arg_named<'a>(args: &[CallArg<'a>], name: &str) -> Option<&'a str> {
    args.iter().find(|a| a.name == name).map(|a| a.value)
}

/// Render arguments the way the implicit fingerprint sees them:
/// `[v1, v2, ...]`, values in declaration order.
pub fn render_args(args: &[CallArg<'_>]) -> String {
    let values: Vec<&str> = args.iter().map(|a| a.value).collect();
    format!("[{}]", values.join(", "))
}

// ─── Key source ─────────────────────────────────────────────────────────

/// An injected extractor mapping call arguments to a business key.
///
/// Contract: pure function of the argument bindings, no side effects,
/// deterministic for identical arguments. `None` or an empty string means
/// the extractor could not produce a key and the build fails closed.
pub trait KeyExtractor {
    fn extract(&self, args: &[CallArg<'_>]) -> Option<String>;
}

impl<F> KeyExtractor for F
where
    F: Fn(&[CallArg<'_>]) -> Option<String>,
{
    fn extract(&self, args: &[CallArg<'_>]) -> Option<String> {
        self(args)
    }
}

/// How the claim key for a call is derived.
#[derive(Clone, Copy)]
pub enum KeySource<'a> {
    /// Caller-supplied extractor over the call arguments.
    Explicit(&'a dyn KeyExtractor),
    /// Fingerprint of ambient request context plus rendered arguments.
    Implicit,
}

impl std::fmt::Debug for KeySource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Explicit(_) => f.write_str("Explicit(..)"),
            KeySource::Implicit => f.write_str("Implicit"),
        }
    }
}

// ─── Key builder ────────────────────────────────────────────────────────

/// Derive the claim key for one invocation.
///
/// Explicit sources run the extractor over `context.args` and require a
/// non-empty result. Implicit sources require `context.request` and digest
/// `token:method:path:args` into a fixed-width fingerprint. Either failure
/// is a `GuardError::Configuration`; no store call is attempted for a call
/// whose key cannot be built.
pub fn build_claim_key(
    prefix: &str,
    source: KeySource<'_>,
    context: &CallContext<'_>,
) -> Result<String, GuardError> {
    match source {
        KeySource::Explicit(extractor) => {
            let extracted = extractor.extract(context.args).unwrap_or_default();
            if extracted.is_empty() {
                return Err(GuardError::Configuration {
                    reason: "explicit key extractor produced an empty key".to_string(),
                });
            }
            Ok(format!("{prefix}{extracted}"))
        }
        KeySource::Implicit => {
            let request = context.request.ok_or_else(|| GuardError::Configuration {
                reason: "implicit key source requires ambient request context; \
                         supply an explicit key extractor for non-request callers"
                    .to_string(),
            })?;
            let rendered = render_args(context.args);
            let hash = compute_fingerprint(&FingerprintInput {
                token: request.token.unwrap_or(""),
                method: request.method,
                path: request.path,
                args: &rendered,
            });
            Ok(format!("{prefix}{}", format_fingerprint(hash)))
        }
    }
}
