//! Incoming request verification.
//!
//! This module implements the verification flow:
//!
//! 1. Read the authentication headers in protocol order (version, which must
//!    be at least the configured minimum, then timestamp, digest, cloud id).
//! 2. Resolve the master key for the cloud id.
//! 3. Rebuild the request URL as the server received it.
//! 4. Recompute the digest over `timestamp || uppercase(url) || key`.
//! 5. Compare it to the supplied digest in constant time.
//! 6. Optionally check that the timestamp lies within a freshness window.
//!
//! The first failing step decides the outcome. Every failure produces an
//! [`AuthOutcome::Rejected`]; nothing panics or escapes as a server error.
//!
//! The main entry point is [`Verifier::authenticate`].

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use pcmesh_core::{DigestAlgorithm, PcMeshConfig};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::digest::compute_digest_with;
use crate::error::AuthError;
use crate::headers::{AuthenticationHeaders, CURRENT_VERSION};
use crate::keys::KeyResolver;
use crate::principal::{AuthOutcome, Principal};

/// Verifies authentication headers of incoming requests.
///
/// Holds no per-request state; clones share the resolver and can be used
/// from any number of tasks at once.
#[derive(Clone)]
pub struct Verifier {
    resolver: Arc<dyn KeyResolver>,
    min_version: i32,
    algorithm: DigestAlgorithm,
    max_clock_skew_ms: Option<u64>,
    url_scheme: String,
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("resolver", &"...")
            .field("min_version", &self.min_version)
            .field("algorithm", &self.algorithm)
            .field("max_clock_skew_ms", &self.max_clock_skew_ms)
            .field("url_scheme", &self.url_scheme)
            .finish()
    }
}

impl Verifier {
    /// Create a verifier with the default policy: minimum version
    /// [`CURRENT_VERSION`], xxHash64 digests, no freshness window, and `http`
    /// as the scheme of origin-form requests.
    pub fn new(resolver: Arc<dyn KeyResolver>) -> Self {
        Self {
            resolver,
            min_version: CURRENT_VERSION,
            algorithm: DigestAlgorithm::default(),
            max_clock_skew_ms: None,
            url_scheme: "http".to_owned(),
        }
    }

    /// Create a verifier from node configuration.
    pub fn from_config(config: &PcMeshConfig, resolver: Arc<dyn KeyResolver>) -> Self {
        Self::new(resolver)
            .with_min_version(config.min_version)
            .with_algorithm(config.digest_algorithm)
            .with_max_clock_skew(config.max_clock_skew_ms)
            .with_url_scheme(config.url_scheme.clone())
    }

    /// Set the lowest protocol version accepted.
    #[must_use]
    pub fn with_min_version(mut self, min_version: i32) -> Self {
        self.min_version = min_version;
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Reject requests whose timestamp (Unix milliseconds) is more than
    /// `max_clock_skew_ms` away from local time. `None` disables the check.
    #[must_use]
    pub fn with_max_clock_skew(mut self, max_clock_skew_ms: Option<u64>) -> Self {
        self.max_clock_skew_ms = max_clock_skew_ms;
        self
    }

    /// Set the scheme used to rebuild origin-form request URLs.
    #[must_use]
    pub fn with_url_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.url_scheme = scheme.into();
        self
    }

    /// Lowest protocol version accepted.
    #[must_use]
    pub fn min_version(&self) -> i32 {
        self.min_version
    }

    /// Authenticate an incoming request.
    #[must_use]
    pub fn authenticate(&self, parts: &http::request::Parts) -> AuthOutcome {
        self.authenticate_at(parts, Utc::now().timestamp_millis())
    }

    /// Authenticate an incoming request against an explicit clock reading
    /// (Unix milliseconds).
    #[must_use]
    pub fn authenticate_at(&self, parts: &http::request::Parts, now_ms: i64) -> AuthOutcome {
        let url = request_url(parts, &self.url_scheme);
        let outcome = AuthOutcome::from(self.verify(&parts.headers, url.as_deref(), now_ms));

        match &outcome {
            AuthOutcome::Accepted(_) => debug!(url = ?url, "Authentication succeeded"),
            AuthOutcome::Rejected(err) => {
                debug!(url = ?url, reason = err.kind(), error = %err, "Authentication rejected");
            }
        }

        outcome
    }

    /// Verify authentication headers against the URL the request was received on.
    ///
    /// # Errors
    ///
    /// Returns the first [`AuthError`] encountered; see the module docs for the
    /// order of checks.
    pub fn verify(
        &self,
        headers: &http::HeaderMap,
        url: Option<&str>,
        now_ms: i64,
    ) -> Result<Principal, AuthError> {
        let auth = AuthenticationHeaders::from_header_map(headers, self.min_version)?;

        let key = self.resolver.resolve_key(&auth.cloud_id)?;

        let url = url.ok_or(AuthError::UnsignableUrl)?;
        let expected = compute_digest_with(self.algorithm, auth.timestamp, url, key.as_bytes())
            .ok_or(AuthError::UnsignableUrl)?;

        if !bool::from(auth.digest.ct_eq(&expected)) {
            return Err(AuthError::DigestMismatch);
        }

        if let Some(max_skew_ms) = self.max_clock_skew_ms {
            check_freshness(auth.timestamp, now_ms, max_skew_ms)?;
        }

        debug!(cloud_id = %auth.cloud_id, version = auth.version, "Digest verified");
        Ok(Principal::peer())
    }
}

/// Check that a timestamp is within `max_skew_ms` of `now_ms`, in either direction.
fn check_freshness(timestamp: i64, now_ms: i64, max_skew_ms: u64) -> Result<(), AuthError> {
    if timestamp.abs_diff(now_ms) > max_skew_ms {
        return Err(AuthError::StaleTimestamp {
            timestamp,
            max_skew_ms,
        });
    }
    Ok(())
}

/// Rebuild the full URL of a request as the server received it.
///
/// Absolute-form request targets are used as is. Origin-form targets (the
/// usual case for HTTP/1.1 servers) are rebuilt from `default_scheme`, the
/// `Host` header, and the path and query. Returns `None` when the host cannot
/// be determined.
///
/// # Examples
///
/// ```
/// use pcmesh_auth::request_url;
///
/// let (parts, ()) = http::Request::get("/api/list?page=2")
///     .header("host", "node.local:7330")
///     .body(())
///     .unwrap()
///     .into_parts();
///
/// assert_eq!(
///     request_url(&parts, "http").as_deref(),
///     Some("http://node.local:7330/api/list?page=2")
/// );
/// ```
#[must_use]
pub fn request_url(parts: &http::request::Parts, default_scheme: &str) -> Option<String> {
    let uri = &parts.uri;
    if uri.scheme().is_some() && uri.authority().is_some() {
        return Some(uri.to_string());
    }

    let host = parts
        .headers
        .get(http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|h| !h.is_empty())?;

    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());

    Some(format!("{default_scheme}://{host}{path_and_query}"))
}
