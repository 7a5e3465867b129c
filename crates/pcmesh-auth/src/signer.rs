//! Outgoing request signing.
//!
//! The signer is the client half of the protocol: it computes the digest for
//! the URL it is about to request and produces the four authentication
//! headers. The URL must be the one the receiving node will observe, including
//! scheme, host, port, path and query.

use chrono::Utc;
use pcmesh_core::{AuthenticationKey, DigestAlgorithm};
use tracing::debug;

use crate::digest::compute_digest_with;
use crate::error::AuthError;
use crate::headers::{AuthenticationHeaders, CURRENT_VERSION};

/// Produces authentication headers for outgoing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signer {
    version: i32,
    algorithm: DigestAlgorithm,
}

impl Default for Signer {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            algorithm: DigestAlgorithm::default(),
        }
    }
}

impl Signer {
    /// Create a signer announcing `version` and hashing with `algorithm`.
    #[must_use]
    pub fn new(version: i32, algorithm: DigestAlgorithm) -> Self {
        Self { version, algorithm }
    }

    /// Protocol version this signer announces.
    #[must_use]
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Digest algorithm this signer uses.
    #[must_use]
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Sign a request to `url` at `timestamp` for the given cloud.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnsignableUrl`] if the URL is empty or not absolute.
    pub fn sign(
        &self,
        cloud_id: &str,
        url: &str,
        timestamp: i64,
        key: &AuthenticationKey,
    ) -> Result<AuthenticationHeaders, AuthError> {
        let digest = compute_digest_with(self.algorithm, timestamp, url, key.as_bytes())
            .ok_or(AuthError::UnsignableUrl)?;

        debug!(cloud_id, timestamp, algorithm = %self.algorithm, "Signed request");

        Ok(AuthenticationHeaders {
            version: self.version,
            timestamp,
            digest,
            cloud_id: cloud_id.to_owned(),
        })
    }

    /// Sign a request stamped with the current Unix time in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnsignableUrl`] if the URL is empty or not absolute.
    pub fn sign_now(
        &self,
        cloud_id: &str,
        url: &str,
        key: &AuthenticationKey,
    ) -> Result<AuthenticationHeaders, AuthError> {
        self.sign(cloud_id, url, Utc::now().timestamp_millis(), key)
    }

    /// Sign an `http::Request` in place using its absolute URI.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnsignableUrl`] if the request URI has no scheme or
    /// authority, or [`AuthError::MalformedField`] if the cloud id cannot be
    /// sent as a header value.
    pub fn sign_request<B>(
        &self,
        request: &mut http::Request<B>,
        cloud_id: &str,
        timestamp: i64,
        key: &AuthenticationKey,
    ) -> Result<(), AuthError> {
        let uri = request.uri();
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(AuthError::UnsignableUrl);
        }

        let url = uri.to_string();
        let headers = self.sign(cloud_id, &url, timestamp, key)?;
        headers.apply_to(request.headers_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::compute_digest;
    use crate::headers::{HASH_HEADER, TIMESTAMP_HEADER};

    fn key() -> AuthenticationKey {
        AuthenticationKey::from(vec![0x01, 0x02, 0x03])
    }

    #[test]
    fn test_should_sign_with_current_version_by_default() {
        let signed = Signer::default()
            .sign("cloudA", "http://node.local/api/list", 1000, &key())
            .unwrap();

        assert_eq!(signed.version, CURRENT_VERSION);
        assert_eq!(signed.timestamp, 1000);
        assert_eq!(signed.cloud_id, "cloudA");
        assert_eq!(
            Some(signed.digest),
            compute_digest(1000, "http://node.local/api/list", &[0x01, 0x02, 0x03])
        );
    }

    #[test]
    fn test_should_sign_with_selected_algorithm() {
        let signer = Signer::new(3, DigestAlgorithm::HmacSha256);
        let signed = signer
            .sign("cloudA", "http://node.local/api/list", 1000, &key())
            .unwrap();

        assert_eq!(signed.version, 3);
        assert_eq!(signed.digest, 12_636_638_157_674_998_515);
    }

    #[test]
    fn test_should_refuse_relative_url() {
        let result = Signer::default().sign("cloudA", "/api/list", 1000, &key());
        assert_eq!(result, Err(AuthError::UnsignableUrl));
    }

    #[test]
    fn test_should_stamp_current_time() {
        let before = Utc::now().timestamp_millis();
        let signed = Signer::default()
            .sign_now("cloudA", "http://node.local/", &key())
            .unwrap();
        let after = Utc::now().timestamp_millis();

        assert!(signed.timestamp >= before && signed.timestamp <= after);
    }

    #[test]
    fn test_should_sign_request_in_place() {
        let mut request = http::Request::get("http://node.local:7330/api/list?page=2")
            .body(())
            .unwrap();

        Signer::default()
            .sign_request(&mut request, "cloudA", 1000, &key())
            .unwrap();

        let expected =
            compute_digest(1000, "http://node.local:7330/api/list?page=2", key().as_bytes())
                .unwrap();
        assert_eq!(
            request.headers().get(HASH_HEADER).unwrap(),
            expected.to_string().as_str()
        );
        assert_eq!(request.headers().get(TIMESTAMP_HEADER).unwrap(), "1000");
    }

    #[test]
    fn test_should_refuse_to_sign_origin_form_request() {
        let mut request = http::Request::get("/api/list").body(()).unwrap();
        let result = Signer::default().sign_request(&mut request, "cloudA", 1000, &key());
        assert_eq!(result, Err(AuthError::UnsignableUrl));
    }
}
