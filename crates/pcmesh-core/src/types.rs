//! Common types shared across pcmesh crates.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::error::PcMeshError;

/// Identifier of a personal cloud. Selects the master key for a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct CloudId(String);

impl CloudId {
    /// Create a cloud id.
    ///
    /// # Errors
    /// Returns an error if the id is empty or whitespace only.
    pub fn new(id: impl Into<String>) -> Result<Self, PcMeshError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PcMeshError::InvalidCloudId(id));
        }
        Ok(Self(id))
    }

    /// Get the cloud id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CloudId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CloudId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared master key of one personal cloud.
///
/// Cloning is cheap. The `Debug` output never includes the key material.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticationKey(Bytes);

impl AuthenticationKey {
    /// Wrap raw key bytes.
    #[must_use]
    pub fn new(key: impl Into<Bytes>) -> Self {
        Self(key.into())
    }

    /// Decode a hex-encoded key.
    ///
    /// # Errors
    /// Returns [`PcMeshError::InvalidKey`] if the text is not valid hex or is empty.
    pub fn from_hex(cloud_id: &str, text: &str) -> Result<Self, PcMeshError> {
        let raw = hex::decode(text.trim()).map_err(|e| PcMeshError::InvalidKey {
            cloud_id: cloud_id.to_owned(),
            reason: e.to_string(),
        })?;
        if raw.is_empty() {
            return Err(PcMeshError::InvalidKey {
                cloud_id: cloud_id.to_owned(),
                reason: "key is empty".to_owned(),
            });
        }
        Ok(Self(Bytes::from(raw)))
    }

    /// Raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AuthenticationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthenticationKey(<{} bytes redacted>)", self.0.len())
    }
}

impl From<Vec<u8>> for AuthenticationKey {
    fn from(raw: Vec<u8>) -> Self {
        Self(Bytes::from(raw))
    }
}

impl From<&'static [u8]> for AuthenticationKey {
    fn from(raw: &'static [u8]) -> Self {
        Self(Bytes::from_static(raw))
    }
}

/// Hash used to compute the request digest.
///
/// Both ends of a connection must agree on the algorithm; the header contract
/// is the same for every variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DigestAlgorithm {
    /// xxHash64 with seed 0. Fast, not a MAC.
    #[default]
    #[serde(rename = "xxhash64")]
    XxHash64,
    /// HMAC-SHA256 keyed by the master key, truncated to 64 bits.
    HmacSha256,
}

impl DigestAlgorithm {
    /// Configuration name of the algorithm.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::XxHash64 => "xxhash64",
            Self::HmacSha256 => "hmac-sha256",
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = PcMeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xxhash64" | "xxh64" => Ok(Self::XxHash64),
            "hmac-sha256" | "hmac_sha256" => Ok(Self::HmacSha256),
            _ => Err(PcMeshError::UnknownDigestAlgorithm(s.to_owned())),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_valid_cloud_id() {
        let id = CloudId::new("cloudA").unwrap();
        assert_eq!(id.as_str(), "cloudA");
        assert_eq!(id.to_string(), "cloudA");
    }

    #[test]
    fn test_should_reject_blank_cloud_id() {
        assert!(CloudId::new("").is_err());
        assert!(CloudId::new("   ").is_err());
    }

    #[test]
    fn test_should_decode_hex_key() {
        let key = AuthenticationKey::from_hex("cloudA", "010203").unwrap();
        assert_eq!(key.as_bytes(), &[0x01, 0x02, 0x03]);
        assert_eq!(key.len(), 3);
    }

    #[test]
    fn test_should_reject_invalid_hex_key() {
        let result = AuthenticationKey::from_hex("cloudA", "zz");
        assert!(matches!(result, Err(PcMeshError::InvalidKey { .. })));
    }

    #[test]
    fn test_should_reject_empty_key() {
        let result = AuthenticationKey::from_hex("cloudA", "");
        assert!(matches!(result, Err(PcMeshError::InvalidKey { .. })));
    }

    #[test]
    fn test_should_redact_key_in_debug_output() {
        let key = AuthenticationKey::from(vec![0xde, 0xad, 0xbe, 0xef]);
        let debug = format!("{key:?}");
        assert_eq!(debug, "AuthenticationKey(<4 bytes redacted>)");
        assert!(!debug.contains("deadbeef"));
    }

    #[test]
    fn test_should_parse_digest_algorithm_names() {
        assert_eq!(
            "xxhash64".parse::<DigestAlgorithm>().unwrap(),
            DigestAlgorithm::XxHash64
        );
        assert_eq!(
            "HMAC-SHA256".parse::<DigestAlgorithm>().unwrap(),
            DigestAlgorithm::HmacSha256
        );
        assert!("md5".parse::<DigestAlgorithm>().is_err());
    }

    #[test]
    fn test_should_serialize_digest_algorithm_as_config_name() {
        let json = serde_json::to_string(&DigestAlgorithm::HmacSha256).unwrap();
        assert_eq!(json, "\"hmac-sha256\"");
        let json = serde_json::to_string(&DigestAlgorithm::XxHash64).unwrap();
        assert_eq!(json, "\"xxhash64\"");
    }
}
