//! Configuration management for pcmesh nodes.
//!
//! All configuration is driven by environment variables.

use crate::error::PcMeshError;
use crate::types::{AuthenticationKey, CloudId, DigestAlgorithm};

/// Node configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PcMeshConfig {
    /// Bind address for the node.
    pub listen: String,
    /// Log level.
    pub log_level: String,
    /// Lowest protocol version the verifier accepts.
    pub min_version: i32,
    /// Maximum distance between a request timestamp and the local clock, in
    /// milliseconds. `None` disables the freshness check.
    pub max_clock_skew_ms: Option<u64>,
    /// Digest algorithm shared by all nodes of the mesh.
    pub digest_algorithm: DigestAlgorithm,
    /// Scheme used to rebuild the request URL when the request line carries
    /// only a path.
    pub url_scheme: String,
    /// Clouds known at startup. Never serialized.
    #[serde(skip)]
    pub clouds: Vec<(CloudId, AuthenticationKey)>,
}

impl Default for PcMeshConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:7330".to_owned(),
            log_level: "info".to_owned(),
            min_version: 1,
            max_clock_skew_ms: None,
            digest_algorithm: DigestAlgorithm::default(),
            url_scheme: "http".to_owned(),
            clouds: Vec::new(),
        }
    }
}

impl PcMeshConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Returns [`PcMeshError`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, PcMeshError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns [`PcMeshError`] if a variable is set to an invalid value.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, PcMeshError> {
        let mut config = Self::default();

        if let Some(v) = var("PCMESH_LISTEN") {
            config.listen = v;
        }
        if let Some(v) = var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = var("PCMESH_MIN_VERSION") {
            config.min_version = v.trim().parse().map_err(|_| {
                PcMeshError::Config(format!("PCMESH_MIN_VERSION is not an integer: {v}"))
            })?;
        }
        if let Some(v) = var("PCMESH_MAX_CLOCK_SKEW_MS") {
            let v = v.trim();
            if !v.is_empty() {
                config.max_clock_skew_ms = Some(v.parse().map_err(|_| {
                    PcMeshError::Config(format!("PCMESH_MAX_CLOCK_SKEW_MS is not a duration: {v}"))
                })?);
            }
        }
        if let Some(v) = var("PCMESH_DIGEST") {
            config.digest_algorithm = v.parse()?;
        }
        if let Some(v) = var("PCMESH_URL_SCHEME") {
            let v = v.trim().to_ascii_lowercase();
            if v != "http" && v != "https" {
                return Err(PcMeshError::Config(format!(
                    "PCMESH_URL_SCHEME must be http or https, got {v}"
                )));
            }
            config.url_scheme = v;
        }
        if let Some(v) = var("PCMESH_CLOUDS") {
            config.clouds = parse_clouds(&v)?;
        }

        Ok(config)
    }
}

/// Parse `cloudId=hexkey` pairs separated by commas.
fn parse_clouds(raw: &str) -> Result<Vec<(CloudId, AuthenticationKey)>, PcMeshError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, key) = entry.split_once('=').ok_or_else(|| {
                PcMeshError::Config(format!("PCMESH_CLOUDS entry is not cloudId=hexkey: {entry}"))
            })?;
            let id = id.trim();
            let key = AuthenticationKey::from_hex(id, key)?;
            Ok((CloudId::new(id)?, key))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<PcMeshConfig, PcMeshError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        PcMeshConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_should_create_default_config() {
        let config = PcMeshConfig::default();
        assert_eq!(config.listen, "0.0.0.0:7330");
        assert_eq!(config.min_version, 1);
        assert_eq!(config.max_clock_skew_ms, None);
        assert_eq!(config.digest_algorithm, DigestAlgorithm::XxHash64);
        assert!(config.clouds.is_empty());
    }

    #[test]
    fn test_should_load_values_from_vars() {
        let config = load(&[
            ("PCMESH_LISTEN", "127.0.0.1:9000"),
            ("PCMESH_MIN_VERSION", "2"),
            ("PCMESH_MAX_CLOCK_SKEW_MS", "30000"),
            ("PCMESH_DIGEST", "hmac-sha256"),
            ("PCMESH_URL_SCHEME", "HTTPS"),
            ("PCMESH_CLOUDS", "cloudA=010203, cloudB=ff"),
        ])
        .unwrap();

        assert_eq!(config.listen, "127.0.0.1:9000");
        assert_eq!(config.min_version, 2);
        assert_eq!(config.max_clock_skew_ms, Some(30_000));
        assert_eq!(config.digest_algorithm, DigestAlgorithm::HmacSha256);
        assert_eq!(config.url_scheme, "https");
        assert_eq!(config.clouds.len(), 2);
        assert_eq!(config.clouds[0].0.as_str(), "cloudA");
        assert_eq!(config.clouds[0].1.as_bytes(), &[1, 2, 3]);
        assert_eq!(config.clouds[1].1.as_bytes(), &[0xff]);
    }

    #[test]
    fn test_should_treat_blank_skew_as_disabled() {
        let config = load(&[("PCMESH_MAX_CLOCK_SKEW_MS", " ")]).unwrap();
        assert_eq!(config.max_clock_skew_ms, None);
    }

    #[test]
    fn test_should_reject_invalid_min_version() {
        let result = load(&[("PCMESH_MIN_VERSION", "one")]);
        assert!(matches!(result, Err(PcMeshError::Config(_))));
    }

    #[test]
    fn test_should_reject_malformed_cloud_entry() {
        assert!(matches!(
            load(&[("PCMESH_CLOUDS", "cloudA")]),
            Err(PcMeshError::Config(_))
        ));
        assert!(matches!(
            load(&[("PCMESH_CLOUDS", "cloudA=nothex")]),
            Err(PcMeshError::InvalidKey { .. })
        ));
        assert!(matches!(
            load(&[("PCMESH_CLOUDS", " =0102")]),
            Err(PcMeshError::InvalidCloudId(_))
        ));
    }

    #[test]
    fn test_should_not_serialize_cloud_keys() {
        let config = load(&[("PCMESH_CLOUDS", "cloudA=010203")]).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("010203"));
        assert!(!json.contains("clouds"));
        assert!(json.contains("\"minVersion\":1"));
    }
}
