//! In-memory registry of personal clouds and their master keys.
//!
//! Provides [`CloudKeyRegistry`], a thread-safe concurrent map that the
//! cloud-membership subsystem mutates while request handlers read from it.

use dashmap::DashMap;
use tracing::debug;

use crate::types::{AuthenticationKey, CloudId};

/// Thread-safe map from cloud id to master key.
///
/// Uses `DashMap` so lookups never wait on a global lock. A lookup observes
/// whatever is registered at that instant; a concurrent removal simply makes
/// the cloud unknown.
///
/// # Examples
///
/// ```
/// use pcmesh_core::{AuthenticationKey, CloudId, CloudKeyRegistry};
///
/// let registry = CloudKeyRegistry::new();
/// registry.insert(CloudId::new("cloudA").unwrap(), AuthenticationKey::from(vec![1, 2, 3]));
/// assert!(registry.get("cloudA").is_some());
/// assert!(registry.get("cloudB").is_none());
/// ```
#[derive(Debug, Default)]
pub struct CloudKeyRegistry {
    inner: DashMap<CloudId, AuthenticationKey>,
}

impl CloudKeyRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Register or replace the master key of a cloud.
    ///
    /// Returns the previous key, if any.
    pub fn insert(&self, cloud_id: CloudId, key: AuthenticationKey) -> Option<AuthenticationKey> {
        debug!(cloud_id = %cloud_id, key_len = key.len(), "registering cloud key");
        self.inner.insert(cloud_id, key)
    }

    /// Look up the master key of a cloud by exact id.
    #[must_use]
    pub fn get(&self, cloud_id: &str) -> Option<AuthenticationKey> {
        self.inner.get(cloud_id).map(|entry| entry.value().clone())
    }

    /// Remove a cloud, returning its key.
    pub fn remove(&self, cloud_id: &str) -> Option<AuthenticationKey> {
        debug!(cloud_id, "removing cloud key");
        self.inner.remove(cloud_id).map(|(_, key)| key)
    }

    /// Whether a cloud is registered.
    #[must_use]
    pub fn contains(&self, cloud_id: &str) -> bool {
        self.inner.contains_key(cloud_id)
    }

    /// Registered cloud ids, sorted.
    #[must_use]
    pub fn cloud_ids(&self) -> Vec<CloudId> {
        let mut ids: Vec<CloudId> = self.inner.iter().map(|entry| entry.key().clone()).collect();
        ids.sort_unstable();
        ids
    }

    /// Remove every cloud.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Number of registered clouds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl FromIterator<(CloudId, AuthenticationKey)> for CloudKeyRegistry {
    fn from_iter<I: IntoIterator<Item = (CloudId, AuthenticationKey)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn cloud(id: &str) -> CloudId {
        CloudId::new(id).unwrap()
    }

    #[test]
    fn test_should_resolve_registered_cloud() {
        let registry = CloudKeyRegistry::new();
        assert!(registry.is_empty());

        registry.insert(cloud("cloudA"), AuthenticationKey::from(vec![1, 2, 3]));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("cloudA"));
        assert_eq!(registry.get("cloudA").unwrap().as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_should_match_cloud_id_exactly() {
        let registry = CloudKeyRegistry::new();
        registry.insert(cloud("cloudA"), AuthenticationKey::from(vec![1]));

        assert!(registry.get("clouda").is_none());
        assert!(registry.get("cloudA ").is_none());
    }

    #[test]
    fn test_should_replace_existing_key() {
        let registry = CloudKeyRegistry::new();
        registry.insert(cloud("cloudA"), AuthenticationKey::from(vec![1]));
        let previous = registry.insert(cloud("cloudA"), AuthenticationKey::from(vec![2]));

        assert_eq!(previous.unwrap().as_bytes(), &[1]);
        assert_eq!(registry.get("cloudA").unwrap().as_bytes(), &[2]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_should_remove_and_clear() {
        let registry: CloudKeyRegistry = vec![
            (cloud("cloudA"), AuthenticationKey::from(vec![1])),
            (cloud("cloudB"), AuthenticationKey::from(vec![2])),
        ]
        .into_iter()
        .collect();

        assert_eq!(registry.cloud_ids(), vec![cloud("cloudA"), cloud("cloudB")]);
        assert!(registry.remove("cloudA").is_some());
        assert!(registry.get("cloudA").is_none());

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_should_tolerate_concurrent_mutation() {
        let registry = Arc::new(CloudKeyRegistry::new());

        let writers: Vec<_> = (0..4)
            .map(|n| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let id = cloud(&format!("cloud-{n}-{i}"));
                        registry.insert(id.clone(), AuthenticationKey::from(vec![n]));
                        let _ = registry.get(id.as_str());
                        if i % 2 == 0 {
                            registry.remove(id.as_str());
                        }
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(registry.len(), 200);
    }
}
