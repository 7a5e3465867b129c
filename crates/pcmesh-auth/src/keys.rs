//! Key resolver trait and implementations.
//!
//! The verifier never owns the cloud registry. It receives a [`KeyResolver`]
//! and asks it for the master key of the cloud named in each request.

use std::collections::HashMap;

use pcmesh_core::{AuthenticationKey, CloudKeyRegistry};

use crate::error::AuthError;

/// Trait for looking up the master key of a personal cloud by its id.
///
/// Implementations may be backed by the live cloud registry, a configuration
/// file, or a fixed map in tests. Lookups must be safe to call concurrently.
pub trait KeyResolver: Send + Sync {
    /// Retrieve the master key for the given cloud id (exact match).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownCloud`] if the cloud is not known.
    fn resolve_key(&self, cloud_id: &str) -> Result<AuthenticationKey, AuthError>;
}

impl KeyResolver for CloudKeyRegistry {
    fn resolve_key(&self, cloud_id: &str) -> Result<AuthenticationKey, AuthError> {
        self.get(cloud_id)
            .ok_or_else(|| AuthError::UnknownCloud(cloud_id.to_owned()))
    }
}

/// A fixed in-memory key resolver backed by a `HashMap`.
///
/// # Examples
///
/// ```
/// use pcmesh_auth::{AuthenticationKey, KeyResolver, StaticKeyResolver};
///
/// let resolver = StaticKeyResolver::new(vec![
///     ("cloudA".to_owned(), AuthenticationKey::from(vec![1, 2, 3])),
/// ]);
///
/// let key = resolver.resolve_key("cloudA").unwrap();
/// assert_eq!(key.as_bytes(), &[1, 2, 3]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticKeyResolver {
    keys: HashMap<String, AuthenticationKey>,
}

impl StaticKeyResolver {
    /// Create a resolver from an iterable of (cloud_id, key) pairs.
    pub fn new(keys: impl IntoIterator<Item = (String, AuthenticationKey)>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }
}

impl KeyResolver for StaticKeyResolver {
    fn resolve_key(&self, cloud_id: &str) -> Result<AuthenticationKey, AuthError> {
        self.keys
            .get(cloud_id)
            .cloned()
            .ok_or_else(|| AuthError::UnknownCloud(cloud_id.to_owned()))
    }
}
