//! Shared-key request authentication for pcmesh personal-cloud nodes.
//!
//! Nodes of the same personal cloud share a master key established when they
//! join. Every request between nodes carries four headers: the protocol
//! version, a timestamp, the cloud id, and a 64-bit digest computed over
//! `timestamp || uppercase(url) || key`. The receiving node resolves the key
//! for the claimed cloud, recomputes the digest over the URL it actually
//! received, and accepts the request only if the two agree.
//!
//! # Security
//!
//! The default digest is xxHash64, a fast non-cryptographic hash. It is **not**
//! a MAC: it relies on the secrecy of the key alone, with the key additionally
//! validated during node discovery. Deployments that need a real MAC can
//! switch every node to [`DigestAlgorithm::HmacSha256`] without changing the
//! header contract. Payloads are neither signed nor encrypted.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pcmesh_auth::{AuthenticationKey, Signer, StaticKeyResolver, Verifier};
//!
//! let key = AuthenticationKey::from(vec![0x01, 0x02, 0x03]);
//! let resolver = StaticKeyResolver::new(vec![("cloudA".to_owned(), key.clone())]);
//! let verifier = Verifier::new(Arc::new(resolver));
//!
//! let url = "http://node.local/api/list";
//! let signed = Signer::default().sign("cloudA", url, 1000, &key).unwrap();
//!
//! let mut request = http::Request::get(url).body(()).unwrap();
//! signed.apply_to(request.headers_mut()).unwrap();
//!
//! let (parts, ()) = request.into_parts();
//! assert!(verifier.authenticate(&parts).is_accepted());
//! ```
//!
//! # Modules
//!
//! - [`digest`] - Canonical URL form and digest computation
//! - [`error`] - Authentication error types
//! - [`headers`] - Protocol header names and the header bundle
//! - [`keys`] - Key resolver trait and implementations
//! - [`principal`] - Principal and authentication outcome
//! - [`signer`] - Outgoing request signing
//! - [`verifier`] - Incoming request verification

pub mod digest;
pub mod error;
pub mod headers;
pub mod keys;
pub mod principal;
pub mod signer;
pub mod verifier;

pub use digest::{canonical_url, compute_digest, compute_digest_with};
pub use error::AuthError;
pub use headers::AuthenticationHeaders;
pub use keys::{KeyResolver, StaticKeyResolver};
pub use pcmesh_core::{AuthenticationKey, DigestAlgorithm};
pub use principal::{AuthOutcome, Principal};
pub use signer::Signer;
pub use verifier::{Verifier, request_url};
