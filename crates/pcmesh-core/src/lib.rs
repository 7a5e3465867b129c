//! Core types, configuration, and key registry for pcmesh.
//!
//! This crate provides the building blocks shared by the authentication crate
//! and the node binary: the personal-cloud identifier and master key types,
//! the digest algorithm selector, environment-driven configuration, and an
//! in-memory registry mapping clouds to their master keys.

mod config;
mod error;
mod registry;
mod types;

pub use config::PcMeshConfig;
pub use error::{PcMeshError, PcMeshResult};
pub use registry::CloudKeyRegistry;
pub use types::{AuthenticationKey, CloudId, DigestAlgorithm};
