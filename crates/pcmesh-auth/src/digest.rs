//! Digest computation for request authentication.
//!
//! The digest binds three values together:
//!
//! ```text
//! digest = H( decimal(timestamp) || uppercase(url) || key )
//! ```
//!
//! with no delimiters between the parts. The timestamp text is always
//! `-?[0-9]+` and an absolute URL always starts with a letter (its scheme), so
//! the boundary between the first two parts is unambiguous. URLs that do not
//! start with a letter are refused rather than hashed.
//!
//! `H` is xxHash64 with seed 0 by default. With [`DigestAlgorithm::HmacSha256`]
//! the key becomes the HMAC key instead of trailing input, and the first eight
//! bytes of the tag are read big-endian.

use hmac::{Hmac, KeyInit, Mac};
use pcmesh_core::DigestAlgorithm;
use sha2::Sha256;
use xxhash_rust::xxh64::Xxh64;

/// Seed shared by every signer and verifier.
pub const DIGEST_SEED: u64 = 0;

type HmacSha256 = Hmac<Sha256>;

/// Uppercase a URL independently of any locale.
///
/// Uses simple one-to-one case mapping: a character whose uppercase form is
/// more than one character (such as `ß`) is kept as is, so the result has the
/// same number of characters as the input.
///
/// # Examples
///
/// ```
/// use pcmesh_auth::digest::canonical_url;
///
/// assert_eq!(canonical_url("http://node/Path?q=a"), "HTTP://NODE/PATH?Q=A");
/// assert_eq!(canonical_url("http://node/straße"), "HTTP://NODE/STRAßE");
/// ```
#[must_use]
pub fn canonical_url(url: &str) -> String {
    url.chars()
        .map(|c| {
            let mut upper = c.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(u), None) => u,
                _ => c,
            }
        })
        .collect()
}

/// Build the keyless part of the digest input: `decimal(timestamp) || uppercase(url)`.
///
/// Returns `None` when the URL is empty or does not start with an ASCII letter.
#[must_use]
pub fn signing_input(timestamp: i64, url: &str) -> Option<Vec<u8>> {
    if !url.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }

    let timestamp = timestamp.to_string();
    let url = canonical_url(url);

    let mut input = Vec::with_capacity(timestamp.len() + url.len());
    input.extend_from_slice(timestamp.as_bytes());
    input.extend_from_slice(url.as_bytes());
    Some(input)
}

/// Compute the xxHash64 request digest.
///
/// Returns `None` if no digest can be computed for the URL; callers treat that
/// as a failed authentication.
///
/// # Examples
///
/// ```
/// use pcmesh_auth::compute_digest;
///
/// let a = compute_digest(1000, "http://node.local/api/list", &[1, 2, 3]);
/// let b = compute_digest(1000, "HTTP://NODE.LOCAL/API/LIST", &[1, 2, 3]);
/// assert_eq!(a, b);
/// assert!(compute_digest(1000, "", &[1, 2, 3]).is_none());
/// ```
#[must_use]
pub fn compute_digest(timestamp: i64, url: &str, key: &[u8]) -> Option<u64> {
    compute_digest_with(DigestAlgorithm::XxHash64, timestamp, url, key)
}

/// Compute the request digest with the given algorithm.
#[must_use]
pub fn compute_digest_with(
    algorithm: DigestAlgorithm,
    timestamp: i64,
    url: &str,
    key: &[u8],
) -> Option<u64> {
    let input = signing_input(timestamp, url)?;

    let digest = match algorithm {
        DigestAlgorithm::XxHash64 => {
            let mut hasher = Xxh64::new(DIGEST_SEED);
            hasher.update(&input);
            hasher.update(key);
            hasher.digest()
        }
        DigestAlgorithm::HmacSha256 => hmac_sha256_u64(key, &input),
    };

    Some(digest)
}

/// HMAC-SHA256 truncated to its first eight bytes, read big-endian.
fn hmac_sha256_u64(key: &[u8], data: &[u8]) -> u64 {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    let tag = mac.finalize().into_bytes();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&tag[..8]);
    u64::from_be_bytes(prefix)
}
