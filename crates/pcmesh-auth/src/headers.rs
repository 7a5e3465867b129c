//! Protocol header names and the per-request header bundle.
//!
//! | Header | Type |
//! |---|---|
//! | `Authentication-Version` | decimal integer |
//! | `Authentication-Timestamp` | decimal signed 64-bit integer |
//! | `Authentication-Hash` | decimal unsigned 64-bit integer |
//! | `Authentication-PCId` | string |

use std::str::FromStr;

use http::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::error::AuthError;

/// `Authentication-Version`: protocol version of the sender.
pub const VERSION_HEADER: HeaderName = HeaderName::from_static("authentication-version");
/// `Authentication-Timestamp`: time value bound into the digest.
pub const TIMESTAMP_HEADER: HeaderName = HeaderName::from_static("authentication-timestamp");
/// `Authentication-Hash`: the computed digest.
pub const HASH_HEADER: HeaderName = HeaderName::from_static("authentication-hash");
/// `Authentication-PCId`: identifier of the target personal cloud.
pub const CLOUD_ID_HEADER: HeaderName = HeaderName::from_static("authentication-pcid");

/// Protocol version written by this implementation.
pub const CURRENT_VERSION: i32 = 1;

/// Authentication values carried by one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationHeaders {
    /// Protocol version of the sender.
    pub version: i32,
    /// Time value bound into the digest.
    pub timestamp: i64,
    /// The computed digest.
    pub digest: u64,
    /// Identifier of the target personal cloud.
    pub cloud_id: String,
}

impl AuthenticationHeaders {
    /// Read and validate the authentication headers of a request.
    ///
    /// Fields are checked in protocol order and the first failure wins:
    /// version (presence, type, then `>= min_version`), timestamp, digest,
    /// cloud id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingField`] for an absent or blank header,
    /// [`AuthError::MalformedField`] for a value of the wrong type, or
    /// [`AuthError::VersionTooOld`] when the version is below `min_version`.
    ///
    /// # Examples
    ///
    /// ```
    /// use http::HeaderMap;
    /// use pcmesh_auth::AuthenticationHeaders;
    /// use pcmesh_auth::headers::{CLOUD_ID_HEADER, HASH_HEADER, TIMESTAMP_HEADER, VERSION_HEADER};
    ///
    /// let mut headers = HeaderMap::new();
    /// headers.insert(VERSION_HEADER, "1".parse().unwrap());
    /// headers.insert(TIMESTAMP_HEADER, "1000".parse().unwrap());
    /// headers.insert(HASH_HEADER, "42".parse().unwrap());
    /// headers.insert(CLOUD_ID_HEADER, "cloudA".parse().unwrap());
    ///
    /// let parsed = AuthenticationHeaders::from_header_map(&headers, 1).unwrap();
    /// assert_eq!(parsed.timestamp, 1000);
    /// assert_eq!(parsed.cloud_id, "cloudA");
    /// ```
    pub fn from_header_map(headers: &HeaderMap, min_version: i32) -> Result<Self, AuthError> {
        let version: i32 = parse_header(headers, &VERSION_HEADER, "integer")?;
        if version < min_version {
            return Err(AuthError::VersionTooOld {
                version,
                minimum: min_version,
            });
        }

        let timestamp: i64 = parse_header(headers, &TIMESTAMP_HEADER, "signed 64-bit integer")?;
        let digest: u64 = parse_header(headers, &HASH_HEADER, "unsigned 64-bit integer")?;
        let cloud_id = required_header(headers, &CLOUD_ID_HEADER)?;

        debug!(version, timestamp, cloud_id, "Parsed authentication headers");

        Ok(Self {
            version,
            timestamp,
            digest,
            cloud_id: cloud_id.to_owned(),
        })
    }

    /// Write the four authentication headers, replacing existing values.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedField`] if the cloud id cannot be used as
    /// a header value.
    pub fn apply_to(&self, headers: &mut HeaderMap) -> Result<(), AuthError> {
        let cloud_id =
            HeaderValue::from_str(&self.cloud_id).map_err(|_| AuthError::MalformedField {
                header: CLOUD_ID_HEADER,
                expected: "visible ASCII text",
            })?;

        headers.insert(VERSION_HEADER, HeaderValue::from(self.version));
        headers.insert(TIMESTAMP_HEADER, HeaderValue::from(self.timestamp));
        headers.insert(HASH_HEADER, HeaderValue::from(self.digest));
        headers.insert(CLOUD_ID_HEADER, cloud_id);
        Ok(())
    }

    /// The headers as name/value text pairs, in protocol order.
    #[must_use]
    pub fn to_pairs(&self) -> [(HeaderName, String); 4] {
        [
            (VERSION_HEADER, self.version.to_string()),
            (TIMESTAMP_HEADER, self.timestamp.to_string()),
            (HASH_HEADER, self.digest.to_string()),
            (CLOUD_ID_HEADER, self.cloud_id.clone()),
        ]
    }
}

/// Extract a header that must be present and non-blank.
fn required_header<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Result<&'a str, AuthError> {
    let value = headers
        .get(name)
        .ok_or_else(|| AuthError::MissingField(name.clone()))?
        .to_str()
        .map_err(|_| AuthError::MalformedField {
            header: name.clone(),
            expected: "visible ASCII text",
        })?;

    if value.trim().is_empty() {
        return Err(AuthError::MissingField(name.clone()));
    }
    Ok(value)
}

/// Extract a required header and parse it as a number.
fn parse_header<T: FromStr>(
    headers: &HeaderMap,
    name: &HeaderName,
    expected: &'static str,
) -> Result<T, AuthError> {
    required_header(headers, name)?
        .trim()
        .parse()
        .map_err(|_| AuthError::MalformedField {
            header: name.clone(),
            expected,
        })
}
