//! Principal and authentication outcome.

use crate::error::AuthError;

/// Identity given to every authenticated peer of the personal cloud.
pub const PRINCIPAL_NAME: &str = "pc";

/// Authentication type reported for principals produced by this scheme.
pub const AUTHENTICATION_TYPE: &str = "PersonalCloud";

/// The identity handed to the host after a successful check.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Identity name, always [`PRINCIPAL_NAME`].
    pub name: &'static str,
    /// Roles, always empty.
    pub roles: Vec<String>,
    /// Always [`AUTHENTICATION_TYPE`].
    pub authentication_type: &'static str,
}

impl Principal {
    /// The principal of an authenticated personal-cloud peer.
    #[must_use]
    pub fn peer() -> Self {
        Self {
            name: PRINCIPAL_NAME,
            roles: Vec::new(),
            authentication_type: AUTHENTICATION_TYPE,
        }
    }
}

/// Result of authenticating one request.
///
/// A rejection keeps its reason for logging. Hosts should only branch on
/// whether a principal is present so every rejection looks the same to the
/// peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The request comes from a holder of the cloud's master key.
    Accepted(Principal),
    /// The request is unauthenticated ("no user").
    Rejected(AuthError),
}

impl AuthOutcome {
    /// Whether the request was authenticated.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// The principal, or `None` for the "no user" result.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Accepted(principal) => Some(principal),
            Self::Rejected(_) => None,
        }
    }

    /// Consume the outcome, keeping only the principal.
    #[must_use]
    pub fn into_principal(self) -> Option<Principal> {
        match self {
            Self::Accepted(principal) => Some(principal),
            Self::Rejected(_) => None,
        }
    }

    /// The rejection reason, if any.
    #[must_use]
    pub fn rejection(&self) -> Option<&AuthError> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(err) => Some(err),
        }
    }
}

impl From<Result<Principal, AuthError>> for AuthOutcome {
    fn from(result: Result<Principal, AuthError>) -> Self {
        match result {
            Ok(principal) => Self::Accepted(principal),
            Err(err) => Self::Rejected(err),
        }
    }
}
