use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::principal::Principal;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("identity token is missing, unknown or expired")]
    InvalidIdToken,
    #[error("session credential has expired")]
    SessionExpired,
    #[error("session credential has been revoked")]
    SessionRevoked,
    #[error("session credential is not recognised")]
    UnknownSession,
    #[error("identity provider unreachable: {0}")]
    Transport(String),
    #[error("identity provider error ({status}): {message}")]
    Provider { status: u16, message: String },
    #[error("session lifetime of {0}s is outside the allowed range")]
    InvalidSessionDuration(u64),
    #[error("identity provider internal error: {0}")]
    Internal(String),
}

impl IdentityError {
    /// Stable wire code, shared by the provider REST surface and its client.
    pub fn code_str(&self) -> &'static str {
        match self {
            IdentityError::InvalidCredentials => "invalid_credentials",
            IdentityError::InvalidIdToken => "invalid_id_token",
            IdentityError::SessionExpired => "session_expired",
            IdentityError::SessionRevoked => "session_revoked",
            IdentityError::UnknownSession => "unknown_session",
            IdentityError::Transport(_) => "transport",
            IdentityError::Provider { .. } => "provider_error",
            IdentityError::InvalidSessionDuration(_) => "invalid_session_duration",
            IdentityError::Internal(_) => "internal",
        }
    }

    pub fn from_code(code: &str, status: u16, message: String) -> Self {
        match code {
            "invalid_credentials" => IdentityError::InvalidCredentials,
            "invalid_id_token" => IdentityError::InvalidIdToken,
            "session_expired" => IdentityError::SessionExpired,
            "session_revoked" => IdentityError::SessionRevoked,
            "unknown_session" => IdentityError::UnknownSession,
            _ => IdentityError::Provider { status, message },
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            IdentityError::InvalidCredentials
            | IdentityError::InvalidIdToken
            | IdentityError::SessionExpired
            | IdentityError::SessionRevoked
            | IdentityError::UnknownSession => 401,
            IdentityError::Transport(_) => 503,
            IdentityError::Provider { status, .. } => *status,
            IdentityError::InvalidSessionDuration(_) => 400,
            IdentityError::Internal(_) => 500,
        }
    }
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Short-lived proof of a successful interactive sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdToken {
    #[serde(rename = "idToken")]
    pub token: String,
    pub uid: String,
    pub email: String,
    pub expires_at_ms: i64,
}

/// IdentityProvider is the external authentication service, treated as a black box:
/// it signs users in, mints long-lived session credentials from identity tokens, and
/// verifies or revokes those credentials.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Interactive sign-in with an email and password.
    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<IdToken>;

    /// Exchanges an identity token for an opaque session credential valid for `valid_for`.
    async fn mint_session(&self, id_token: &str, valid_for: Duration) -> IdentityResult<String>;

    /// Checks a session credential. Any error means "not authorized".
    async fn verify_session(&self, credential: &str) -> IdentityResult<Principal>;

    /// Revokes a session credential; returns whether it was live.
    async fn revoke_session(&self, credential: &str) -> IdentityResult<bool>;
}

pub type SharedProvider = Arc<dyn IdentityProvider>;
