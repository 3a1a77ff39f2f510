//! Session error taxonomy and the HTTP error model.
//! `SessionError` names the ways a session check can fail; `AppError` is what the
//! JSON endpoints return and maps onto status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Why a session check did not authorize.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No session credential accompanies the request.
    #[error("no session credential")]
    NoCredential,
    /// A credential was presented but the identity provider rejected it.
    /// Expiry, revocation, tampering and provider outages all land here.
    #[error("session credential is invalid or expired")]
    InvalidOrExpiredCredential,
    #[error("could not mint a session: {0}")]
    MintingFailure(String),
    /// The client-recorded login is older than the ceiling, or missing.
    #[error("client session is stale")]
    ClientStale,
}

impl SessionError {
    pub fn code_str(&self) -> &'static str {
        match self {
            SessionError::NoCredential => "no_credential",
            SessionError::InvalidOrExpiredCredential => "invalid_or_expired_credential",
            SessionError::MintingFailure(_) => "minting_failure",
            SessionError::ClientStale => "client_stale",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    Auth { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::Auth { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::Auth { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn auth<S: Into<String>>(code: S, msg: S) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::Auth { .. } => 401,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        let code = err.code_str().to_string();
        match err {
            SessionError::MintingFailure(_) => AppError::Internal { code, message: err.to_string() },
            _ => AppError::Auth { code, message: err.to_string() },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({
            "success": false,
            "code": self.code_str(),
            "error": self.message(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(AppError::user("bad_input", "oops").http_status(), 400);
        assert_eq!(AppError::auth("auth", "no").http_status(), 401);
        assert_eq!(AppError::internal("internal", "panic").http_status(), 500);
    }

    #[test]
    fn minting_failure_is_a_server_error() {
        let app: AppError = SessionError::MintingFailure("provider down".into()).into();
        assert_eq!(app.http_status(), 500);
        assert_eq!(app.code_str(), "minting_failure");
        assert!(app.message().contains("provider down"));
    }

    #[test]
    fn gate_errors_map_to_auth() {
        for e in [SessionError::NoCredential, SessionError::InvalidOrExpiredCredential, SessionError::ClientStale] {
            let app: AppError = e.into();
            assert_eq!(app.http_status(), 401);
        }
    }

    #[test]
    fn into_response_carries_status() {
        let resp = AppError::user("missing_id_token", "idToken is required").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
