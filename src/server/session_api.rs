//! Session issuance, verification and logout endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use super::cookies::{clear_session_cookie, session_cookie, session_from_headers, SESSION_MAX_AGE};
use super::AppState;
use crate::error::{AppError, AppResult, SessionError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePayload {
    #[serde(default)]
    pub id_token: Option<String>,
}

/// `POST /api/session`: exchange a short-lived identity token for the `session` cookie.
/// This is the only handler that writes the cookie.
pub async fn issue_session(
    State(state): State<AppState>,
    payload: Result<Json<IssuePayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let id_token = match payload {
        Ok(Json(p)) => p.id_token.unwrap_or_default(),
        Err(rejection) => {
            debug!(target: "caceg::session", error = %rejection, "unreadable session request body");
            String::new()
        }
    };
    let id_token = id_token.trim();
    if id_token.is_empty() {
        return Err(AppError::user("missing_id_token", "idToken is required"));
    }

    let credential = state
        .provider
        .mint_session(id_token, SESSION_MAX_AGE)
        .await
        .map_err(|e| {
            error!(target: "caceg::session", error = %e, "session minting failed");
            SessionError::MintingFailure(e.to_string())
        })?;
    let cookie = session_cookie(&credential, SESSION_MAX_AGE)
        .map_err(|e| SessionError::MintingFailure(format!("credential is not cookie-safe: {}", e)))?;

    info!(target: "caceg::session", max_age_secs = SESSION_MAX_AGE.as_secs(), "session issued");
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    Ok((StatusCode::OK, headers, Json(serde_json::json!({"success": true}))))
}

/// `GET /api/session/verify`: whether the request's cookie is currently valid.
pub async fn verify_session(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let valid = match session_from_headers(&headers) {
        Some(cred) => state.provider.verify_session(&cred).await.is_ok(),
        None => false,
    };
    Json(serde_json::json!({"valid": valid}))
}

/// `POST /api/logout`: revoke the credential at the provider and clear the cookie.
/// Safe to call without a session.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(cred) = session_from_headers(&headers) {
        match state.provider.revoke_session(&cred).await {
            Ok(revoked) => info!(target: "caceg::session", revoked, "logout"),
            Err(e) => warn!(target: "caceg::session", error = %e, "logout: provider revocation failed"),
        }
    }
    let mut h = HeaderMap::new();
    h.insert(SET_COOKIE, clear_session_cookie());
    (StatusCode::OK, h, Json(serde_json::json!({"success": true})))
}
