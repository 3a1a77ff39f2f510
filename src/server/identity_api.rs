//! Provider REST surface, served when the in-process identity provider is active.
//! `RemoteIdentityProvider` speaks exactly this protocol.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::time::Duration;

use super::AppState;
use crate::identity::{check_session_ttl, IdentityError};

#[derive(Debug, Deserialize)]
pub struct SignInPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintPayload {
    pub id_token: String,
    pub valid_seconds: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPayload {
    pub session_cookie: String,
}

fn identity_error(e: IdentityError) -> Response {
    let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(serde_json::json!({"code": e.code_str(), "error": e.to_string()}))).into_response()
}

pub async fn sign_in(State(state): State<AppState>, Json(p): Json<SignInPayload>) -> Response {
    match state.provider.sign_in(&p.email, &p.password).await {
        Ok(token) => Json(token).into_response(),
        Err(e) => identity_error(e),
    }
}

pub async fn mint(State(state): State<AppState>, Json(p): Json<MintPayload>) -> Response {
    let valid_for = Duration::from_secs(p.valid_seconds);
    if let Err(e) = check_session_ttl(valid_for) {
        return identity_error(e);
    }
    match state.provider.mint_session(&p.id_token, valid_for).await {
        Ok(cookie) => Json(serde_json::json!({"sessionCookie": cookie})).into_response(),
        Err(e) => identity_error(e),
    }
}

pub async fn verify(State(state): State<AppState>, Json(p): Json<CredentialPayload>) -> Response {
    match state.provider.verify_session(&p.session_cookie).await {
        Ok(principal) => Json(principal).into_response(),
        Err(e) => identity_error(e),
    }
}

pub async fn revoke(State(state): State<AppState>, Json(p): Json<CredentialPayload>) -> Response {
    match state.provider.revoke_session(&p.session_cookie).await {
        Ok(revoked) => Json(serde_json::json!({"revoked": revoked})).into_response(),
        Err(e) => identity_error(e),
    }
}
