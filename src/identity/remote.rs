use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::principal::Principal;
use super::provider::{IdToken, IdentityError, IdentityProvider, IdentityResult};

pub const SIGN_IN_PATH: &str = "/identity/v1/accounts:signIn";
pub const MINT_PATH: &str = "/identity/v1/sessions:mint";
pub const VERIFY_PATH: &str = "/identity/v1/sessions:verify";
pub const REVOKE_PATH: &str = "/identity/v1/sessions:revoke";

/// Client for an identity provider reached over HTTP.
#[derive(Debug, Clone)]
pub struct RemoteIdentityProvider {
    base: Url,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MintResponse { session_cookie: String }

#[derive(Debug, Deserialize)]
struct RevokeResponse { revoked: bool }

#[derive(Debug, Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    error: String,
}

impl RemoteIdentityProvider {
    pub fn new(base: &str) -> IdentityResult<Self> {
        let base = Url::parse(base).map_err(|e| IdentityError::Internal(format!("invalid identity provider URL '{}': {}", base, e)))?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| IdentityError::Internal(e.to_string()))?;
        Ok(Self { base, client })
    }

    pub fn base(&self) -> &Url { &self.base }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> IdentityResult<T> {
        let url = self.base.join(path).map_err(|e| IdentityError::Internal(e.to_string()))?;
        let resp = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let err: ErrorBody = resp.json().await.unwrap_or_default();
            debug!(target: "caceg::identity", path, status = status.as_u16(), code = %err.code, "provider rejected request");
            return Err(IdentityError::from_code(&err.code, status.as_u16(), err.error));
        }
        resp.json::<T>().await.map_err(|e| IdentityError::Transport(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<IdToken> {
        self.post(SIGN_IN_PATH, serde_json::json!({"email": email, "password": password})).await
    }

    async fn mint_session(&self, id_token: &str, valid_for: Duration) -> IdentityResult<String> {
        let resp: MintResponse = self
            .post(MINT_PATH, serde_json::json!({"idToken": id_token, "validSeconds": valid_for.as_secs()}))
            .await?;
        Ok(resp.session_cookie)
    }

    async fn verify_session(&self, credential: &str) -> IdentityResult<Principal> {
        self.post(VERIFY_PATH, serde_json::json!({"sessionCookie": credential})).await
    }

    async fn revoke_session(&self, credential: &str) -> IdentityResult<bool> {
        let resp: RevokeResponse = self.post(REVOKE_PATH, serde_json::json!({"sessionCookie": credential})).await?;
        Ok(resp.revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_base_url() {
        assert!(matches!(RemoteIdentityProvider::new("not a url"), Err(IdentityError::Internal(_))));
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_transport_error() {
        // port 9 (discard) on loopback is not listening in test environments
        let p = RemoteIdentityProvider::new("http://127.0.0.1:9").unwrap();
        let err = p.verify_session("anything").await.unwrap_err();
        assert!(matches!(err, IdentityError::Transport(_)), "got {err:?}");
    }
}
