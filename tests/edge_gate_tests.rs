//! Edge gate over HTTP: redirects for absent/invalid sessions, pass-through for
//! verified sessions and bypass pages.

mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{COOKIE, LOCATION};
use reqwest::StatusCode;

use caceg::identity::{IdToken, IdentityError, IdentityProvider, IdentityResult, Principal};
use common::{http, mint_credential, start_local, start_with};

const EXPIRED: &str = "/admin/session-expired";

/// Provider that is down: every call fails.
struct DownProvider;

#[async_trait]
impl IdentityProvider for DownProvider {
    async fn sign_in(&self, _: &str, _: &str) -> IdentityResult<IdToken> { Err(IdentityError::Transport("down".into())) }
    async fn mint_session(&self, _: &str, _: Duration) -> IdentityResult<String> { Err(IdentityError::Transport("down".into())) }
    async fn verify_session(&self, _: &str) -> IdentityResult<Principal> { Err(IdentityError::Transport("down".into())) }
    async fn revoke_session(&self, _: &str) -> IdentityResult<bool> { Err(IdentityError::Transport("down".into())) }
}

fn assert_expired_redirect(status: StatusCode, location: Option<&str>, body: &str) {
    assert!(status.is_redirection(), "expected redirect, got {status}");
    assert_eq!(location, Some(EXPIRED));
    assert!(!body.contains("admin-root"), "protected content leaked: {body}");
}

#[tokio::test]
async fn admin_paths_without_cookie_redirect() -> Result<()> {
    let (server, _provider) = start_local().await;
    for path in ["/admin", "/admin/courses", "/admin/students/12", "/admin/does/not/exist"] {
        let resp = http().get(format!("{}{}", server.base, path)).send().await?;
        let status = resp.status();
        let location = resp.headers().get(LOCATION).and_then(|v| v.to_str().ok()).map(|s| s.to_string());
        let body = resp.text().await?;
        assert_expired_redirect(status, location.as_deref(), &body);
    }
    Ok(())
}

#[tokio::test]
async fn bypass_pages_are_served_regardless_of_cookie() -> Result<()> {
    let (server, _provider) = start_local().await;
    for path in ["/admin/login", EXPIRED] {
        let plain = http().get(format!("{}{}", server.base, path)).send().await?;
        assert_eq!(plain.status(), StatusCode::OK, "{path}");
        let bogus = http()
            .get(format!("{}{}", server.base, path))
            .header(COOKIE, "session=forged")
            .send()
            .await?;
        assert_eq!(bogus.status(), StatusCode::OK, "{path}");
    }
    let expired_body = http().get(format!("{}{}", server.base, EXPIRED)).send().await?.text().await?;
    assert!(expired_body.contains("href=\"/admin/login\""));
    Ok(())
}

#[tokio::test]
async fn verified_session_reaches_admin_page() -> Result<()> {
    let (server, provider) = start_local().await;
    let cred = mint_credential(&provider).await;
    let resp = http()
        .get(format!("{}/admin/courses", server.base))
        .header(COOKIE, format!("session={}", cred))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await?.contains("data-section=\"courses\""));
    Ok(())
}

#[tokio::test]
async fn forged_and_revoked_sessions_redirect() -> Result<()> {
    let (server, provider) = start_local().await;
    let cred = mint_credential(&provider).await;
    assert!(provider.revoke_session(&cred).await?);
    for cookie in ["session=forged".to_string(), format!("session={}", cred)] {
        let resp = http().get(format!("{}/admin", server.base)).header(COOKIE, cookie).send().await?;
        let status = resp.status();
        let location = resp.headers().get(LOCATION).and_then(|v| v.to_str().ok()).map(|s| s.to_string());
        let body = resp.text().await?;
        assert_expired_redirect(status, location.as_deref(), &body);
    }
    Ok(())
}

#[tokio::test]
async fn provider_outage_redirects_instead_of_erroring() -> Result<()> {
    let server = start_with(Arc::new(DownProvider), false).await;
    let resp = http()
        .get(format!("{}/admin/messages", server.base))
        .header(COOKIE, "session=whatever")
        .send()
        .await?;
    assert!(!resp.status().is_server_error());
    let status = resp.status();
    let location = resp.headers().get(LOCATION).and_then(|v| v.to_str().ok()).map(|s| s.to_string());
    let body = resp.text().await?;
    assert_expired_redirect(status, location.as_deref(), &body);
    Ok(())
}

#[tokio::test]
async fn public_site_and_assets_are_open() -> Result<()> {
    let (server, _provider) = start_local().await;
    let home = http().get(format!("{}/", server.base)).send().await?;
    assert_eq!(home.status(), StatusCode::OK);
    // file-like admin path is not gated; it is simply not found
    let asset = http().get(format!("{}/admin/logo.png", server.base)).send().await?;
    assert!(!asset.status().is_redirection());
    Ok(())
}
