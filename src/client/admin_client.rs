use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, COOKIE, LOCATION, SET_COOKIE};
use reqwest::Url;
use tracing::{debug, info, warn};

use super::guard::{ClientAuth, FreshnessGuard, GuardOutcome};
use super::local_store::LocalStore;
use super::session_clock::SessionClock;
use super::ClientError;
use crate::clock::SystemClock;
use crate::config::ClientConfig;
use crate::error::SessionError;
use crate::identity::{Principal, RemoteIdentityProvider, SharedProvider};
use crate::lifecycle::{SessionEvent, SessionState};
use crate::paths::{is_protected, EXPIRED_PATH};

const SESSION_COOKIE: &str = "session";

/// Result of navigating to a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Page { status: u16, body: String },
    Redirect { location: String, reason: Option<SessionError> },
}

pub struct AdminClient {
    base: Url,
    http: reqwest::Client,
    identity: SharedProvider,
    clock: SessionClock,
    guard: FreshnessGuard,
    cookie: RwLock<Option<String>>,
    user: RwLock<Option<Principal>>,
    state: RwLock<SessionState>,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("base", &self.base.as_str())
            .field("user", &*self.user.read())
            .field("state", &*self.state.read())
            .finish()
    }
}

/// The `session` value from Set-Cookie headers; an emptied cookie yields `None`.
fn session_from_set_cookie(headers: &HeaderMap) -> Option<String> {
    headers.get_all(SET_COOKIE).iter().find_map(|val| {
        let s = val.to_str().ok()?;
        let nv = s.split_once(';').map(|(nv, _)| nv).unwrap_or(s);
        let (name, value) = nv.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

impl AdminClient {
    pub fn new(base_url: &str, identity: SharedProvider, clock: SessionClock) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        // redirects are navigation results, not something to follow
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            base,
            http,
            identity,
            clock,
            guard: FreshnessGuard::default(),
            cookie: RwLock::new(None),
            user: RwLock::new(None),
            state: RwLock::new(SessionState::NoSession),
        })
    }

    pub fn from_config(cfg: &ClientConfig) -> Result<Self, ClientError> {
        let identity = RemoteIdentityProvider::new(&cfg.identity_url)?;
        let store = LocalStore::open(&cfg.profile_dir)?;
        let clock = SessionClock::new(store, Arc::new(SystemClock));
        Self::new(&cfg.base_url, Arc::new(identity), clock)
    }

    pub fn state(&self) -> SessionState { *self.state.read() }

    pub fn session_clock(&self) -> &SessionClock { &self.clock }

    pub fn has_session_cookie(&self) -> bool { self.cookie.read().is_some() }

    fn transition(&self, event: SessionEvent) {
        let mut s = self.state.write();
        let next = s.on(event);
        if next != *s {
            debug!(target: "caceg::client", from = ?*s, to = ?next, event = ?event, "session state");
        }
        *s = next;
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base.join(path).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))
    }

    fn with_cookie(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let cookie = self.cookie.read().clone();
        match cookie {
            Some(c) => req.header(COOKIE, format!("{}={}", SESSION_COOKIE, c)),
            None => req,
        }
    }

    /// Interactive login: sign in with the provider, exchange the identity token
    /// for the session cookie, then record the login time.
    pub async fn login(&self, email: &str, password: &str) -> Result<Principal, ClientError> {
        let token = self.identity.sign_in(email, password).await?;
        self.transition(SessionEvent::LoginSucceeded);

        let resp = match self
            .http
            .post(self.url("/api/session")?)
            .json(&serde_json::json!({"idToken": token.token}))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                self.transition(SessionEvent::MintingFailed);
                return Err(e.into());
            }
        };
        let status = resp.status();
        let cookie = session_from_set_cookie(resp.headers());
        let body: serde_json::Value = resp.json().await.unwrap_or(serde_json::json!({}));
        let Some(cookie) = cookie.filter(|_| status.is_success()) else {
            self.transition(SessionEvent::MintingFailed);
            let message = body
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("session issuance failed")
                .to_string();
            return Err(ClientError::Rejected { status: status.as_u16(), message });
        };

        *self.cookie.write() = Some(cookie);
        let principal = Principal { uid: token.uid, email: token.email };
        *self.user.write() = Some(principal.clone());
        self.clock.record_login()?;
        self.transition(SessionEvent::CredentialMinted);
        info!(target: "caceg::client", uid = %principal.uid, "logged in");
        Ok(principal)
    }

    /// Run the freshness guard as the admin area does when it mounts.
    pub async fn check_freshness(&self) -> GuardOutcome {
        self.guard.check(self, &self.clock).await
    }

    /// Navigate to `path`. Admin pages are guarded client-side first, then the
    /// request goes out with the session cookie and the edge gate decides.
    pub async fn open(&self, path: &str) -> Result<Navigation, ClientError> {
        let protected = is_protected(path);
        if protected {
            if let GuardOutcome::Redirect { to, reason } = self.check_freshness().await {
                return Ok(Navigation::Redirect { location: to.to_string(), reason: Some(reason) });
            }
        }

        let had_cookie = self.has_session_cookie();
        let resp = self.with_cookie(self.http.get(self.url(path)?)).send().await?;
        let status = resp.status();
        if status.is_redirection() {
            let location = resp
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let reason = if location == EXPIRED_PATH {
                self.transition(SessionEvent::ProviderRejected);
                self.forget_session();
                Some(if had_cookie { SessionError::InvalidOrExpiredCredential } else { SessionError::NoCredential })
            } else {
                None
            };
            return Ok(Navigation::Redirect { location, reason });
        }
        if protected && status.is_success() {
            self.transition(SessionEvent::ProviderConfirmed);
        }
        let body = resp.text().await?;
        Ok(Navigation::Page { status: status.as_u16(), body })
    }

    /// Drop the local copy of a session the edge gate has refused. The provider
    /// already considers the credential dead, so nothing is sent.
    fn forget_session(&self) {
        self.cookie.write().take();
        self.user.write().take();
        if let Err(e) = self.clock.clear_login() {
            warn!(target: "caceg::client", error = %e, "could not clear login time");
        }
        self.transition(SessionEvent::Logout);
    }

    /// Ask the server whether the held cookie is still valid.
    pub async fn session_valid(&self) -> Result<bool, ClientError> {
        let resp = self.with_cookie(self.http.get(self.url("/api/session/verify")?)).send().await?;
        let body: serde_json::Value = resp.json().await?;
        Ok(body.get("valid").and_then(|v| v.as_bool()).unwrap_or(false))
    }

    /// Manual logout: forget the login time and sign out.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.clock.clear_login()?;
        self.sign_out().await
    }
}

#[async_trait]
impl ClientAuth for AdminClient {
    async fn current_user(&self) -> Option<Principal> { self.user.read().clone() }

    async fn mark_stale(&self) { self.transition(SessionEvent::Stale); }

    async fn sign_out(&self) -> Result<(), ClientError> {
        let cookie = self.cookie.write().take();
        self.user.write().take();
        self.transition(SessionEvent::Logout);
        let Some(cookie) = cookie else { return Ok(()); };
        let resp = self
            .http
            .post(self.url("/api/logout")?)
            .header(COOKIE, format!("{}={}", SESSION_COOKIE, cookie))
            .send()
            .await?;
        if !resp.status().is_success() {
            warn!(target: "caceg::client", status = resp.status().as_u16(), "logout endpoint refused");
        }
        Ok(())
    }
}
