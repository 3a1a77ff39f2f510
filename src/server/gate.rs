//! Edge gate: runs in front of every request and keeps admin pages behind a
//! provider-verified session. Failures of any kind become a redirect to the
//! session-expired page; nothing from the protected handler is sent.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::{debug, info};

use super::cookies::session_from_headers;
use super::AppState;
use crate::identity::IdentityProvider;
use crate::paths::{is_protected, EXPIRED_PATH};
use crate::policy::{Decision, EdgePolicy, SessionContext, SessionPolicy};

/// Decide whether a request for `path` carrying `credential` may proceed.
pub async fn check_request(provider: &dyn IdentityProvider, path: &str, credential: Option<&str>) -> Decision {
    if !is_protected(path) {
        return Decision::Authorized;
    }
    let credential = credential.filter(|c| !c.is_empty());
    let authenticated = match credential {
        None => false,
        Some(c) => match provider.verify_session(c).await {
            Ok(principal) => {
                debug!(target: "caceg::gate", path, uid = %principal.uid, "session verified");
                true
            }
            Err(e) => {
                debug!(target: "caceg::gate", path, error = %e, "session verification failed");
                false
            }
        },
    };
    EdgePolicy.evaluate(&SessionContext {
        credential_present: credential.is_some(),
        authenticated,
        session_age: None,
    })
}

pub async fn edge_gate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let credential = session_from_headers(req.headers());
    match check_request(state.provider.as_ref(), &path, credential.as_deref()).await {
        Decision::Authorized => next.run(req).await,
        Decision::Redirect(reason) => {
            info!(target: "caceg::gate", path = %path, reason = reason.code_str(), "redirecting to session-expired");
            Redirect::to(EXPIRED_PATH).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::identity::{IdToken, IdentityError, IdentityResult, Principal};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Provider whose verification outcome is fixed.
    struct FixedProvider { accept: bool }

    #[async_trait]
    impl IdentityProvider for FixedProvider {
        async fn sign_in(&self, _: &str, _: &str) -> IdentityResult<IdToken> { Err(IdentityError::InvalidCredentials) }
        async fn mint_session(&self, _: &str, _: Duration) -> IdentityResult<String> { Err(IdentityError::InvalidIdToken) }
        async fn verify_session(&self, _: &str) -> IdentityResult<Principal> {
            if self.accept { Ok(Principal { uid: "u1".into(), email: "a@caceg.dz".into() }) }
            else { Err(IdentityError::Transport("connection reset".into())) }
        }
        async fn revoke_session(&self, _: &str) -> IdentityResult<bool> { Ok(false) }
    }

    #[tokio::test]
    async fn missing_cookie_redirects() {
        let p = FixedProvider { accept: true };
        assert_eq!(check_request(&p, "/admin/courses", None).await, Decision::Redirect(SessionError::NoCredential));
        assert_eq!(check_request(&p, "/admin", Some("")).await, Decision::Redirect(SessionError::NoCredential));
    }

    #[tokio::test]
    async fn provider_failure_folds_into_redirect() {
        let p = FixedProvider { accept: false };
        assert_eq!(
            check_request(&p, "/admin/students", Some("tok")).await,
            Decision::Redirect(SessionError::InvalidOrExpiredCredential)
        );
    }

    #[tokio::test]
    async fn verified_session_passes() {
        let p = FixedProvider { accept: true };
        assert!(check_request(&p, "/admin/students", Some("tok")).await.is_authorized());
    }

    #[tokio::test]
    async fn bypass_paths_ignore_cookie_state() {
        let p = FixedProvider { accept: false };
        for path in ["/admin/login", "/admin/session-expired", "/admin/logo.png", "/", "/contact"] {
            assert!(check_request(&p, path, None).await.is_authorized(), "{path}");
            assert!(check_request(&p, path, Some("bad")).await.is_authorized(), "{path}");
        }
    }
}
