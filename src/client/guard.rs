//! Client freshness guard.
//!
//! Re-checks, inside the running admin client, that a user is still signed in and
//! that the recorded login is younger than the ceiling. On failure it signs out
//! and sends the client to the login page. It never talks to the edge gate.

use async_trait::async_trait;
use tracing::{info, warn};

use super::session_clock::SessionClock;
use super::ClientError;
use crate::error::SessionError;
use crate::identity::Principal;
use crate::paths::LOGIN_PATH;
use crate::policy::{Decision, FreshnessPolicy, SessionContext, SessionPolicy};

/// Client-side view of the identity provider.
#[async_trait]
pub trait ClientAuth: Send + Sync {
    /// The user the provider currently reports as signed in.
    async fn current_user(&self) -> Option<Principal>;

    /// The session was found stale; called before `sign_out`.
    async fn mark_stale(&self) {}

    /// Sign out. Must succeed when already signed out.
    async fn sign_out(&self) -> Result<(), ClientError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Render(Principal),
    Redirect { to: &'static str, reason: SessionError },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FreshnessGuard {
    policy: FreshnessPolicy,
}

impl FreshnessGuard {
    pub fn new(policy: FreshnessPolicy) -> Self { Self { policy } }

    pub async fn check(&self, auth: &dyn ClientAuth, clock: &SessionClock) -> GuardOutcome {
        let user = auth.current_user().await;
        let ctx = SessionContext {
            credential_present: user.is_some(),
            authenticated: user.is_some(),
            session_age: clock.age(),
        };
        let reason = match (self.policy.evaluate(&ctx), user) {
            (Decision::Authorized, Some(user)) => return GuardOutcome::Render(user),
            (Decision::Authorized, None) => SessionError::NoCredential,
            (Decision::Redirect(reason), _) => reason,
        };

        if reason == SessionError::ClientStale {
            auth.mark_stale().await;
            if let Err(e) = clock.clear_login() {
                warn!(target: "caceg::client", error = %e, "could not clear login time");
            }
        }
        if let Err(e) = auth.sign_out().await {
            warn!(target: "caceg::client", error = %e, "sign-out during guard redirect failed");
        }
        info!(target: "caceg::client", reason = reason.code_str(), "freshness guard redirecting to login");
        GuardOutcome::Redirect { to: LOGIN_PATH, reason }
    }
}
