//! Session policy shared by the edge gate and the client freshness guard.
//!
//! Both checkpoints gather their signals into a [`SessionContext`] and ask a
//! [`SessionPolicy`] for a [`Decision`]. The edge gate trusts the identity
//! provider's verdict; the freshness guard also enforces the one-hour ceiling on
//! the client-recorded login time.

use std::time::Duration;

use crate::error::SessionError;

/// Sessions older than this are stale regardless of what the provider says.
pub const SESSION_CEILING: Duration = Duration::from_secs(60 * 60);

/// Signals a checkpoint collected before deciding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub credential_present: bool,
    pub authenticated: bool,
    /// Time since the recorded login; `None` when nothing was recorded.
    pub session_age: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Authorized,
    Redirect(SessionError),
}

impl Decision {
    pub fn is_authorized(&self) -> bool { matches!(self, Decision::Authorized) }
}

pub trait SessionPolicy {
    fn evaluate(&self, ctx: &SessionContext) -> Decision;
}

/// Request-time policy: a credential must be present and the provider must accept it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgePolicy;

impl SessionPolicy for EdgePolicy {
    fn evaluate(&self, ctx: &SessionContext) -> Decision {
        if !ctx.credential_present {
            return Decision::Redirect(SessionError::NoCredential);
        }
        if !ctx.authenticated {
            return Decision::Redirect(SessionError::InvalidOrExpiredCredential);
        }
        Decision::Authorized
    }
}

/// In-app policy: an authenticated user whose recorded login is younger than the ceiling.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    pub ceiling: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self { Self { ceiling: SESSION_CEILING } }
}

impl SessionPolicy for FreshnessPolicy {
    fn evaluate(&self, ctx: &SessionContext) -> Decision {
        if !ctx.authenticated {
            return Decision::Redirect(SessionError::NoCredential);
        }
        match ctx.session_age {
            // expired at or after the ceiling
            Some(age) if age < self.ceiling => Decision::Authorized,
            _ => Decision::Redirect(SessionError::ClientStale),
        }
    }
}
