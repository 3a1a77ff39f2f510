//! Composite session lifecycle as seen from one admin client.
//!
//! `NoSession -> Authenticating -> SessionIssued -> {SessionValid, SessionExpired} -> NoSession`

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    NoSession,
    Authenticating,
    SessionIssued,
    SessionValid,
    SessionExpired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Interactive sign-in produced a short-lived identity token.
    LoginSucceeded,
    CredentialMinted,
    MintingFailed,
    /// The edge gate let a protected request through.
    ProviderConfirmed,
    /// The edge gate redirected to the session-expired page.
    ProviderRejected,
    /// The freshness guard found the session older than the ceiling.
    Stale,
    Logout,
}

impl SessionState {
    pub fn on(self, event: SessionEvent) -> SessionState {
        use SessionEvent as E;
        use SessionState as S;
        match (self, event) {
            (_, E::Logout) => S::NoSession,
            (S::NoSession | S::SessionExpired, E::LoginSucceeded) => S::Authenticating,
            (S::Authenticating, E::CredentialMinted) => S::SessionIssued,
            (S::Authenticating, E::MintingFailed) => S::NoSession,
            (S::SessionIssued | S::SessionValid, E::ProviderConfirmed) => S::SessionValid,
            (S::SessionIssued | S::SessionValid, E::ProviderRejected | E::Stale) => S::SessionExpired,
            (state, _) => state,
        }
    }

    pub fn has_session(self) -> bool {
        matches!(self, SessionState::SessionIssued | SessionState::SessionValid)
    }
}
