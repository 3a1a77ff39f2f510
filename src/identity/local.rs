//! In-process identity provider.
//!
//! Holds a small user table (Argon2 PHC hashes), hands out single-use identity
//! tokens on password sign-in, and mints/verifies session credentials through a
//! [`SessionTable`]. Used when no external provider URL is configured, and by tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use parking_lot::RwLock;
use password_hash::{PasswordHash, SaltString};
use tracing::{info, warn};

use super::principal::Principal;
use super::provider::{IdToken, IdentityError, IdentityProvider, IdentityResult};
use super::session::{check_session_ttl, expiry_ms, gen_token, SessionTable};
use crate::clock::{SharedClock, SystemClock};

/// Identity tokens are only good for the exchange that follows sign-in.
pub const ID_TOKEN_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct UserEntry {
    uid: String,
    email: String,
    password_hash: String,
}

pub struct LocalIdentityProvider {
    users: RwLock<HashMap<String, UserEntry>>,
    id_tokens: RwLock<HashMap<String, IdToken>>,
    sessions: SessionTable,
    clock: SharedClock,
    id_token_ttl: Duration,
}

impl std::fmt::Debug for LocalIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalIdentityProvider")
            .field("users", &self.users.read().len())
            .field("live_sessions", &self.sessions.live_count())
            .finish()
    }
}

fn hash_password(password: &str) -> IdentityResult<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| IdentityError::Internal(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| IdentityError::Internal(e.to_string()))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| IdentityError::Internal(e.to_string()))?
        .to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

impl LocalIdentityProvider {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            id_tokens: RwLock::new(HashMap::new()),
            sessions: SessionTable::new(),
            clock,
            id_token_ttl: ID_TOKEN_TTL,
        }
    }

    pub fn with_system_clock() -> Self { Self::new(Arc::new(SystemClock)) }

    /// Adds or replaces a user; returns the user id.
    pub fn add_user(&self, email: &str, password: &str) -> IdentityResult<String> {
        let key = normalize_email(email);
        if key.is_empty() || password.is_empty() {
            return Err(IdentityError::InvalidCredentials);
        }
        let password_hash = hash_password(password)?;
        let mut users = self.users.write();
        let uid = users
            .get(&key)
            .map(|u| u.uid.clone())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        users.insert(key.clone(), UserEntry { uid: uid.clone(), email: key, password_hash });
        Ok(uid)
    }

    /// Seeds the given admin account when the user table is empty.
    pub fn ensure_default_admin(&self, email: &str, password: &str) -> IdentityResult<()> {
        if !self.users.read().is_empty() {
            return Ok(());
        }
        warn!(target: "caceg::identity", email = %email, "no users configured; seeding default admin account");
        self.add_user(email, password).map(|_| ())
    }

    /// Revokes every session of a user, e.g. after a password change.
    pub fn revoke_user(&self, uid: &str) -> usize { self.sessions.revoke_user(uid) }

    pub fn live_sessions(&self) -> usize { self.sessions.live_count() }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<IdToken> {
        let key = normalize_email(email);
        let user = self.users.read().get(&key).cloned();
        let Some(user) = user else { return Err(IdentityError::InvalidCredentials); };
        if !verify_password(&user.password_hash, password) {
            return Err(IdentityError::InvalidCredentials);
        }
        let now = self.clock.now_ms();
        let token = IdToken {
            token: gen_token()?,
            uid: user.uid.clone(),
            email: user.email.clone(),
            expires_at_ms: expiry_ms(now, self.id_token_ttl)?,
        };
        {
            let mut tokens = self.id_tokens.write();
            tokens.retain(|_, t| t.expires_at_ms > now);
            tokens.insert(token.token.clone(), token.clone());
        }
        info!(target: "caceg::identity", uid = %user.uid, "auth.sign_in");
        Ok(token)
    }

    async fn mint_session(&self, id_token: &str, valid_for: Duration) -> IdentityResult<String> {
        // a refused lifetime must not burn the single-use token
        check_session_ttl(valid_for)?;
        let Some(token) = self.id_tokens.write().remove(id_token.trim()) else {
            return Err(IdentityError::InvalidIdToken);
        };
        let now = self.clock.now_ms();
        if token.expires_at_ms <= now {
            return Err(IdentityError::InvalidIdToken);
        }
        let principal = Principal { uid: token.uid, email: token.email };
        let record = self.sessions.issue(principal, valid_for, now)?;
        Ok(record.credential)
    }

    async fn verify_session(&self, credential: &str) -> IdentityResult<Principal> {
        self.sessions.validate(credential, self.clock.now_ms())
    }

    async fn revoke_session(&self, credential: &str) -> IdentityResult<bool> {
        Ok(self.sessions.revoke(credential))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn provider() -> (LocalIdentityProvider, ManualClock) {
        let clock = ManualClock::new(1_700_000_000_000);
        let p = LocalIdentityProvider::new(Arc::new(clock.clone()));
        p.add_user("Admin@CACEG.dz", "s3cret").unwrap();
        (p, clock)
    }

    #[tokio::test]
    async fn sign_in_mint_verify() {
        let (p, _clock) = provider();
        let tok = p.sign_in("admin@caceg.dz", "s3cret").await.unwrap();
        assert_eq!(tok.email, "admin@caceg.dz");
        let cred = p.mint_session(&tok.token, Duration::from_secs(3600)).await.unwrap();
        let who = p.verify_session(&cred).await.unwrap();
        assert_eq!(who.uid, tok.uid);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let (p, _clock) = provider();
        assert_eq!(p.sign_in("admin@caceg.dz", "nope").await, Err(IdentityError::InvalidCredentials));
        assert_eq!(p.sign_in("ghost@caceg.dz", "s3cret").await, Err(IdentityError::InvalidCredentials));
    }

    #[tokio::test]
    async fn id_tokens_are_single_use() {
        let (p, _clock) = provider();
        let tok = p.sign_in("admin@caceg.dz", "s3cret").await.unwrap();
        p.mint_session(&tok.token, Duration::from_secs(60)).await.unwrap();
        assert_eq!(p.mint_session(&tok.token, Duration::from_secs(60)).await, Err(IdentityError::InvalidIdToken));
    }

    #[tokio::test]
    async fn out_of_range_lifetime_keeps_the_id_token() {
        let (p, _clock) = provider();
        let tok = p.sign_in("admin@caceg.dz", "s3cret").await.unwrap();
        for ttl in [Duration::ZERO, Duration::from_secs(u64::MAX)] {
            let err = p.mint_session(&tok.token, ttl).await.unwrap_err();
            assert_eq!(err.http_status(), 400);
        }
        let cred = p.mint_session(&tok.token, Duration::from_secs(3600)).await.unwrap();
        assert!(p.verify_session(&cred).await.is_ok());
    }

    #[tokio::test]
    async fn stale_id_token_cannot_mint() {
        let (p, clock) = provider();
        let tok = p.sign_in("admin@caceg.dz", "s3cret").await.unwrap();
        clock.advance(ID_TOKEN_TTL);
        assert_eq!(p.mint_session(&tok.token, Duration::from_secs(60)).await, Err(IdentityError::InvalidIdToken));
    }

    #[tokio::test]
    async fn session_expires_after_validity_window() {
        let (p, clock) = provider();
        let tok = p.sign_in("admin@caceg.dz", "s3cret").await.unwrap();
        let cred = p.mint_session(&tok.token, Duration::from_secs(3600)).await.unwrap();
        clock.advance(Duration::from_secs(3600));
        assert_eq!(p.verify_session(&cred).await, Err(IdentityError::SessionExpired));
    }

    #[tokio::test]
    async fn revoke_user_invalidates_sessions() {
        let (p, _clock) = provider();
        let tok = p.sign_in("admin@caceg.dz", "s3cret").await.unwrap();
        let cred = p.mint_session(&tok.token, Duration::from_secs(3600)).await.unwrap();
        assert_eq!(p.revoke_user(&tok.uid), 1);
        assert_eq!(p.verify_session(&cred).await, Err(IdentityError::SessionRevoked));
    }

    #[test]
    fn default_admin_only_seeded_once() {
        let p = LocalIdentityProvider::with_system_clock();
        p.ensure_default_admin("a@caceg.dz", "x").unwrap();
        p.ensure_default_admin("b@caceg.dz", "y").unwrap();
        assert_eq!(p.users.read().len(), 1);
    }
}
