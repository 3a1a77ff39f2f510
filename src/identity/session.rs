use std::collections::{HashMap, HashSet};
use std::time::Duration;

use base64::Engine;
use parking_lot::RwLock;
use tracing::debug;

use super::principal::Principal;
use super::provider::{IdentityError, IdentityResult};

/// Longest validity a session credential may be minted with.
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// A minted session credential and what it stands for.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub credential: String,
    pub principal: Principal,
    pub issued_at_ms: i64,
    pub expires_at_ms: i64,
}

/// In-memory table of live session credentials, indexed by credential and by user.
/// Revoked credentials are remembered until their original expiry; after that they
/// fail as unknown anyway.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    user_index: RwLock<HashMap<String, HashSet<String>>>,
    revoked: RwLock<HashMap<String, i64>>,
}

/// 256-bit random token, base64url without padding.
pub(crate) fn gen_token() -> IdentityResult<String> {
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).map_err(|e| IdentityError::Internal(e.to_string()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

/// Accepts a session lifetime only if it is non-zero and within [`MAX_SESSION_TTL`].
pub fn check_session_ttl(ttl: Duration) -> IdentityResult<()> {
    if ttl.is_zero() || ttl > MAX_SESSION_TTL {
        return Err(IdentityError::InvalidSessionDuration(ttl.as_secs()));
    }
    Ok(())
}

/// `now_ms + ttl` in epoch millis, or an error when it does not fit.
pub(crate) fn expiry_ms(now_ms: i64, ttl: Duration) -> IdentityResult<i64> {
    i64::try_from(ttl.as_millis())
        .ok()
        .and_then(|ms| now_ms.checked_add(ms))
        .ok_or_else(|| IdentityError::Internal(format!("lifetime of {}s is out of range", ttl.as_secs())))
}

fn unindex(index: &mut HashMap<String, HashSet<String>>, uid: &str, credential: &str) {
    if let Some(set) = index.get_mut(uid) {
        set.remove(credential);
        if set.is_empty() {
            index.remove(uid);
        }
    }
}

impl SessionTable {
    pub fn new() -> Self { Self::default() }

    pub fn issue(&self, principal: Principal, ttl: Duration, now_ms: i64) -> IdentityResult<SessionRecord> {
        let expires_at_ms = expiry_ms(now_ms, ttl)?;
        let credential = gen_token()?;
        let record = SessionRecord {
            credential: credential.clone(),
            principal: principal.clone(),
            issued_at_ms: now_ms,
            expires_at_ms,
        };
        self.sweep(now_ms);
        self.sessions.write().insert(credential.clone(), record.clone());
        self.user_index
            .write()
            .entry(principal.uid.clone())
            .or_default()
            .insert(credential);
        debug!(target: "caceg::identity", uid = %principal.uid, ttl_secs = ttl.as_secs(), "session.issue");
        Ok(record)
    }

    pub fn validate(&self, credential: &str, now_ms: i64) -> IdentityResult<Principal> {
        if self.revoked.read().get(credential).is_some_and(|exp| *exp > now_ms) {
            return Err(IdentityError::SessionRevoked);
        }
        let expired = {
            let map = self.sessions.read();
            let Some(rec) = map.get(credential) else { return Err(IdentityError::UnknownSession); };
            if rec.expires_at_ms > now_ms {
                return Ok(rec.principal.clone());
            }
            rec.principal.uid.clone()
        };
        // prune
        self.sessions.write().remove(credential);
        unindex(&mut self.user_index.write(), &expired, credential);
        Err(IdentityError::SessionExpired)
    }

    pub fn revoke(&self, credential: &str) -> bool {
        let Some(rec) = self.sessions.write().remove(credential) else { return false; };
        unindex(&mut self.user_index.write(), &rec.principal.uid, credential);
        self.revoked.write().insert(credential.to_string(), rec.expires_at_ms);
        true
    }

    pub fn revoke_user(&self, uid: &str) -> usize {
        let Some(tokens) = self.user_index.write().remove(uid) else { return 0; };
        let mut sessions = self.sessions.write();
        let mut revoked = self.revoked.write();
        let mut count = 0usize;
        for t in tokens {
            if let Some(rec) = sessions.remove(&t) {
                revoked.insert(t, rec.expires_at_ms);
                count += 1;
            }
        }
        debug!(target: "caceg::identity", uid = %uid, count, "session.revoke_user");
        count
    }

    /// Drop expired sessions, their index entries and revocations that have outlived
    /// the credential they block.
    pub fn sweep(&self, now_ms: i64) -> usize {
        let mut sessions = self.sessions.write();
        let mut index = self.user_index.write();
        let before = sessions.len();
        sessions.retain(|cred, rec| {
            let live = rec.expires_at_ms > now_ms;
            if !live {
                unindex(&mut index, &rec.principal.uid, cred);
            }
            live
        });
        let dropped = before - sessions.len();
        self.revoked.write().retain(|_, exp| *exp > now_ms);
        if dropped > 0 {
            debug!(target: "caceg::identity", dropped, "session.sweep");
        }
        dropped
    }

    pub fn live_count(&self) -> usize { self.sessions.read().len() }

    pub fn revoked_count(&self) -> usize { self.revoked.read().len() }

    pub fn indexed_users(&self) -> usize { self.user_index.read().len() }
}
