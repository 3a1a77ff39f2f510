use std::io;
use std::time::Duration;

use super::local_store::LocalStore;
use crate::clock::SharedClock;

pub const LOGIN_TIME_KEY: &str = "caceg.loginTime";

/// Remembers when this client profile last logged in.
///
/// Written once per login, read by the freshness guard on every admin
/// navigation, cleared on logout or when the guard finds it stale.
#[derive(Debug)]
pub struct SessionClock {
    store: LocalStore,
    clock: SharedClock,
}

impl SessionClock {
    pub fn new(store: LocalStore, clock: SharedClock) -> Self { Self { store, clock } }

    /// Record "now" as the login time; returns the stored milliseconds.
    pub fn record_login(&self) -> io::Result<i64> {
        let now = self.clock.now_ms();
        self.store.set(LOGIN_TIME_KEY, &now.to_string())?;
        Ok(now)
    }

    pub fn clear_login(&self) -> io::Result<()> { self.store.remove(LOGIN_TIME_KEY) }

    pub fn login_time_ms(&self) -> Option<i64> {
        self.store.get(LOGIN_TIME_KEY)?.trim().parse::<i64>().ok()
    }

    /// Time since the recorded login, `None` if nothing is recorded.
    /// A login stamped in the future counts as zero age.
    pub fn age(&self) -> Option<Duration> {
        let login = self.login_time_ms()?;
        let elapsed = self.clock.now_ms().saturating_sub(login).max(0);
        Some(Duration::from_millis(elapsed as u64))
    }
}
