//! Admin client: the signed-in side of the back office.
//!
//! Holds the `session` cookie the server issued, records the login time in a
//! per-profile store, and runs the freshness guard before admin navigations.

mod admin_client;
mod guard;
mod local_store;
mod session_clock;

pub use admin_client::{AdminClient, Navigation};
pub use guard::{ClientAuth, FreshnessGuard, GuardOutcome};
pub use local_store::LocalStore;
pub use session_clock::{SessionClock, LOGIN_TIME_KEY};

use crate::identity::IdentityError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("local storage: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}
