//! Identity provider seam: sign-in, session minting, verification and revocation.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod provider;
mod session;
mod local;
mod remote;

pub use principal::Principal;
pub use provider::{IdToken, IdentityError, IdentityProvider, IdentityResult, SharedProvider};
pub use session::{check_session_ttl, SessionRecord, SessionTable, MAX_SESSION_TTL};
pub use local::{LocalIdentityProvider, ID_TOKEN_TTL};
pub use remote::{RemoteIdentityProvider, MINT_PATH, REVOKE_PATH, SIGN_IN_PATH, VERIFY_PATH};
