//! Shared helpers: an in-process server on an ephemeral localhost port.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use caceg::identity::{IdentityProvider, LocalIdentityProvider, SharedProvider};
use caceg::server::{router, serve, AppState};

pub const ADMIN_EMAIL: &str = "direction@caceg.dz";
pub const ADMIN_PASSWORD: &str = "formation-2024";

pub struct TestServer {
    pub base: String,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) { self.handle.abort(); }
}

/// Serve the full router around `provider`. The listener is bound before the task
/// starts, so the server is reachable as soon as this returns.
pub async fn start_with(provider: SharedProvider, serve_identity_api: bool) -> TestServer {
    let app = router(AppState::new(provider), serve_identity_api);
    let listener = TcpListener::bind(("127.0.0.1", 0)).await.expect("bind 127.0.0.1:0");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        if let Err(e) = serve(listener, app).await {
            eprintln!("test server error: {e:?}");
        }
    });
    TestServer { base: format!("http://{}", addr), handle }
}

pub fn local_provider() -> Arc<LocalIdentityProvider> {
    let p = Arc::new(LocalIdentityProvider::with_system_clock());
    p.add_user(ADMIN_EMAIL, ADMIN_PASSWORD).expect("seed admin");
    p
}

pub async fn start_local() -> (TestServer, Arc<LocalIdentityProvider>) {
    let provider = local_provider();
    let server = start_with(provider.clone(), true).await;
    (server, provider)
}

/// HTTP client that reports redirects instead of following them.
pub fn http() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client")
}

/// Sign in and mint a one-hour credential directly at the provider.
pub async fn mint_credential(provider: &LocalIdentityProvider) -> String {
    let tok = provider.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await.expect("sign in");
    provider.mint_session(&tok.token, Duration::from_secs(3600)).await.expect("mint")
}

pub fn set_cookies(resp: &reqwest::Response) -> Vec<String> {
    resp.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(|s| s.to_string()))
        .collect()
}
