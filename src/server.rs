//!
//! caceg HTTP server
//! ------------------
//! Axum application for the CACEG Consulting site and its administrative area.
//!
//! Responsibilities:
//! - Edge gate middleware in front of every `/admin` path.
//! - Session issuance (`POST /api/session`), verification and logout endpoints.
//! - Provider REST surface under `/identity/v1` when running the in-process provider.
//! - Placeholder page shells for the public site and the admin area.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::routing::{get, post};
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::identity::{LocalIdentityProvider, RemoteIdentityProvider, SharedProvider};
use crate::identity::{MINT_PATH, REVOKE_PATH, SIGN_IN_PATH, VERIFY_PATH};
use crate::paths::{EXPIRED_PATH, LOGIN_PATH};

pub mod cookies;
pub mod gate;
pub mod identity_api;
pub mod pages;
pub mod session_api;

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub provider: SharedProvider,
}

impl AppState {
    pub fn new(provider: SharedProvider) -> Self { Self { provider } }
}

/// Build the application router. The gate layer wraps every route and the fallback,
/// so unknown admin paths are gated too.
pub fn router(state: AppState, serve_identity_api: bool) -> Router {
    let mut app = Router::new()
        .route("/", get(pages::home))
        .route("/api/session", post(session_api::issue_session))
        .route("/api/session/verify", get(session_api::verify_session))
        .route("/api/logout", post(session_api::logout))
        .route(LOGIN_PATH, get(pages::login_page))
        .route(EXPIRED_PATH, get(pages::expired_page))
        .route("/admin", get(pages::admin_home))
        .route("/admin/{*rest}", get(pages::admin_page));

    if serve_identity_api {
        app = app
            .route(SIGN_IN_PATH, post(identity_api::sign_in))
            .route(MINT_PATH, post(identity_api::mint))
            .route(VERIFY_PATH, post(identity_api::verify))
            .route(REVOKE_PATH, post(identity_api::revoke));
    }

    app.layer(middleware::from_fn_with_state(state.clone(), gate::edge_gate))
        .with_state(state)
}

/// Pick the identity provider from configuration. Returns whether the provider REST
/// surface should be served by this process.
pub fn build_provider(config: &ServerConfig) -> anyhow::Result<(SharedProvider, bool)> {
    match &config.identity_url {
        Some(url) => {
            let remote = RemoteIdentityProvider::new(url)
                .with_context(|| format!("While configuring identity provider at {}", url))?;
            info!(target: "startup", identity_url = %url, "using remote identity provider");
            Ok((Arc::new(remote), false))
        }
        None => {
            let local = LocalIdentityProvider::with_system_clock();
            local
                .ensure_default_admin(&config.admin_email, &config.admin_password)
                .context("While seeding the default admin account")?;
            info!(target: "startup", "using in-process identity provider");
            Ok((Arc::new(local), true))
        }
    }
}

/// Serve `app` on an already bound listener until the process stops.
pub async fn serve(listener: TcpListener, app: Router) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!("Starting server on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    info!(
        target: "startup",
        "caceg starting: bind={}, http_port={}, identity={}",
        config.bind,
        config.http_port,
        config.identity_url.as_deref().unwrap_or("local")
    );
    let (provider, serve_identity_api) = build_provider(&config)?;
    let app = router(AppState::new(provider), serve_identity_api);

    let addr: SocketAddr = format!("{}:{}", config.bind, config.http_port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind, config.http_port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    serve(listener, app).await
}
