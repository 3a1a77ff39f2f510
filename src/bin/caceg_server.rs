//!
//! caceg server binary
//! --------------------
//! Starts the CACEG Consulting site with the gated admin area.
//! Configured via CLI flags and environment variables.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use caceg::config::{has_flag, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("caceg Server\n\nUSAGE:\n  caceg_server [--bind ADDR] [--http-port N] [--identity-url URL]\n\nOPTIONS:\n  --bind ADDR          Listen address (env: CACEG_BIND, default 0.0.0.0)\n  --http-port N        HTTP port (env: CACEG_HTTP_PORT, default 8080)\n  --identity-url URL   External identity provider (env: CACEG_IDENTITY_URL).\n                       Without it the in-process provider is used and seeded from\n                       CACEG_ADMIN_EMAIL / CACEG_ADMIN_PASSWORD.\n");
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env_and_args(&args);
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    tracing::info!(target: "startup", "RUST_LOG='{}'", rust_log);

    caceg::server::run(config).await
}
