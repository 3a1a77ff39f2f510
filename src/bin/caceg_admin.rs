//!
//! caceg admin client
//! -------------------
//! Logs into the back office, opens the given admin paths in order (running the
//! freshness guard before each) and optionally logs out again.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use caceg::client::{AdminClient, Navigation};
use caceg::config::{arg_value, has_flag, ClientConfig};

/// Positional arguments: everything that is neither a flag nor a flag's value.
fn positional(args: &[String]) -> Vec<String> {
    const VALUED: &[&str] = &["--base-url", "--identity-url", "--profile", "--email", "--password"];
    let mut out = Vec::new();
    let mut i = 1;
    while i < args.len() {
        let a = &args[i];
        if VALUED.contains(&a.as_str()) {
            i += 2;
            continue;
        }
        if !a.starts_with("--") { out.push(a.clone()); }
        i += 1;
    }
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("caceg admin client\n\nUSAGE:\n  caceg_admin --email E --password P [--base-url URL] [--identity-url URL] [--profile DIR] [--logout] [PATH ...]\n\nEnvironment: CACEG_BASE_URL, CACEG_IDENTITY_URL, CACEG_PROFILE_DIR.\n");
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    fmt().with_env_filter(filter).init();

    let cfg = ClientConfig::from_env_and_args(&args);
    let email = arg_value(&args, "--email").ok_or_else(|| anyhow!("--email is required"))?;
    let password = arg_value(&args, "--password").ok_or_else(|| anyhow!("--password is required"))?;

    let client = AdminClient::from_config(&cfg)?;
    let who = client.login(&email, &password).await?;
    println!("logged in as {} ({})", who.email, who.uid);

    for path in positional(&args) {
        match client.open(&path).await? {
            Navigation::Page { status, body } => println!("{} -> {} ({} bytes)", path, status, body.len()),
            Navigation::Redirect { location, reason } => {
                let why = reason.map(|r| r.code_str()).unwrap_or("redirect");
                println!("{} -> redirected to {} [{}]", path, location, why);
            }
        }
    }

    if has_flag(&args, "--logout") {
        client.logout().await?;
        println!("logged out");
    }
    Ok(())
}
