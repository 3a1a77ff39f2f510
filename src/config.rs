//! Runtime configuration for the server and the admin client.
//! Values come from CLI flags first, then environment variables, then defaults.

use std::path::PathBuf;

pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@caceg.dz";
pub const DEFAULT_ADMIN_PASSWORD: &str = "caceg";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_PROFILE_DIR: &str = ".caceg-profile";

/// Value following `flag`, if the flag is present with a value.
pub fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_port(s: Option<String>) -> Option<u16> {
    s.and_then(|v| v.parse::<u16>().ok())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: String,
    pub http_port: u16,
    /// External identity provider base URL; `None` runs the in-process provider.
    pub identity_url: Option<String>,
    pub admin_email: String,
    pub admin_password: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            identity_url: None,
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_and_args(args: &[String]) -> Self {
        Self::resolve(args, |k| std::env::var(k).ok())
    }

    pub fn resolve(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        Self {
            bind: arg_value(args, "--bind").or_else(|| env("CACEG_BIND")).unwrap_or(d.bind),
            http_port: parse_port(arg_value(args, "--http-port"))
                .or_else(|| parse_port(env("CACEG_HTTP_PORT")))
                .unwrap_or(d.http_port),
            identity_url: arg_value(args, "--identity-url")
                .or_else(|| env("CACEG_IDENTITY_URL"))
                .filter(|s| !s.trim().is_empty()),
            admin_email: env("CACEG_ADMIN_EMAIL").unwrap_or(d.admin_email),
            admin_password: env("CACEG_ADMIN_PASSWORD").unwrap_or(d.admin_password),
        }
    }

    pub fn uses_local_identity(&self) -> bool { self.identity_url.is_none() }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Identity provider base URL; defaults to the site itself.
    pub identity_url: String,
    pub profile_dir: PathBuf,
}

impl ClientConfig {
    pub fn from_env_and_args(args: &[String]) -> Self {
        Self::resolve(args, |k| std::env::var(k).ok())
    }

    pub fn resolve(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = arg_value(args, "--base-url")
            .or_else(|| env("CACEG_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let identity_url = arg_value(args, "--identity-url")
            .or_else(|| env("CACEG_IDENTITY_URL"))
            .unwrap_or_else(|| base_url.clone());
        let profile_dir = arg_value(args, "--profile")
            .or_else(|| env("CACEG_PROFILE_DIR"))
            .unwrap_or_else(|| DEFAULT_PROFILE_DIR.to_string());
        Self { base_url, identity_url, profile_dir: PathBuf::from(profile_dir) }
    }
}
