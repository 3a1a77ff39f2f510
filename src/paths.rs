//! Administrative path layout and the bypass rules of the edge gate.

/// Every path at or below this prefix is administrative.
pub const ADMIN_PREFIX: &str = "/admin";
pub const LOGIN_PATH: &str = "/admin/login";
pub const EXPIRED_PATH: &str = "/admin/session-expired";

/// Framework asset trees. Requests inside them are never gated.
const ASSET_SEGMENTS: &[&str] = &["/_assets/", "/static/"];

pub fn is_admin_path(path: &str) -> bool {
    path == ADMIN_PREFIX || path.starts_with("/admin/")
}

/// True when the edge gate must see a valid session before serving `path`.
///
/// The login and session-expired pages stay reachable without a session, as do
/// asset trees and anything that looks like a file (a literal dot in the path).
pub fn is_protected(path: &str) -> bool {
    if !is_admin_path(path) {
        return false;
    }
    let trimmed = if path.len() > 1 { path.trim_end_matches('/') } else { path };
    if trimmed == LOGIN_PATH || trimmed == EXPIRED_PATH {
        return false;
    }
    if ASSET_SEGMENTS.iter().any(|seg| path.contains(seg)) {
        return false;
    }
    !path.contains('.')
}
