//! Page shells. Content management screens live behind these routes but are not
//! rendered by this service; the shells exist so the gate has something to guard.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::paths::{is_protected, LOGIN_PATH};

pub async fn home() -> Html<&'static str> {
    Html("<!doctype html><title>CACEG Consulting</title><h1>CACEG Consulting</h1><p>Formations professionnelles en Algérie.</p>")
}

pub async fn login_page() -> Html<&'static str> {
    Html(concat!(
        "<!doctype html><title>Connexion administrateur</title>",
        "<h1>Connexion</h1>",
        "<form id=\"login\"><input name=\"email\" type=\"email\"><input name=\"password\" type=\"password\">",
        "<button type=\"submit\">Se connecter</button></form>",
    ))
}

pub async fn expired_page() -> Html<String> {
    Html(format!(
        "<!doctype html><title>Session expirée</title><h1>Votre session a expiré</h1><a href=\"{}\">Retour à la connexion</a>",
        LOGIN_PATH
    ))
}

pub async fn admin_home() -> Html<&'static str> {
    Html("<!doctype html><title>Administration</title><h1>Tableau de bord</h1><div id=\"admin-root\"></div>")
}

/// Shell for any admin section. Asset and file-like paths are never pages.
pub async fn admin_page(Path(rest): Path<String>) -> Response {
    if !is_protected(&format!("/admin/{}", rest)) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let section = rest.split('/').next().unwrap_or_default();
    Html(format!(
        "<!doctype html><title>Administration</title><h1>Administration</h1><div id=\"admin-root\" data-section=\"{}\"></div>",
        section.replace(['"', '<', '>', '&'], "")
    ))
    .into_response()
}
