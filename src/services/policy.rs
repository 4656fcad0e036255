//! Route classification and role checks shared by the edge interceptor and
//! the client route guard.

use crate::config::keys;
use crate::models::Role;

/// Page users land on after login or when denied
pub const LANDING_PATH: &str = "/dashboard";
pub const LOGIN_PATH: &str = "/login";
pub const ACCESS_DENIED_ERROR: &str = "access_denied";

pub const PUBLIC_ROUTES: &[&str] = &[
    "/",
    "/login",
    "/register",
    "/recover-password",
    "/terms-of-service",
    "/privacy-policy",
    "/about",
    "/contact",
];

/// Reachable only while signed out
pub const AUTH_ROUTES: &[&str] = &["/login", "/register", "/recover-password"];

pub const PROTECTED_ROUTES: &[&str] = &[
    "/dashboard",
    "/projetos",
    "/monitorias",
    "/eventos",
    "/relatorios",
    "/profile",
    "/settings",
    "/usuarios",
    "/configuracoes",
];

pub const ROLE_RESTRICTED_ROUTES: &[(&str, &[Role])] = &[
    ("/usuarios", &[Role::Admin]),
    ("/configuracoes", &[Role::Admin]),
    ("/relatorios", &[Role::User, Role::Admin]),
];

/// Sections whose detail pages survive a login round trip
const CALLBACK_SECTIONS: &[&str] = &["/projetos/", "/eventos/", "/monitorias/"];

const BYPASS_PREFIXES: &[&str] = &["/_next/", "/api/", "/static/", "/favicon"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    AuthOnly,
    Protected,
    Restricted(&'static [Role]),
    Unclassified,
}

impl RouteClass {
    pub fn requires_auth(&self) -> bool {
        matches!(self, RouteClass::Protected | RouteClass::Restricted(_))
    }

    pub fn required_roles(&self) -> &'static [Role] {
        match self {
            RouteClass::Restricted(roles) => *roles,
            _ => &[],
        }
    }
}

/// Segment-aware prefix match; `/` only matches itself
fn matches_route(path: &str, route: &str) -> bool {
    if route == "/" {
        return path == "/";
    }
    match path.strip_prefix(route) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

pub fn is_auth_route(path: &str) -> bool {
    let path = strip_query(path);
    AUTH_ROUTES.iter().any(|r| matches_route(path, r))
}

/// Paths the edge layer never inspects
pub fn is_bypassed(path: &str) -> bool {
    BYPASS_PREFIXES.iter().any(|p| path.starts_with(p)) || path.contains('.')
}

/// Classify a path; auth-only wins over public, restrictions over plain protection
pub fn classify(path: &str) -> RouteClass {
    let path = strip_query(path);

    if AUTH_ROUTES.iter().any(|r| matches_route(path, r)) {
        return RouteClass::AuthOnly;
    }
    if let Some(&(_, roles)) = ROLE_RESTRICTED_ROUTES
        .iter()
        .find(|(r, _)| matches_route(path, r))
    {
        return RouteClass::Restricted(roles);
    }
    if PROTECTED_ROUTES.iter().any(|r| matches_route(path, r)) {
        return RouteClass::Protected;
    }
    if PUBLIC_ROUTES.iter().any(|r| matches_route(path, r)) {
        return RouteClass::Public;
    }
    RouteClass::Unclassified
}

/// Empty `required` means any authenticated role
pub fn is_allowed(role: Role, required: &[Role]) -> bool {
    required.is_empty() || required.contains(&role)
}

/// Login URL for an unauthenticated visit to `path`.
///
/// Only detail views under the project, event and monitoria sections carry
/// the original path as a callback.
pub fn login_redirect(path: &str) -> String {
    let bare = strip_query(path);
    if CALLBACK_SECTIONS.iter().any(|s| bare.starts_with(s)) {
        format!(
            "{}?{}={}",
            LOGIN_PATH,
            keys::CALLBACK_PARAM,
            urlencoding::encode(path)
        )
    } else {
        LOGIN_PATH.to_string()
    }
}

/// A same-origin path: leading `/`, no `//` host form, no backslashes and
/// nothing that cannot go into a `Location` header
fn is_local_path(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains('\\')
        && !target.chars().any(char::is_control)
}

/// Where an authenticated user goes from an auth-only page
pub fn post_login_destination(callback: Option<&str>) -> String {
    match callback {
        Some(cb) if is_local_path(cb) && !is_auth_route(cb) => cb.to_string(),
        _ => LANDING_PATH.to_string(),
    }
}

pub fn access_denied_redirect() -> String {
    format!("{}?error={}", LANDING_PATH, ACCESS_DENIED_ERROR)
}

/// Reads the callback parameter out of a raw query string
pub fn callback_from_query(query: Option<&str>) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == keys::CALLBACK_PARAM)
        .and_then(|(_, v)| urlencoding::decode(&v.replace('+', " ")).ok().map(|d| d.into_owned()))
        .filter(|v| !v.is_empty())
}
