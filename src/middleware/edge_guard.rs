use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use crate::config::keys;
use crate::services::policy::{self, RouteClass};
use crate::services::storage::{cookie_value, SessionCookie};
use crate::services::token;

/// State for the navigation middleware
#[derive(Clone, Debug)]
pub struct EdgeGuard {
    pub master_superuser: bool,
}

impl Default for EdgeGuard {
    fn default() -> Self {
        Self {
            master_superuser: true,
        }
    }
}

/// The parts of a navigation request the edge layer looks at
#[derive(Debug, Default, Clone, Copy)]
pub struct EdgeRequest<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub cookie_header: Option<&'a str>,
    pub authorization: Option<&'a str>,
    pub token_header: Option<&'a str>,
}

impl<'a> EdgeRequest<'a> {
    pub fn from_parts(path: &'a str, query: Option<&'a str>, headers: &'a HeaderMap) -> Self {
        let get = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        Self {
            path,
            query,
            cookie_header: get(header::COOKIE.as_str()),
            authorization: get(header::AUTHORIZATION.as_str()),
            token_header: get(keys::TOKEN_HEADER),
        }
    }

    /// Cookie first, then `Authorization: Bearer`, then the custom header
    pub fn credential(&self) -> Option<String> {
        let from_cookie = self
            .cookie_header
            .and_then(|h| cookie_value(h, keys::TOKEN));
        let from_bearer = || {
            self.authorization
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        };
        let from_header = || {
            self.token_header
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        };

        from_cookie.or_else(from_bearer).or_else(from_header)
    }
}

/// Outcome of one navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeDecision {
    Allow { clear_cookies: bool },
    Redirect { location: String, clear_cookies: bool },
}

impl EdgeDecision {
    fn allow() -> Self {
        EdgeDecision::Allow {
            clear_cookies: false,
        }
    }

    fn redirect(location: String) -> Self {
        EdgeDecision::Redirect {
            location,
            clear_cookies: false,
        }
    }

    fn clearing(self) -> Self {
        match self {
            EdgeDecision::Allow { .. } => EdgeDecision::Allow {
                clear_cookies: true,
            },
            EdgeDecision::Redirect { location, .. } => EdgeDecision::Redirect {
                location,
                clear_cookies: true,
            },
        }
    }

    pub fn clears_cookies(&self) -> bool {
        match self {
            EdgeDecision::Allow { clear_cookies } => *clear_cookies,
            EdgeDecision::Redirect { clear_cookies, .. } => *clear_cookies,
        }
    }
}

impl EdgeGuard {
    pub fn new(master_superuser: bool) -> Self {
        Self { master_superuser }
    }

    pub fn decide(&self, request: &EdgeRequest<'_>) -> EdgeDecision {
        self.decide_at(request, Utc::now())
    }

    pub fn decide_at(&self, request: &EdgeRequest<'_>, now: DateTime<Utc>) -> EdgeDecision {
        let path = request.path;

        if policy::is_bypassed(path) {
            return EdgeDecision::allow();
        }

        let credential = request.credential();
        let authenticated = credential
            .as_deref()
            .is_some_and(|t| !token::is_expired_at(t, now));
        let route = policy::classify(path);

        // Stale credential: drop the cookies and start over without a callback
        if credential.is_some() && !authenticated {
            tracing::debug!(path, "expired or unreadable credential at edge");
            let decision = if route.requires_auth() {
                EdgeDecision::redirect(policy::LOGIN_PATH.to_string())
            } else {
                EdgeDecision::allow()
            };
            return decision.clearing();
        }

        match route {
            RouteClass::AuthOnly if authenticated => {
                let callback = policy::callback_from_query(request.query);
                EdgeDecision::redirect(policy::post_login_destination(callback.as_deref()))
            }
            RouteClass::AuthOnly | RouteClass::Public | RouteClass::Unclassified => {
                EdgeDecision::allow()
            }
            RouteClass::Protected | RouteClass::Restricted(_) if !authenticated => {
                EdgeDecision::redirect(policy::login_redirect(path))
            }
            RouteClass::Protected => EdgeDecision::allow(),
            RouteClass::Restricted(required) => {
                let role = credential
                    .as_deref()
                    .and_then(|t| token::role_of(t, self.master_superuser));
                match role {
                    Some(role) if policy::is_allowed(role, required) => EdgeDecision::allow(),
                    _ => {
                        tracing::info!(path, ?role, "role not allowed, redirecting");
                        EdgeDecision::redirect(policy::access_denied_redirect())
                    }
                }
            }
        }
    }
}

fn append_cookie_removals(response: &mut Response) {
    for name in [keys::TOKEN, keys::USER] {
        if let Ok(value) = HeaderValue::from_str(&SessionCookie::removal_header(name)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
}

/// 307 to `location`, or to the landing page when it cannot be a header value
fn redirect(location: &str) -> Response {
    let value = HeaderValue::from_str(location).unwrap_or_else(|_| {
        tracing::warn!(location, "unusable redirect target, sending to landing page");
        HeaderValue::from_static(policy::LANDING_PATH)
    });
    (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, value)]).into_response()
}

/// Runs ahead of every page: serves it, or redirects per the shared route policy
pub async fn edge_guard(State(guard): State<EdgeGuard>, request: Request, next: Next) -> Response {
    let decision = {
        let uri = request.uri();
        let edge_request = EdgeRequest::from_parts(uri.path(), uri.query(), request.headers());
        guard.decide(&edge_request)
    };

    tracing::debug!(path = %request.uri().path(), ?decision, "edge decision");

    let clear = decision.clears_cookies();
    let mut response = match decision {
        EdgeDecision::Allow { .. } => next.run(request).await,
        EdgeDecision::Redirect { location, .. } => redirect(&location),
    };

    if clear {
        append_cookie_removals(&mut response);
    }

    response
}
