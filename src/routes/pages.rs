//! Page shells served behind the edge guard.
//!
//! The pages themselves are rendered by the frontend; the gateway only
//! answers with a minimal document naming the page, plus the access-denied
//! notice when the edge redirected with `error=access_denied`.

use axum::{http::Uri, response::Html, Router};

use crate::services::policy::{self, RouteClass};

pub fn router() -> Router {
    Router::new().fallback(page_shell)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn access_denied(query: Option<&str>) -> bool {
    query.is_some_and(|q| {
        q.split('&')
            .any(|pair| pair == format!("error={}", policy::ACCESS_DENIED_ERROR))
    })
}

pub async fn page_shell(uri: Uri) -> Html<String> {
    let path = uri.path();
    let section = match policy::classify(path) {
        RouteClass::Public => "public",
        RouteClass::AuthOnly => "auth",
        RouteClass::Protected => "protected",
        RouteClass::Restricted(_) => "restricted",
        RouteClass::Unclassified => "page",
    };

    let notice = if access_denied(uri.query()) {
        r#"<p class="notice" role="alert">Access denied: you do not have permission to open that page.</p>"#
    } else {
        ""
    };

    Html(format!(
        r#"<!doctype html>
<html lang="pt-BR">
<head><meta charset="utf-8"><title>BioConnect</title></head>
<body data-section="{section}" data-path="{path}">
{notice}<div id="root"></div>
</body>
</html>
"#,
        section = section,
        path = escape(path),
        notice = notice,
    ))
}
