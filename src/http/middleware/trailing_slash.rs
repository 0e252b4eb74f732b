//! Trailing-slash normalization.

use axum::http::{header, StatusCode};

use crate::http::handler::{Endpoint, Middleware};
use crate::http::response::write_redirect;

/// Permanently redirect `/path/` to `/path`, keeping the query string.
///
/// The root path is never redirected. Requests without a trailing slash pass
/// through to the wrapped endpoint.
pub fn trailing_slash_redirector() -> Middleware {
    Middleware::new(|next| {
        Endpoint::new(move |w, r| {
            let next = next.clone();
            Box::pin(async move {
                let Some(location) = canonical_location(r.uri().path(), r.uri().query()) else {
                    next.call(w, r).await;
                    return;
                };

                tracing::debug!(from = %r.uri(), to = %location, "Redirecting trailing slash");
                w.headers_mut().remove(header::CONTENT_TYPE);
                write_redirect(w, &location, StatusCode::PERMANENT_REDIRECT);
            })
        })
    })
}

fn canonical_location(path: &str, query: Option<&str>) -> Option<String> {
    if path == "/" || !path.ends_with('/') {
        return None;
    }

    let mut location = match path.trim_end_matches('/') {
        "" => "/".to_owned(),
        trimmed => trimmed.to_owned(),
    };
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        location.push('?');
        location.push_str(query);
    }
    Some(location)
}
