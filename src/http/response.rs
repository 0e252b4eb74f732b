//! Redirect responses.
//!
//! # Design Decisions
//! - Relative targets resolve against the directory of the request path
//! - A small HTML body is written for GET only, and only when no
//!   `Content-Type` has been chosen by an earlier layer

use axum::extract::Request;
use axum::http::{header, HeaderValue, Method, StatusCode};

use crate::http::writer::ResponseWriter;

/// Reply to `request` with a redirect to `url`.
pub fn redirect(w: &mut dyn ResponseWriter, request: &Request, url: &str, code: StatusCode) {
    let location = resolve_location(request.uri().path(), url);
    let method = request.method();
    let with_body = !w.headers().contains_key(header::CONTENT_TYPE)
        && (method == Method::GET || method == Method::HEAD);

    if with_body {
        w.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
    }
    write_redirect(w, &location, code);

    if with_body && method == Method::GET {
        let body = format!(
            "<a href=\"{}\">{}</a>.\n",
            escape_html(&location),
            code.canonical_reason().unwrap_or_default()
        );
        if let Err(err) = w.write(body.as_bytes()) {
            tracing::debug!(error = %err, "Writing redirect body");
        }
    }
}

/// Set `Location` and write the status, nothing else.
pub(crate) fn write_redirect(w: &mut dyn ResponseWriter, location: &str, code: StatusCode) {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            w.headers_mut().insert(header::LOCATION, value);
        }
        Err(_) => tracing::warn!(location = %location, "Redirect target is not a valid header value"),
    }
    w.write_header(code);
}

fn resolve_location(current_path: &str, url: &str) -> String {
    if url.starts_with('/') || url.contains("://") {
        return url.to_owned();
    }
    let dir = match current_path.rfind('/') {
        Some(end) => &current_path[..=end],
        None => "/",
    };
    format!("{dir}{url}")
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
