//! Request-side helpers.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every request
//! - Expose path parameters captured by the dispatch table
//!
//! # Design Decisions
//! - Request ID added as early as possible so every log line can carry it
//! - Captures are copied into request extensions before handlers run, so
//!   handlers never depend on axum extractor plumbing

use axum::http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Produces a fresh UUID v4 request ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Path captures of the matched route, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl From<Vec<(String, String)>> for PathParams {
    fn from(params: Vec<(String, String)>) -> Self {
        Self(params)
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for PathParams {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.to_owned(), value.to_owned()))
                .collect(),
        )
    }
}

/// Convenience accessors on incoming requests.
pub trait RequestExt {
    /// Value captured for `{name}` in the matched route pattern.
    fn path_value(&self, name: &str) -> Option<&str>;

    /// The request ID assigned at the edge of the server, if any.
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestExt for Request<B> {
    fn path_value(&self, name: &str) -> Option<&str> {
        self.extensions().get::<PathParams>()?.get(name)
    }

    fn request_id(&self) -> Option<&str> {
        self.headers().get(X_REQUEST_ID)?.to_str().ok()
    }
}
