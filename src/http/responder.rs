//! Terminal responses.
//!
//! # Responsibilities
//! - Build the last step of a handler chain: text, JSON, redirect
//! - Route every error-producing response through one injected callback
//!
//! # Design Decisions
//! - JSON is serialized when the step is built, so a serialization failure
//!   becomes an error response before anything is written
//! - The error callback decides both logging and the client-visible reply

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::Request;
use axum::http::{header, HeaderValue, StatusCode};
use serde::Serialize;
use tracing::Span;

use crate::http::body::{BodyError, BoxError};
use crate::http::handler::{Flow, Handler};
use crate::http::response::redirect;
use crate::http::writer::ResponseWriter;

/// Error value handed to the error callback.
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// Builds terminal handlers.
#[derive(Clone)]
pub struct Responder {
    on_error: Arc<dyn Fn(SharedError) -> Handler + Send + Sync>,
}

impl Responder {
    /// Create a responder whose error responses are produced by `on_error`.
    pub fn new<F>(on_error: F) -> Self
    where
        F: Fn(SharedError) -> Handler + Send + Sync + 'static,
    {
        Self {
            on_error: Arc::new(on_error),
        }
    }

    /// Create a responder that hands every error to `log` inside `span`.
    ///
    /// `log` chooses the status and body; nothing else is written afterwards.
    pub fn error_logging<F>(span: Span, log: F) -> Self
    where
        F: Fn(&mut dyn ResponseWriter, &Request, &Span, &SharedError) + Send + Sync + 'static,
    {
        let log = Arc::new(log);
        Self::new(move |err| {
            let log = Arc::clone(&log);
            let span = span.clone();
            Handler::from_fn(move |w, r| {
                let _entered = span.enter();
                log(w, r, &span, &err);
                Flow::Done
            })
        })
    }

    /// Respond through the error callback.
    pub fn error(&self, err: impl Into<BoxError>) -> Handler {
        (self.on_error)(Arc::from(err.into()))
    }

    /// Plain text response.
    pub fn text(&self, code: StatusCode, message: impl Into<String>) -> Handler {
        let message = message.into();
        Handler::from_fn(move |w, _| {
            w.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
            w.write_header(code);
            if let Err(err) = w.write(message.as_bytes()) {
                tracing::debug!(error = %err, "Writing text response");
            }
            Flow::Done
        })
    }

    /// JSON response. Serialization failures go to the error callback instead.
    pub fn json<T>(&self, code: StatusCode, value: &T) -> Handler
    where
        T: Serialize + ?Sized,
    {
        let data = match serde_json::to_vec(value) {
            Ok(data) => Bytes::from(data),
            Err(err) => return self.error(BodyError::Encode(err)),
        };

        Handler::from_fn(move |w, _| {
            w.headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            w.write_header(code);
            if let Err(err) = w.write(&data) {
                tracing::debug!(error = %err, "Writing JSON response");
            }
            Flow::Done
        })
    }

    /// Redirect to `url` with `code`.
    pub fn redirect(&self, code: StatusCode, url: impl Into<String>) -> Handler {
        let url = url.into();
        Handler::from_fn(move |w, r| {
            redirect(w, r, &url, code);
            Flow::Done
        })
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder").finish_non_exhaustive()
    }
}
