//! Method + pattern router with scoped groups and ordered middleware.
//!
//! # Responsibilities
//! - Register `METHOD prefix/pattern` routes into one shared dispatch table
//! - Wrap every registered chain in the middleware of its scope
//! - Hand out sub-routers (`group`) that share the table but own their middleware
//!
//! # Design Decisions
//! - Matching is axum's (matchit): captures use `{name}` and the most
//!   specific pattern wins
//! - Middleware lists are plain `Vec`s copied at `group` time, so appending
//!   to a child never reaches the parent
//! - The first middleware added is the outermost: it sees the request first
//!   and the response last
//! - Conversions into `axum::Router` and `Endpoint` snapshot the table, so all
//!   routes must be registered before the router is served
//!
//! # Data Flow
//! ```text
//! Router::get("/users/{id}", factory)
//!     → factory(responder) → Handler chain
//!     → Endpoint, wrapped by scope middleware (reverse order)
//!     → axum route "GET /prefix/users/{id}" in the shared table
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::Request;
use axum::http::Method;
use axum::response::Response;
use axum::routing::MethodFilter;
use tower::ServiceExt;
use tracing::Span;

use crate::http::handler::{respond, Endpoint, Handler, Middleware};
use crate::http::responder::{Responder, SharedError};
use crate::http::writer::ResponseWriter;

/// Pattern router. Clones share the dispatch table.
#[derive(Clone)]
pub struct Router {
    table: Arc<Mutex<axum::Router>>,
    responder: Responder,
    prefix: String,
    middlewares: Vec<Middleware>,
}

impl Router {
    pub fn new(responder: Responder) -> Self {
        Self {
            table: Arc::new(Mutex::new(axum::Router::new())),
            responder,
            prefix: String::new(),
            middlewares: Vec::new(),
        }
    }

    /// Router whose responder reports errors through `log` inside `span`.
    pub fn with_error_logging<F>(span: Span, log: F) -> Self
    where
        F: Fn(&mut dyn ResponseWriter, &Request, &Span, &SharedError) + Send + Sync + 'static,
    {
        Self::new(Responder::error_logging(span, log))
    }

    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    /// Path prefix of this scope, empty at the root.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register `factory`'s chain for `method` requests to `pattern`.
    ///
    /// # Panics
    ///
    /// Panics on an invalid pattern, an unsupported method, or a method that
    /// is already registered for the same path.
    pub fn handle<F>(&self, method: Method, pattern: &str, factory: F)
    where
        F: FnOnce(&Responder) -> Handler,
    {
        let path = route_path(&self.prefix, pattern);
        let filter = MethodFilter::try_from(method.clone())
            .unwrap_or_else(|err| panic!("cannot route {method} {path}: {err}"));
        let endpoint = self.wrap(factory(&self.responder).into());

        let route = axum::routing::on(filter, move |request: Request| {
            let endpoint = endpoint.clone();
            async move { respond(&endpoint, request).await }
        });

        tracing::debug!(method = %method, path = %path, "Registering route");
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // A rejected route must leave the table unchanged.
        let current = table.clone();
        *table = current.route(&path, route);
    }

    pub fn get<F>(&self, pattern: &str, factory: F)
    where
        F: FnOnce(&Responder) -> Handler,
    {
        self.handle(Method::GET, pattern, factory);
    }

    pub fn post<F>(&self, pattern: &str, factory: F)
    where
        F: FnOnce(&Responder) -> Handler,
    {
        self.handle(Method::POST, pattern, factory);
    }

    pub fn put<F>(&self, pattern: &str, factory: F)
    where
        F: FnOnce(&Responder) -> Handler,
    {
        self.handle(Method::PUT, pattern, factory);
    }

    pub fn delete<F>(&self, pattern: &str, factory: F)
    where
        F: FnOnce(&Responder) -> Handler,
    {
        self.handle(Method::DELETE, pattern, factory);
    }

    pub fn patch<F>(&self, pattern: &str, factory: F)
    where
        F: FnOnce(&Responder) -> Handler,
    {
        self.handle(Method::PATCH, pattern, factory);
    }

    /// Sub-router under `prefix` running this scope's middleware plus `middlewares`.
    pub fn group(&self, prefix: &str, middlewares: impl IntoIterator<Item = Middleware>) -> Router {
        let mut scoped = self.middlewares.clone();
        scoped.extend(middlewares);
        Router {
            table: Arc::clone(&self.table),
            responder: self.responder.clone(),
            prefix: scope(&self.prefix, prefix),
            middlewares: scoped,
        }
    }

    /// Append middleware for routes registered on this router from now on.
    pub fn use_middleware(&mut self, middlewares: impl IntoIterator<Item = Middleware>) -> &mut Self {
        self.middlewares.extend(middlewares);
        self
    }

    /// Dispatch one request through the table.
    pub async fn serve_http(&self, request: Request) -> Response {
        dispatch(self.snapshot(), request).await
    }

    fn wrap(&self, endpoint: Endpoint) -> Endpoint {
        self.middlewares
            .iter()
            .rev()
            .fold(endpoint, |next, middleware| middleware.wrap(next))
    }

    fn snapshot(&self) -> axum::Router {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("prefix", &self.prefix)
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

impl From<Router> for axum::Router {
    fn from(router: Router) -> Self {
        router.snapshot()
    }
}

/// Lets whole-router middleware wrap the dispatch table.
impl From<Router> for Endpoint {
    fn from(router: Router) -> Self {
        let table = router.snapshot();
        Endpoint::new(move |w, r| {
            let table = table.clone();
            Box::pin(async move {
                let response = dispatch(table, detach(r)).await;
                let (parts, body) = response.into_parts();

                for (name, value) in &parts.headers {
                    w.headers_mut().append(name, value.clone());
                }
                w.write_header(parts.status);

                match axum::body::to_bytes(body, usize::MAX).await {
                    Ok(bytes) if bytes.is_empty() => {}
                    Ok(bytes) => {
                        if let Err(err) = w.write(&bytes) {
                            tracing::debug!(error = %err, "Copying routed response");
                        }
                    }
                    Err(err) => tracing::warn!(error = %err, "Reading routed response body"),
                }
            })
        })
    }
}

/// Move the body out of `r` into an otherwise identical request, leaving the
/// head of `r` readable for outer middleware.
fn detach(r: &mut Request) -> Request {
    let mut request = Request::new(std::mem::take(r.body_mut()));
    *request.method_mut() = r.method().clone();
    *request.uri_mut() = r.uri().clone();
    *request.version_mut() = r.version();
    *request.headers_mut() = r.headers().clone();
    *request.extensions_mut() = r.extensions().clone();
    request
}

async fn dispatch(table: axum::Router, request: Request) -> Response {
    match table.oneshot(request).await {
        Ok(response) => response,
        Err(infallible) => match infallible {},
    }
}

fn scope(parent: &str, prefix: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        return parent.to_owned();
    }
    format!("{}/{}", parent.trim_end_matches('/'), prefix)
}

fn route_path(prefix: &str, pattern: &str) -> String {
    let joined = format!("{}/{}", prefix.trim_end_matches('/'), pattern.trim_matches('/'));
    match joined.trim_end_matches('/') {
        "" => "/".to_owned(),
        path => path.to_owned(),
    }
}
