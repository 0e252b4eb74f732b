//! Chainable handlers, plain endpoints and middleware.
//!
//! A `Handler` is one dispatch step. Running it yields a `Flow`: either the
//! next step to run against the same writer and request, or `Done`. This lets
//! a route read as a sequence of small steps (validate → load → respond)
//! instead of nested calls.
//!
//! Middleware does not know about chains: it wraps an `Endpoint`, which is
//! what a `Handler` becomes once its chain is driven to completion.

use std::fmt;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, Request};
use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::http::request::PathParams;
use crate::http::writer::{ResponseBuffer, ResponseWriter};

/// Outcome of running one handler step.
pub enum Flow {
    /// Continue with another step.
    Next(Handler),
    /// Dispatch is complete.
    Done,
}

impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flow::Next(_) => f.write_str("Flow::Next(..)"),
            Flow::Done => f.write_str("Flow::Done"),
        }
    }
}

type StepFn =
    dyn for<'a> Fn(&'a mut dyn ResponseWriter, &'a mut Request) -> BoxFuture<'a, Flow> + Send + Sync;

/// A chainable request handler.
#[derive(Clone)]
pub struct Handler(Arc<StepFn>);

impl Handler {
    /// Wrap an async step.
    ///
    /// ```ignore
    /// Handler::new(|w, r| Box::pin(async move { Flow::Done }))
    /// ```
    pub fn new<F>(step: F) -> Self
    where
        F: for<'a> Fn(&'a mut dyn ResponseWriter, &'a mut Request) -> BoxFuture<'a, Flow>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(step))
    }

    /// Wrap a synchronous step.
    pub fn from_fn<F>(step: F) -> Self
    where
        F: Fn(&mut dyn ResponseWriter, &mut Request) -> Flow + Send + Sync + 'static,
    {
        Self::new(move |w, r| {
            let flow = step(w, r);
            Box::pin(std::future::ready(flow))
        })
    }

    /// Run this step only.
    pub fn call<'a>(
        &self,
        w: &'a mut dyn ResponseWriter,
        r: &'a mut Request,
    ) -> BoxFuture<'a, Flow> {
        (self.0)(w, r)
    }

    /// Run the chain until a step returns `Flow::Done`.
    pub async fn run(&self, w: &mut dyn ResponseWriter, r: &mut Request) {
        let mut current = self.clone();
        loop {
            match current.call(w, r).await {
                Flow::Next(next) => current = next,
                Flow::Done => return,
            }
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

type EndpointFn =
    dyn for<'a> Fn(&'a mut dyn ResponseWriter, &'a mut Request) -> BoxFuture<'a, ()> + Send + Sync;

/// A plain request handler, the unit middleware wraps.
#[derive(Clone)]
pub struct Endpoint(Arc<EndpointFn>);

impl Endpoint {
    pub fn new<F>(serve: F) -> Self
    where
        F: for<'a> Fn(&'a mut dyn ResponseWriter, &'a mut Request) -> BoxFuture<'a, ()>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(serve))
    }

    pub fn call<'a>(&self, w: &'a mut dyn ResponseWriter, r: &'a mut Request) -> BoxFuture<'a, ()> {
        (self.0)(w, r)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Endpoint(..)")
    }
}

impl From<Handler> for Endpoint {
    fn from(handler: Handler) -> Self {
        Endpoint::new(move |w, r| {
            let handler = handler.clone();
            Box::pin(async move { handler.run(w, r).await })
        })
    }
}

/// Serve every request that reaches the returned axum router with `endpoint`.
impl From<Endpoint> for axum::Router {
    fn from(endpoint: Endpoint) -> Self {
        axum::Router::new().fallback(move |request: Request| {
            let endpoint = endpoint.clone();
            async move { respond(&endpoint, request).await }
        })
    }
}

/// Wraps an endpoint with extra behavior around it.
#[derive(Clone)]
pub struct Middleware(Arc<dyn Fn(Endpoint) -> Endpoint + Send + Sync>);

impl Middleware {
    pub fn new<F>(wrap: F) -> Self
    where
        F: Fn(Endpoint) -> Endpoint + Send + Sync + 'static,
    {
        Self(Arc::new(wrap))
    }

    pub fn wrap(&self, next: Endpoint) -> Endpoint {
        (self.0)(next)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Middleware(..)")
    }
}

/// Run `endpoint` against a fresh transport sink and turn the result into a response.
pub(crate) async fn respond(endpoint: &Endpoint, request: Request) -> Response {
    let (mut parts, body) = request.into_parts();
    // Fallback routes carry no captures; only matched routes do.
    if let Ok(Path(params)) = Path::<Vec<(String, String)>>::from_request_parts(&mut parts, &()).await {
        parts.extensions.insert(PathParams::from(params));
    }

    let mut request = Request::from_parts(parts, body);
    let mut buffer = ResponseBuffer::new();
    endpoint.call(&mut buffer, &mut request).await;
    buffer.into_response()
}
