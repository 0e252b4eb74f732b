//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use hio::http::{Flow, Handler, Responder, Router};
use hio::{ServeError, ServeOption};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A running `serve` call.
pub struct TestServer {
    pub addr: SocketAddr,
    pub ctx: CancellationToken,
    pub task: JoinHandle<Result<(), ServeError>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Cancel and wait for `serve` to return.
    pub async fn stop(self) -> Result<(), ServeError> {
        self.ctx.cancel();
        tokio::time::timeout(Duration::from_secs(10), self.task)
            .await
            .expect("serve did not return")
            .expect("serve task panicked")
    }
}

/// Spawn `serve` on 127.0.0.1:`port` and wait until it accepts connections.
pub async fn start<H>(port: u16, handler: H, extra: Vec<ServeOption>) -> TestServer
where
    H: Into<axum::Router> + Send + 'static,
{
    let addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
    let ctx = CancellationToken::new();

    let mut options = vec![ServeOption::host("127.0.0.1"), ServeOption::port(port)];
    options.extend(extra);

    let serve_ctx = ctx.clone();
    let task = tokio::spawn(async move { hio::serve(serve_ctx, handler, options).await });

    wait_until_listening(addr).await;
    TestServer { addr, ctx, task }
}

pub async fn wait_until_listening(addr: SocketAddr) {
    for _ in 0..100 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server at {addr} never started listening");
}

/// Client without pooling, proxies or redirect following.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Responder that answers every error with 500 and the error text.
pub fn plain_responder() -> Responder {
    Responder::new(|err| {
        let message = err.to_string();
        Handler::from_fn(move |w, _| {
            w.write_header(StatusCode::INTERNAL_SERVER_ERROR);
            let _ = w.write(message.as_bytes());
            Flow::Done
        })
    })
}

/// Handler that waits `delay` before answering 200.
pub fn slow(delay: Duration) -> Handler {
    Handler::new(move |w, _| {
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            let _ = w.write(b"finally");
            Flow::Done
        })
    })
}

/// Like `slow`, but notifies once the handler is running.
pub fn slow_with_start(delay: Duration) -> (Handler, Arc<Notify>) {
    let started = Arc::new(Notify::new());
    let notify = started.clone();
    let handler = Handler::new(move |w, _| {
        let notify = notify.clone();
        Box::pin(async move {
            notify.notify_one();
            tokio::time::sleep(delay).await;
            let _ = w.write(b"finally");
            Flow::Done
        })
    });
    (handler, started)
}

/// Wait until a `slow_with_start` handler has begun.
pub async fn wait_started(started: &Notify) {
    tokio::time::timeout(Duration::from_secs(10), started.notified())
        .await
        .expect("handler never started");
}

pub fn router() -> Router {
    Router::new(plain_responder())
}
