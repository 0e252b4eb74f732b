//! End-to-end dispatch through a served router.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use hio::http::{
    max_bytes_reader, trailing_slash_redirector, Endpoint, Flow, Handler, Middleware, RequestExt,
};
use hio::request_logger;

mod common;

type Log = Arc<Mutex<Vec<String>>>;

fn recording(name: &'static str, log: Log) -> Middleware {
    Middleware::new(move |next| {
        let log = log.clone();
        Endpoint::new(move |w, r| {
            let log = log.clone();
            let next = next.clone();
            Box::pin(async move {
                log.lock().unwrap().push(format!("{name} in"));
                next.call(w, r).await;
                log.lock().unwrap().push(format!("{name} out"));
            })
        })
    })
}

#[tokio::test]
async fn test_trailing_slash_redirect_over_http() {
    let router = common::router();
    router.get("/users", |rs| rs.text(StatusCode::OK, "users"));
    let app = trailing_slash_redirector().wrap(router.into());

    let server = common::start(28311, app, vec![]).await;
    let client = common::client();

    let res = client.get(server.url("/users/?page=2")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::PERMANENT_REDIRECT.as_u16());
    assert_eq!(res.headers()["location"], "/users?page=2");

    let res = client.get(server.url("/users")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "users");

    let res = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_group_middleware_order_over_http() {
    let log: Log = Arc::default();
    let mut router = common::router();
    router.use_middleware([request_logger(), recording("outer", log.clone())]);

    let api = router.group("api", [recording("inner", log.clone())]);
    let handler_log = log.clone();
    api.get("/items/{id}", move |rs| {
        let rs = rs.clone();
        Handler::from_fn(move |_, r| {
            handler_log.lock().unwrap().push(format!("item {}", r.path_value("id").unwrap_or("?")));
            Flow::Next(rs.text(StatusCode::OK, "item"))
        })
    });

    let server = common::start(28312, router, vec![]).await;
    let res = common::client().get(server.url("/api/items/9")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    assert_eq!(
        *log.lock().unwrap(),
        ["outer in", "inner in", "item 9", "inner out", "outer out"]
    );
    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let router = common::router();
    router.post("/upload", |rs| {
        let rs = rs.clone();
        Handler::new(move |w, r| {
            let rs = rs.clone();
            Box::pin(async move {
                let body = std::mem::take(r.body_mut());
                match max_bytes_reader(&*w, body, 8).bytes().await {
                    Ok(bytes) => Flow::Next(rs.text(StatusCode::OK, format!("{} bytes", bytes.len()))),
                    Err(_) => {
                        w.write_header(StatusCode::PAYLOAD_TOO_LARGE);
                        Flow::Done
                    }
                }
            })
        })
    });

    let server = common::start(28313, router, vec![]).await;
    let client = common::client();

    let res = client.post(server.url("/upload")).body("small").send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "5 bytes");

    let res = client
        .post(server.url("/upload"))
        .body("this body is far too large")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE.as_u16());

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_requests_share_router() {
    let router = common::router();
    router.get("/wait", |_| common::slow(Duration::from_millis(100)));

    let server = common::start(28314, router, vec![]).await;
    let client = common::client();

    let requests: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            let url = server.url("/wait");
            tokio::spawn(async move { client.get(url).send().await.map(|res| res.status()) })
        })
        .collect();

    for request in requests {
        assert_eq!(request.await.unwrap().unwrap(), 200);
    }
    server.stop().await.unwrap();
}
