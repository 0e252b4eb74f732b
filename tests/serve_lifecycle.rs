//! Lifecycle tests: startup failures, cancellation, draining and timeouts.

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use hio::config::ConfigError;
use hio::{ServeError, ServeOption};
use tokio_util::sync::CancellationToken;

mod common;

#[tokio::test]
async fn test_cancelled_context_returns_ok() {
    let ctx = CancellationToken::new();
    ctx.cancel();

    let router = common::router();
    router.get("/", |rs| rs.text(StatusCode::OK, "unused"));

    let started = Instant::now();
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        hio::serve(
            ctx,
            router,
            [
                ServeOption::host("127.0.0.1"),
                ServeOption::port(28301),
                ServeOption::shutdown_timeout(Duration::from_secs(2)),
            ],
        ),
    )
    .await
    .expect("serve did not return");

    assert!(result.is_ok(), "unexpected error: {result:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_serves_until_cancelled() {
    let router = common::router();
    router.get("/health", |rs| rs.text(StatusCode::OK, "ok"));

    let server = common::start(28302, router, vec![]).await;
    let res = common::client().get(server.url("/health")).send().await.unwrap();

    assert_eq!(res.status(), 200);
    let request_id = res.headers().get("x-request-id").expect("missing request id");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
    assert_eq!(res.text().await.unwrap(), "ok");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_bind_conflict_is_returned() {
    let _taken = std::net::TcpListener::bind("127.0.0.1:28303").unwrap();

    let result = hio::serve(
        CancellationToken::new(),
        common::router(),
        [ServeOption::host("127.0.0.1"), ServeOption::port(28303)],
    )
    .await;

    assert!(matches!(result, Err(ServeError::Listen(_))), "got {result:?}");
}

#[tokio::test]
async fn test_bad_tls_material_is_config_error() {
    let result = hio::serve(
        CancellationToken::new(),
        common::router(),
        [
            ServeOption::host("127.0.0.1"),
            ServeOption::port(28304),
            ServeOption::tls("missing-ca.pem", "missing-cert.pem", "missing-key.pem"),
        ],
    )
    .await;

    assert!(matches!(result, Err(ServeError::Config(ConfigError::Tls(_)))), "got {result:?}");
}

#[tokio::test]
async fn test_in_flight_request_completes_during_drain() {
    let (slow, started) = common::slow_with_start(Duration::from_millis(400));
    let router = common::router();
    router.get("/slow", move |_| slow);

    let server = common::start(28305, router, vec![]).await;
    let url = server.url("/slow");
    let request = tokio::spawn(async move { common::client().get(url).send().await });

    common::wait_started(&started).await;
    let stopped = server.stop().await;

    let res = request.await.unwrap().expect("in-flight request was dropped");
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "finally");
    assert!(stopped.is_ok(), "unexpected error: {stopped:?}");
}

#[tokio::test]
async fn test_drain_exceeding_grace_period_fails() {
    let (stuck, started) = common::slow_with_start(Duration::from_secs(5));
    let router = common::router();
    router.get("/stuck", move |_| stuck);

    let server = common::start(
        28306,
        router,
        vec![ServeOption::shutdown_timeout(Duration::from_millis(200))],
    )
    .await;
    let url = server.url("/stuck");
    let _request = tokio::spawn(async move { common::client().get(url).send().await });

    common::wait_started(&started).await;
    let stopping = Instant::now();
    let stopped = server.stop().await;

    assert!(
        matches!(stopped, Err(ServeError::ShutdownTimeout(grace)) if grace == Duration::from_millis(200)),
        "got {stopped:?}"
    );
    assert!(stopping.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_write_timeout_answers_408() {
    let router = common::router();
    router.get("/slow", |_| common::slow(Duration::from_secs(2)));

    let server = common::start(
        28307,
        router,
        vec![ServeOption::write_timeout(Duration::from_millis(200))],
    )
    .await;

    let res = common::client().get(server.url("/slow")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT.as_u16());

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_options_from_config_file_section() {
    let section: hio::config::AppConfig = toml::from_str(
        r#"
        [server]
        host = "127.0.0.1"
        port = 28308
        shutdown_timeout_secs = 1
        "#,
    )
    .unwrap();

    let router = common::router();
    router.get("/", |rs| rs.text(StatusCode::OK, "configured"));

    let ctx = CancellationToken::new();
    let serve_ctx = ctx.clone();
    let options = section.server.to_options();
    let task = tokio::spawn(async move { hio::serve(serve_ctx, router, options).await });
    common::wait_until_listening("127.0.0.1:28308".parse().unwrap()).await;

    let res = common::client().get("http://127.0.0.1:28308/").send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "configured");

    ctx.cancel();
    task.await.unwrap().unwrap();
}
