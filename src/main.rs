//! hio demo server
//!
//! A small JSON API served through the toolkit.
//!
//! ```text
//!     Client Request
//!     ─────────────▶ serve (listener, TLS, request ID, write timeout)
//!                      │
//!                      ▼
//!                  trailing_slash_redirector
//!                      │
//!                      ▼
//!                  Router ─▶ request_logger ─▶ Handler chain ─▶ Responder
//!                      │
//!                      ├── GET  /health
//!                      ├── POST /api/v1/notes        (decode → save → 201)
//!                      ├── GET  /api/v1/notes/{id}   (load → 200)
//!                      └── POST /api/v1/echo         (parse → process → present)
//! ```

use std::path::PathBuf;

use axum::http::{header, HeaderValue, StatusCode};
use clap::Parser;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use hio::config::{load_config, AppConfig, ServeOption};
use hio::http::{
    encode_json, max_bytes_reader, trailing_slash_redirector, BodyError, BoxError, Endpoint, Flow,
    Handler, RequestExt, Responder, Router, SharedError, Validate,
};
use hio::observability::{self, request_logger};
use hio::pipeline::{Executor, JsonParser, JsonPresenter, Processor};
use hio::store::{Identify, Repository, StoreError};

const MAX_BODY_BYTES: u64 = 64 * 1024;

#[derive(Parser)]
#[command(name = "hio")]
#[command(about = "Demo API served with graceful shutdown", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configuration file.
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Note {
    #[serde(default)]
    id: String,
    text: String,
}

impl Identify for Note {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

impl Validate for Note {
    fn validate(&self) -> Result<(), BoxError> {
        if self.text.trim().is_empty() {
            return Err("text must not be empty".into());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct EchoRequest {
    message: String,
}

impl Validate for EchoRequest {}

#[derive(Debug, Serialize)]
struct EchoResponse {
    message: String,
    length: usize,
}

struct Echo;

impl Processor<EchoRequest, EchoResponse> for Echo {
    fn process<'a>(
        &'a self,
        ctx: &'a CancellationToken,
        input: EchoRequest,
    ) -> BoxFuture<'a, Result<EchoResponse, BoxError>> {
        Box::pin(async move {
            if ctx.is_cancelled() {
                return Err("server is shutting down".into());
            }
            Ok(EchoResponse {
                length: input.message.chars().count(),
                message: input.message,
            })
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    observability::init(&config.logging)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "hio starting");

    let mut options = config.server.to_options();
    if let Some(port) = cli.port {
        options.push(ServeOption::port(port));
    }

    let ctx = CancellationToken::new();
    let app = build_app(ctx.clone());

    hio::serve(ctx, app, options).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_app(ctx: CancellationToken) -> Endpoint {
    let mut router = Router::with_error_logging(tracing::info_span!("api"), respond_with_error);
    router.use_middleware([request_logger()]);

    router.get("/health", |rs| rs.text(StatusCode::OK, "ok"));

    let api = router.group("/api/v1", []);
    let notes = Repository::<Note>::new();

    let repo = notes.clone();
    api.post("/notes", move |rs| create_note(rs.clone(), repo));
    api.get("/notes/{id}", move |rs| show_note(rs.clone(), notes));

    let executor = std::sync::Arc::new(Executor::new(JsonParser::new(), Echo, JsonPresenter));
    api.post("/echo", move |rs| echo(rs.clone(), executor, ctx));

    trailing_slash_redirector().wrap(router.into())
}

fn create_note(rs: Responder, notes: Repository<Note>) -> Handler {
    Handler::new(move |w, r| {
        let rs = rs.clone();
        let notes = notes.clone();
        Box::pin(async move {
            let body = std::mem::take(r.body_mut());
            let note = match max_bytes_reader(&*w, body, MAX_BODY_BYTES).json::<Note>().await {
                Ok(note) => note,
                Err(err) => return Flow::Next(rs.error(err)),
            };
            Flow::Next(save_note(rs, notes, note))
        })
    })
}

fn save_note(rs: Responder, notes: Repository<Note>, mut note: Note) -> Handler {
    if note.id.is_empty() {
        note.id = uuid::Uuid::new_v4().to_string();
    }
    match notes.save(note.clone()) {
        Ok(()) => rs.json(StatusCode::CREATED, &note),
        Err(err) => rs.error(err),
    }
}

fn show_note(rs: Responder, notes: Repository<Note>) -> Handler {
    Handler::from_fn(move |_, r| {
        let mut note = Note {
            id: r.path_value("id").unwrap_or_default().to_owned(),
            ..Note::default()
        };
        match notes.load(&mut note) {
            Ok(()) => Flow::Next(rs.json(StatusCode::OK, &note)),
            Err(err) => Flow::Next(rs.error(err)),
        }
    })
}

fn echo(
    rs: Responder,
    executor: std::sync::Arc<Executor<EchoRequest, EchoResponse>>,
    ctx: CancellationToken,
) -> Handler {
    Handler::new(move |w, r| {
        let rs = rs.clone();
        let executor = executor.clone();
        let ctx = ctx.clone();
        Box::pin(async move {
            let body = std::mem::take(r.body_mut());
            let bytes = match max_bytes_reader(&*w, body, MAX_BODY_BYTES).bytes().await {
                Ok(bytes) => bytes,
                Err(err) => return Flow::Next(rs.error(err)),
            };

            let mut output = Vec::new();
            if let Err(err) = executor.execute(&ctx, &mut &bytes[..], &mut output).await {
                return Flow::Next(rs.error(err));
            }

            w.headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            w.write_header(StatusCode::OK);
            if let Err(err) = w.write(&output) {
                tracing::debug!(error = %err, "Writing echo response");
            }
            Flow::Done
        })
    })
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

fn respond_with_error(
    w: &mut dyn hio::http::ResponseWriter,
    r: &axum::extract::Request,
    _span: &tracing::Span,
    err: &SharedError,
) {
    let status = status_for(err);
    if status.is_server_error() {
        tracing::error!(path = %r.uri().path(), method = %r.method(), error = %err, "Request failed");
    } else {
        tracing::warn!(path = %r.uri().path(), method = %r.method(), status = status.as_u16(), error = %err, "Request rejected");
    }

    let message = err.to_string();
    let body = ErrorBody {
        error: if status.is_server_error() {
            "internal server error"
        } else {
            &message
        },
    };
    if let Err(err) = encode_json(w, &body, status) {
        tracing::debug!(error = %err, "Writing error response");
    }
}

fn status_for(err: &SharedError) -> StatusCode {
    if let Some(err) = err.downcast_ref::<StoreError>() {
        return match err {
            StoreError::NotFound => StatusCode::NOT_FOUND,
            StoreError::AlreadyExists => StatusCode::CONFLICT,
        };
    }
    if let Some(err) = err.downcast_ref::<BodyError>() {
        return match err {
            BodyError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            BodyError::Decode(_) | BodyError::Validate(_) => StatusCode::BAD_REQUEST,
            BodyError::Read(_) | BodyError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
    }
    StatusCode::INTERNAL_SERVER_ERROR
}
