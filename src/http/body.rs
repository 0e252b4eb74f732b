//! Request and response bodies.
//!
//! # Responsibilities
//! - Enforce request body size limits
//! - Decode JSON bodies and run the target type's own validation
//! - Encode JSON responses
//!
//! # Design Decisions
//! - The size limit is applied against the transport sink, reached by
//!   unwrapping every writer layer, so an oversized upload also closes the
//!   client connection
//! - Decode and validation failures are separate error variants

use std::error::Error as StdError;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use http_body::{Body as HttpBody, Frame, SizeHint};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::http::writer::{BodyWriter, Disconnect, ResponseWriter};

/// Boxed error used wherever callers supply their own error types.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Body exceeded the configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("http: request body too large (limit {limit} bytes)")]
pub struct MaxBytesError {
    pub limit: u64,
}

/// Errors raised while reading, decoding or encoding bodies.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("reading body: {0}")]
    Read(#[source] axum::Error),

    #[error(transparent)]
    TooLarge(#[from] MaxBytesError),

    #[error("unmarshaling json: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("validating: {0}")]
    Validate(#[source] BoxError),

    #[error("encoding JSON: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Self-validation run right after a successful decode.
///
/// The default implementation accepts every value, so types without rules
/// only need an empty `impl Validate for T {}`.
pub trait Validate {
    fn validate(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl Validate for serde_json::Value {}

/// Decode `bytes` as JSON, then validate the result.
pub fn decode_json<T>(bytes: &[u8]) -> Result<T, BodyError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_slice(bytes).map_err(BodyError::Decode)?;
    value.validate().map_err(BodyError::Validate)?;
    Ok(value)
}

/// Write `value` as a JSON response with `status`.
pub fn encode_json<T>(w: &mut dyn ResponseWriter, value: &T, status: StatusCode) -> Result<(), BodyError>
where
    T: Serialize + ?Sized,
{
    w.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    w.write_header(status);
    serde_json::to_writer(BodyWriter::new(w), value).map_err(BodyError::Encode)
}

/// Limit `body` to `limit` bytes.
///
/// `w` may be wrapped any number of times; the limit reports overruns to the
/// innermost writer so the transport can drop the client.
pub fn max_bytes_reader(w: &dyn ResponseWriter, body: Body, limit: u64) -> MaxBytesReader {
    let mut current = w;
    while let Some(inner) = current.unwrap_writer() {
        current = inner;
    }

    MaxBytesReader {
        inner: body,
        remaining: limit,
        limit,
        disconnect: current.disconnect_handle(),
        exceeded: false,
    }
}

/// A request body that fails once more than its limit has been read.
#[derive(Debug)]
pub struct MaxBytesReader {
    inner: Body,
    remaining: u64,
    limit: u64,
    disconnect: Option<Disconnect>,
    exceeded: bool,
}

impl MaxBytesReader {
    /// Read the whole body.
    pub async fn bytes(self) -> Result<Bytes, BodyError> {
        Ok(self.collect().await?.to_bytes())
    }

    /// Read the whole body and decode it as JSON.
    pub async fn json<T>(self) -> Result<T, BodyError>
    where
        T: DeserializeOwned + Validate,
    {
        let bytes = self.bytes().await?;
        decode_json(&bytes)
    }

    fn overrun(&mut self) -> BodyError {
        if !self.exceeded {
            self.exceeded = true;
            self.remaining = 0;
            if let Some(disconnect) = &self.disconnect {
                disconnect.request();
            }
            tracing::debug!(limit = self.limit, "Request body exceeded limit");
        }
        BodyError::TooLarge(MaxBytesError { limit: self.limit })
    }
}

impl HttpBody for MaxBytesReader {
    type Data = Bytes;
    type Error = BodyError;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        if this.exceeded {
            return Poll::Ready(Some(Err(this.overrun())));
        }

        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    let len = data.len() as u64;
                    if len > this.remaining {
                        return Poll::Ready(Some(Err(this.overrun())));
                    }
                    this.remaining -= len;
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(err))) => Poll::Ready(Some(Err(BodyError::Read(err)))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        !self.exceeded && self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        let mut hint = self.inner.size_hint();
        if hint.lower() > self.remaining {
            return hint;
        }
        match hint.upper() {
            Some(upper) if upper <= self.remaining => hint,
            _ => {
                hint.set_upper(self.remaining.saturating_add(1).max(hint.lower()));
                hint
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::writer::{Interceptor, ResponseBuffer};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Signup {
        email: String,
    }

    impl Validate for Signup {
        fn validate(&self) -> Result<(), BoxError> {
            if self.email.contains('@') {
                Ok(())
            } else {
                Err("email must contain @".into())
            }
        }
    }

    #[test]
    fn test_decode_and_validation_errors_are_distinct() {
        let decoded: Signup = decode_json(br#"{"email":"a@b.c"}"#).unwrap();
        assert_eq!(decoded.email, "a@b.c");

        let err = decode_json::<Signup>(b"{not json").unwrap_err();
        assert!(matches!(err, BodyError::Decode(_)));
        assert!(err.to_string().starts_with("unmarshaling json"));

        let err = decode_json::<Signup>(br#"{"email":"nope"}"#).unwrap_err();
        assert!(matches!(err, BodyError::Validate(_)));
        assert_eq!(err.to_string(), "validating: email must contain @");
    }

    #[test]
    fn test_encode_json_sets_headers() {
        let mut buffer = ResponseBuffer::new();
        encode_json(&mut buffer, &serde_json::json!({"ok": true}), StatusCode::CREATED).unwrap();
        assert_eq!(buffer.status(), Some(StatusCode::CREATED));
        assert_eq!(buffer.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(buffer.body(), br#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_within_limit_reads_everything() {
        let buffer = ResponseBuffer::new();
        let reader = max_bytes_reader(&buffer, Body::from("tiny"), 16);
        assert_eq!(&reader.bytes().await.unwrap()[..], b"tiny");
        assert!(!buffer.disconnect_requested());
    }

    #[tokio::test]
    async fn test_limit_applies_to_innermost_writer() {
        let mut transport = ResponseBuffer::new();
        let (mut outer, mut middle, mut inner) = (None, None, None);
        {
            let mut l1 = Interceptor::new(&mut transport).on_write_header(|c| inner = Some(c));
            let mut l2 = Interceptor::new(&mut l1).on_write_header(|c| middle = Some(c));
            let mut l3 = Interceptor::new(&mut l2).on_write_header(|c| outer = Some(c));

            let reader = max_bytes_reader(&l3, Body::from("0123456789"), 4);
            let err = reader.bytes().await.unwrap_err();
            assert!(matches!(err, BodyError::TooLarge(MaxBytesError { limit: 4 })));

            l3.write_header(StatusCode::PAYLOAD_TOO_LARGE);
            l3.write(b"body too large").unwrap();
        }

        for seen in [outer, middle, inner] {
            assert_eq!(seen, Some(StatusCode::PAYLOAD_TOO_LARGE));
        }
        assert!(transport.disconnect_requested());
        assert_eq!(transport.body(), b"body too large");

        let response = transport.into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()[header::CONNECTION], "close");
    }
}
