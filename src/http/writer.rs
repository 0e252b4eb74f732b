//! Response sinks.
//!
//! # Responsibilities
//! - Define the `ResponseWriter` contract that handlers and middleware write through
//! - Provide the transport-level sink (`ResponseBuffer`) that becomes the axum response
//! - Provide the `Interceptor` wrapper used by observers such as the request logger
//!
//! # Design Decisions
//! - Responses are buffered and handed to hyper in one piece
//! - Wrappers expose the writer they wrap through `unwrap_writer`, so the transport
//!   sink stays reachable however many layers sit on top of it
//! - Only the transport sink owns a disconnect latch

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// A response sink.
pub trait ResponseWriter: Send {
    /// Headers that will be sent with the response.
    fn headers(&self) -> &HeaderMap;

    /// Mutable access to the response headers.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Set the status code. Only the first call has an effect.
    fn write_header(&mut self, status: StatusCode);

    /// Append to the body, implicitly writing `200 OK` if no status was set.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// The writer this one wraps, if any.
    fn unwrap_writer(&self) -> Option<&dyn ResponseWriter> {
        None
    }

    /// Handle used to ask the transport to close the connection after replying.
    fn disconnect_handle(&self) -> Option<Disconnect> {
        None
    }
}

/// Latch asking the transport to drop the client connection once the response is sent.
#[derive(Debug, Clone, Default)]
pub struct Disconnect(Arc<AtomicBool>);

impl Disconnect {
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// The transport-level sink created for every dispatched request.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    disconnect: Disconnect,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status written so far, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn disconnect_requested(&self) -> bool {
        self.disconnect.is_requested()
    }

    /// Convert into an axum response.
    ///
    /// A tripped disconnect latch adds `Connection: close`, which makes hyper
    /// close the connection after writing this response.
    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        if self.disconnect.is_requested() {
            response
                .headers_mut()
                .insert(header::CONNECTION, HeaderValue::from_static("close"));
        }
        response
    }
}

impl IntoResponse for ResponseBuffer {
    fn into_response(self) -> Response {
        ResponseBuffer::into_response(self)
    }
}

impl ResponseWriter for ResponseBuffer {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        match self.status {
            Some(current) => {
                tracing::debug!(
                    current = current.as_u16(),
                    ignored = status.as_u16(),
                    "Superfluous write_header call"
                );
            }
            None => self.status = Some(status),
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.status.get_or_insert(StatusCode::OK);
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn disconnect_handle(&self) -> Option<Disconnect> {
        Some(self.disconnect.clone())
    }
}

type WriteHeaderHook<'a> = Box<dyn FnMut(StatusCode) + Send + 'a>;

/// Wraps a writer and observes the status code written through it.
pub struct Interceptor<'a> {
    inner: &'a mut dyn ResponseWriter,
    on_write_header: Option<WriteHeaderHook<'a>>,
}

impl<'a> Interceptor<'a> {
    pub fn new(inner: &'a mut dyn ResponseWriter) -> Self {
        Self {
            inner,
            on_write_header: None,
        }
    }

    /// Call `hook` before forwarding every `write_header` to the wrapped writer.
    pub fn on_write_header(mut self, hook: impl FnMut(StatusCode) + Send + 'a) -> Self {
        self.on_write_header = Some(Box::new(hook));
        self
    }
}

impl ResponseWriter for Interceptor<'_> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        if let Some(hook) = self.on_write_header.as_mut() {
            hook(status);
        }
        self.inner.write_header(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn unwrap_writer(&self) -> Option<&dyn ResponseWriter> {
        Some(&*self.inner)
    }
}

/// `std::io::Write` adapter over a response body.
pub struct BodyWriter<'a> {
    inner: &'a mut dyn ResponseWriter,
}

impl<'a> BodyWriter<'a> {
    pub fn new(inner: &'a mut dyn ResponseWriter) -> Self {
        Self { inner }
    }
}

impl io::Write for BodyWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_status_wins() {
        let mut buffer = ResponseBuffer::new();
        buffer.write_header(StatusCode::CREATED);
        buffer.write_header(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(buffer.status(), Some(StatusCode::CREATED));
    }

    #[test]
    fn test_write_implies_ok() {
        let mut buffer = ResponseBuffer::new();
        buffer.write(b"hello").unwrap();
        assert_eq!(buffer.status(), Some(StatusCode::OK));
        assert_eq!(buffer.body(), b"hello");
    }

    #[test]
    fn test_disconnect_sets_connection_close() {
        let buffer = ResponseBuffer::new();
        buffer.disconnect_handle().unwrap().request();
        let response = buffer.into_response();
        assert_eq!(response.headers()[header::CONNECTION], "close");
    }

    #[test]
    fn test_interceptor_observes_and_forwards() {
        let mut buffer = ResponseBuffer::new();
        let mut seen = None;
        {
            let mut interceptor = Interceptor::new(&mut buffer).on_write_header(|code| seen = Some(code));
            interceptor.write_header(StatusCode::ACCEPTED);
            interceptor.write(b"queued").unwrap();
            assert!(interceptor.unwrap_writer().is_some());
        }
        assert_eq!(seen, Some(StatusCode::ACCEPTED));
        assert_eq!(buffer.status(), Some(StatusCode::ACCEPTED));
        assert_eq!(buffer.body(), b"queued");
    }
}
