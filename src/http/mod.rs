//! Request dispatch.
//!
//! # Data Flow
//! ```text
//! hyper connection (lifecycle::serve)
//!     → axum table match (router.rs)
//!     → request.rs (path params, request ID)
//!     → scope middleware, outermost first (middleware/, observability::logging)
//!     → Handler chain (handler.rs) until Flow::Done
//!     → Responder terminal step (responder.rs)
//!     → ResponseBuffer (writer.rs) → axum Response
//! ```

pub mod body;
pub mod handler;
pub mod middleware;
pub mod request;
pub mod responder;
pub mod response;
pub mod router;
pub mod writer;

pub use body::{decode_json, encode_json, max_bytes_reader, BodyError, BoxError, MaxBytesError, MaxBytesReader, Validate};
pub use handler::{Endpoint, Flow, Handler, Middleware};
pub use middleware::trailing_slash_redirector;
pub use request::{PathParams, RequestExt, X_REQUEST_ID};
pub use responder::{Responder, SharedError};
pub use response::redirect;
pub use router::Router;
pub use writer::{BodyWriter, Disconnect, Interceptor, ResponseBuffer, ResponseWriter};
