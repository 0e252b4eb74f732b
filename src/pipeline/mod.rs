//! Parse → process → present.
//!
//! # Data Flow
//! ```text
//! reader → Parser<I> → I → Processor<I, O> (async, cancellable) → O → Presenter<O> → writer
//! ```
//!
//! # Design Decisions
//! - Stages are trait objects so an `Executor` can be built once and shared
//!   by every request of a route
//! - The first failing stage ends the run; later stages never see partial input

pub mod executor;
pub mod json;

use std::io::{Read, Write};

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::http::body::BoxError;

pub use executor::Executor;
pub use json::{JsonParser, JsonPresenter};

/// Turns raw input into a typed value.
pub trait Parser<I>: Send + Sync {
    fn parse(&self, reader: &mut (dyn Read + Send)) -> Result<I, BoxError>;
}

/// Turns a parsed value into a result.
pub trait Processor<I, O>: Send + Sync {
    fn process<'a>(&'a self, ctx: &'a CancellationToken, input: I) -> BoxFuture<'a, Result<O, BoxError>>;
}

/// Writes a result out.
pub trait Presenter<O>: Send + Sync {
    fn present(&self, writer: &mut (dyn Write + Send), output: O) -> Result<(), BoxError>;
}
