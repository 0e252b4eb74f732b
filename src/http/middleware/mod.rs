//! Middleware shipped with the router.
//!
//! Each constructor returns a [`Middleware`](crate::http::Middleware) that
//! can be passed to `Router::use_middleware`, `Router::group`, or applied to a
//! whole router converted into an `Endpoint`.

pub mod trailing_slash;

pub use trailing_slash::trailing_slash_redirector;
