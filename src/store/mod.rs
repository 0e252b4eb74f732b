//! Keyed storage.
//!
//! # Design Decisions
//! - A value carries its own key (`Identify`), so callers load by filling in
//!   the key of an otherwise empty value
//! - Saving never overwrites; an existing key is an error

pub mod memory;

use std::hash::Hash;

use thiserror::Error;

pub use memory::Repository;

/// A value that knows its own key.
pub trait Identify {
    type Id: Eq + Hash + Clone + Send + Sync + 'static;

    fn id(&self) -> Self::Id;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("loading: not found")]
    NotFound,

    #[error("saving: already exists")]
    AlreadyExists,
}
