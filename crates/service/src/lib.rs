//! HBnB domain model and its storage backends.
//! - `domain`: the six entity types and the tagged `Record` union.
//! - `storage`: the shared `Storage` contract, the JSON file backend and
//!   the relational backend.

pub mod errors;
pub mod domain;
pub mod runtime;
pub mod storage;
#[cfg(test)]
pub mod test_support;

pub use domain::{Kind, Record};
pub use errors::StorageError;
pub use storage::{Backend, Storage};
