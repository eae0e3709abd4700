//! Storage layer for the marketplace backend.
//!
//! Repositories sit behind `async` traits so the in-memory implementations
//! used today can be replaced by a networked store without touching callers.

pub mod error;
pub mod models;
pub mod repositories;

pub use error::StoreError;
