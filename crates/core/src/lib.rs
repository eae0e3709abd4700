//! Shared primitives for the marketplace backend.
//!
//! - [`types`] -- id and timestamp aliases used across crates.
//! - [`error`] -- the domain-level [`error::CoreError`].

pub mod error;
pub mod types;
