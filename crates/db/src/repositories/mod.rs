//! Repository traits and their in-memory implementations.

pub mod session_repo;
pub mod user_repo;

pub use session_repo::{InMemorySessionStore, SessionStore};
pub use user_repo::{JsonUserDirectory, UserDirectory};
