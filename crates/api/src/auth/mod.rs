//! Authentication and session primitives.
//!
//! - [`jwt`] -- access/refresh token signing and verification.
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`session`] -- login, refresh rotation with client binding, and logout.

pub mod jwt;
pub mod password;
pub mod session;
