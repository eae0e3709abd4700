//! Request authentication extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a Bearer access token.

pub mod auth;
