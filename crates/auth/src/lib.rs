//! `loyalty-auth`: identity and credential types exchanged with the loyalty API.
//!
//! This crate is intentionally decoupled from HTTP and storage; the client
//! crate owns both.

pub mod roles;
pub mod tokens;
pub mod user;

pub use roles::Role;
pub use tokens::{AuthPayload, RefreshRequest, RefreshResponse, TokenPair};
pub use user::{User, UserId};
