//! `loyalty-core`: shared primitives for the loyalty client.
//!
//! This crate has no IO; it only defines the tenant boundary type and the
//! domain error used when validating it.

pub mod error;
pub mod tenant;

pub use error::DomainError;
pub use tenant::{DEFAULT_TENANT, TenantSlug};
