//! Domain error model.

use thiserror::Error;

/// Domain-level error.
///
/// Keep this focused on deterministic validation failures. Transport and
/// storage errors live in the crates that own those concerns.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A tenant slug was invalid.
    #[error("invalid tenant slug: {0}")]
    InvalidTenant(String),
}

impl DomainError {
    pub fn invalid_tenant(msg: impl Into<String>) -> Self {
        Self::InvalidTenant(msg.into())
    }
}
