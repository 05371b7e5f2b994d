//! Tenant slug: the multi-tenant boundary carried in every route and most
//! API paths (`/t/:tenant/...`, `/{tenant}/auth/me`).

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Slug used when neither the URL nor the stored session names a tenant.
pub const DEFAULT_TENANT: &str = "demo";

const MAX_LEN: usize = 64;

/// Identifier of a tenant, validated to be safe inside a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantSlug(String);

impl TenantSlug {
    /// Parse and validate a slug.
    ///
    /// Accepts 1..=64 characters drawn from ASCII alphanumerics, `-` and `_`.
    pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(DomainError::invalid_tenant("empty"));
        }
        if raw.len() > MAX_LEN {
            return Err(DomainError::invalid_tenant(format!(
                "longer than {MAX_LEN} characters"
            )));
        }
        if let Some(c) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(DomainError::invalid_tenant(format!(
                "unexpected character {c:?} in {raw:?}"
            )));
        }
        Ok(Self(raw))
    }

    /// The built-in fallback tenant.
    pub fn default_tenant() -> Self {
        Self(DEFAULT_TENANT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TenantSlug {
    fn default() -> Self {
        Self::default_tenant()
    }
}

impl core::fmt::Display for TenantSlug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TenantSlug {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TenantSlug {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TenantSlug> for String {
    fn from(value: TenantSlug) -> Self {
        value.0
    }
}

impl AsRef<str> for TenantSlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
