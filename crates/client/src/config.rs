//! Client configuration, resolved from the environment.

use std::path::PathBuf;

use loyalty_core::TenantSlug;

/// API base URL (scheme, host and path prefix).
pub const API_BASE_ENV: &str = "LOYALTY_API_BASE";
/// Tenant used when neither the URL nor the stored session names one.
pub const DEFAULT_TENANT_ENV: &str = "LOYALTY_DEFAULT_TENANT";
/// Directory for the persisted session (file storage backend).
pub const DATA_DIR_ENV: &str = "LOYALTY_DATA_DIR";

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api/v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base: String,
    pub default_tenant: TenantSlug,
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            default_tenant: TenantSlug::default_tenant(),
            data_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_base = var(API_BASE_ENV)
            .map(|base| normalize_base(&base))
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let default_tenant = match var(DEFAULT_TENANT_ENV) {
            Some(raw) => TenantSlug::parse(raw).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "ignoring {DEFAULT_TENANT_ENV}");
                TenantSlug::default_tenant()
            }),
            None => TenantSlug::default_tenant(),
        };

        Self {
            api_base,
            default_tenant,
            data_dir: var(DATA_DIR_ENV).map(PathBuf::from),
        }
    }

    pub fn with_api_base(mut self, api_base: impl AsRef<str>) -> Self {
        self.api_base = normalize_base(api_base.as_ref());
        self
    }

    pub fn with_default_tenant(mut self, tenant: TenantSlug) -> Self {
        self.default_tenant = tenant;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }
}

fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}
