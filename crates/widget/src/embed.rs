//! Embed attributes and the configuration derived from them.

use core::str::FromStr;

use thiserror::Error;

use loyalty_core::{DomainError, TenantSlug};

pub const ATTR_TENANT: &str = "data-tenant";
pub const ATTR_HOST: &str = "data-host";
pub const ATTR_MODE: &str = "data-mode";

pub const DEFAULT_HOST: &str = "http://localhost:5173";

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error(transparent)]
    InvalidTenant(#[from] DomainError),

    #[error("invalid widget host {0:?}: expected an http(s) origin")]
    InvalidHost(String),

    #[error("failed to render widget markup: {0}")]
    Render(#[from] askama::Error),
}

/// How the widget appears on the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetMode {
    /// Inline iframe where the script tag sits.
    #[default]
    Iframe,
    /// Button that opens the iframe in an overlay.
    Modal,
}

impl WidgetMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetMode::Iframe => "iframe",
            WidgetMode::Modal => "modal",
        }
    }
}

impl FromStr for WidgetMode {
    type Err = core::convert::Infallible;

    /// Only `"modal"` selects the modal; anything else is an inline iframe.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.trim().eq_ignore_ascii_case("modal") {
            WidgetMode::Modal
        } else {
            WidgetMode::Iframe
        })
    }
}

impl core::fmt::Display for WidgetMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedConfig {
    pub tenant: TenantSlug,
    pub host: String,
    pub mode: WidgetMode,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            tenant: TenantSlug::default_tenant(),
            host: DEFAULT_HOST.to_string(),
            mode: WidgetMode::Iframe,
        }
    }
}

impl EmbedConfig {
    pub fn new(tenant: TenantSlug, host: &str, mode: WidgetMode) -> Result<Self, WidgetError> {
        Ok(Self {
            tenant,
            host: normalize_host(host)?,
            mode,
        })
    }

    /// Build from the script tag's attributes. Missing or empty attributes
    /// take their defaults; unrelated attributes are ignored.
    pub fn from_attributes<'a, I>(attrs: I) -> Result<Self, WidgetError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut config = Self::default();
        for (name, value) in attrs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match name {
                ATTR_TENANT => config.tenant = TenantSlug::parse(value)?,
                ATTR_HOST => config.host = normalize_host(value)?,
                ATTR_MODE => config.mode = value.parse().unwrap_or_default(),
                _ => {}
            }
        }
        Ok(config)
    }

    /// Page the iframe loads: `{host}/t/{tenant}/widget`.
    pub fn widget_url(&self) -> String {
        format!("{}/t/{}/widget", self.host, self.tenant)
    }

    /// Where the loader script is served from.
    pub fn loader_url(&self) -> String {
        format!("{}/widget/loader.js", self.host)
    }
}

fn normalize_host(raw: &str) -> Result<String, WidgetError> {
    let host = raw.trim().trim_end_matches('/');
    let rest = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"));
    match rest {
        Some(authority) if !authority.is_empty() && !authority.contains(char::is_whitespace) => {
            Ok(host.to_string())
        }
        _ => Err(WidgetError::InvalidHost(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_attributes_are_missing() {
        let cfg = EmbedConfig::from_attributes(Vec::<(&str, &str)>::new()).unwrap();
        assert_eq!(cfg, EmbedConfig::default());
        assert_eq!(cfg.widget_url(), "http://localhost:5173/t/demo/widget");
    }

    #[test]
    fn reads_data_attributes() {
        let cfg = EmbedConfig::from_attributes([
            ("src", "https://loyalty.example.com/widget/loader.js"),
            (ATTR_TENANT, "bakery"),
            (ATTR_HOST, "https://loyalty.example.com/"),
            (ATTR_MODE, "modal"),
        ])
        .unwrap();

        assert_eq!(cfg.tenant.as_str(), "bakery");
        assert_eq!(cfg.mode, WidgetMode::Modal);
        assert_eq!(cfg.widget_url(), "https://loyalty.example.com/t/bakery/widget");
    }

    #[test]
    fn unknown_mode_means_iframe() {
        let cfg = EmbedConfig::from_attributes([(ATTR_MODE, "popup")]).unwrap();
        assert_eq!(cfg.mode, WidgetMode::Iframe);
    }

    #[test]
    fn rejects_bad_tenant_and_host() {
        assert!(matches!(
            EmbedConfig::from_attributes([(ATTR_TENANT, "a/b")]),
            Err(WidgetError::InvalidTenant(_))
        ));
        assert!(matches!(
            EmbedConfig::from_attributes([(ATTR_HOST, "javascript:alert(1)")]),
            Err(WidgetError::InvalidHost(_))
        ));
        assert!(matches!(
            EmbedConfig::from_attributes([(ATTR_HOST, "https://")]),
            Err(WidgetError::InvalidHost(_))
        ));
    }
}
