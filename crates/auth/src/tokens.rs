//! Bearer/refresh credentials and the payloads that carry them.

use serde::{Deserialize, Serialize};

use loyalty_core::TenantSlug;

use crate::User;

/// Access/refresh token pair. Both values are opaque to the client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

// Tokens must never reach log output.
impl core::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Everything a successful login establishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: User,
    pub tokens: TokenPair,
    pub tenant: TenantSlug,
}

/// Body of `POST /auth/refresh`.
#[derive(Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Response of `POST /auth/refresh`.
///
/// With rotation enabled the server returns a new refresh token too; without
/// it only `access` is present.
#[derive(Clone, Default, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

impl RefreshResponse {
    /// Build the next token pair, keeping `previous_refresh` when the server
    /// did not rotate it. Returns `None` when no usable access token came back.
    pub fn into_pair(self, previous_refresh: &str) -> Option<TokenPair> {
        let access = self.access.filter(|a| !a.is_empty())?;
        let refresh = self
            .refresh
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| previous_refresh.to_string());
        Some(TokenPair { access, refresh })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_secrets() {
        let pair = TokenPair::new("secret-access", "secret-refresh");
        let rendered = format!("{pair:?}");
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn refresh_response_keeps_previous_refresh_when_not_rotated() {
        let resp: RefreshResponse = serde_json::from_str(r#"{"access":"a2"}"#).unwrap();
        let pair = resp.into_pair("r1").unwrap();
        assert_eq!(pair.access, "a2");
        assert_eq!(pair.refresh, "r1");
    }

    #[test]
    fn refresh_response_without_access_is_unusable() {
        let resp: RefreshResponse = serde_json::from_str(r#"{"refresh":"r2"}"#).unwrap();
        assert!(resp.into_pair("r1").is_none());

        let resp: RefreshResponse = serde_json::from_str(r#"{"access":""}"#).unwrap();
        assert!(resp.into_pair("r1").is_none());
    }
}
