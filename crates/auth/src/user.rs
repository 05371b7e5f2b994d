//! Identity record returned by `/{tenant}/auth/me` and by login.

use serde::{Deserialize, Serialize};

use crate::Role;

/// Numeric user identifier assigned by the API.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authenticated user as seen by the client.
///
/// `email` and `phone` are nullable server-side (phone-only and email-only
/// sign-ups both exist).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub phone_verified: bool,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub role: Role,
}

impl User {
    pub fn new(id: i64, role: Role) -> Self {
        Self {
            id: UserId::new(id),
            email: None,
            phone: None,
            phone_verified: false,
            email_verified: false,
            role,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// A short label for logs; never includes credentials.
    pub fn display_name(&self) -> String {
        self.email
            .clone()
            .or_else(|| self.phone.clone())
            .unwrap_or_else(|| format!("user#{}", self.id))
    }
}
