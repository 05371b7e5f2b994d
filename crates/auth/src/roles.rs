use serde::{Deserialize, Serialize};

/// Role of an authenticated user within a tenant.
///
/// Serialized as the upper-case strings the API emits (`"CLIENT"`,
/// `"CASHIER"`, `"ADMIN"`). Any other string deserializes as [`Role::Client`],
/// the least-privileged role, so a stored blob written by a newer server still
/// loads.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    #[default]
    Client,
    Cashier,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::Cashier => "CASHIER",
            Role::Admin => "ADMIN",
        }
    }

    /// Parse a role name, case-insensitively. Unknown names map to `Client`.
    pub fn parse_lenient(name: &str) -> Self {
        if name.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else if name.eq_ignore_ascii_case("cashier") {
            Role::Cashier
        } else {
            Role::Client
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self::parse_lenient(&value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
