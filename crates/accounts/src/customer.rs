use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use bankconsole_core::{CustomerId, DomainError, Entity};

/// Console role of a customer login.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(DomainError::validation(format!(
                "role must be one of: Admin, User (got {other:?})"
            ))),
        }
    }
}

/// A missing or `null` role on the wire means [`Role::User`].
fn role_or_default<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Role>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Customer record as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    pub name: String,
    pub email: String,
    pub username: String,
    /// Only ever sent by the console (on create or password change).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "role_or_default")]
    pub role: Role,
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> Option<CustomerId> {
        self.customer_id
    }
}

/// Write-side customer payload (create body or partial-update changes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDraft {
    pub name: String,
    pub email: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl CustomerDraft {
    /// Full-object form of this draft, carrying `id` as `customerId`.
    pub fn into_customer(self, id: Option<CustomerId>) -> Customer {
        Customer {
            customer_id: id,
            name: self.name,
            email: self.email,
            username: self.username,
            password: self.password,
            role: self.role,
        }
    }
}
