//! User record and role.
//!
//! The same shape is used for the `/auth/*` response payload and for the
//! cached copy kept in client-side storage.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Account role as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Store administrator with access to the admin area.
    Admin,
    /// Regular customer. Unknown role strings also land here so that an
    /// unexpected value never grants admin access.
    #[default]
    #[serde(other)]
    Standard,
}

impl UserRole {
    /// Returns `true` for the admin role.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Standard => write!(f, "standard"),
        }
    }
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend-issued identifier.
    #[serde(rename = "userId")]
    pub id: UserId,
    /// Account role.
    #[serde(default)]
    pub role: UserRole,
    /// Email address, when the backend includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl User {
    /// Name to show in the header, falling back to the email and then the ID.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.to_owned(),
            (None, None) => self
                .email
                .clone()
                .unwrap_or_else(|| self.id.to_string()),
        }
    }

    /// Returns `true` if the user holds the admin role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
