//! Users, roles and the per-operation session context.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a user profile
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create a new user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Role of a user within a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Configures the desk and assigns work
    Admin,

    /// Read-only oversight of every complaint
    Supervisor,

    /// Resolves assigned complaints
    Technician,

    /// Files complaints
    Student,
}

impl Role {
    /// Lowercase wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Supervisor => "supervisor",
            Role::Technician => "technician",
            Role::Student => "student",
        }
    }

    /// Admins and supervisors see every complaint in the tenant.
    pub fn sees_all_complaints(self) -> bool {
        matches!(self, Role::Admin | Role::Supervisor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "supervisor" => Ok(Role::Supervisor),
            "technician" => Ok(Role::Technician),
            "student" => Ok(Role::Student),
            other => Err(format!(
                "Invalid role '{other}'. Valid values: admin, supervisor, technician, student"
            )),
        }
    }
}

/// A user profile as stored by the desk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique identifier
    pub id: UserId,

    /// Full name (optional)
    #[serde(default)]
    pub full_name: Option<String>,

    /// Contact email
    pub email: String,

    /// Role within the tenant
    pub role: Role,

    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Full name when present, email otherwise.
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

/// Data for registering a user
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Requested ID; generated from the email when `None`
    pub id: Option<UserId>,

    /// Full name (optional)
    pub full_name: Option<String>,

    /// Contact email
    pub email: String,

    /// Role within the tenant
    pub role: Role,
}

impl NewUser {
    /// Validate email shape and the optional explicit ID.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let email = self.email.trim();
        let Some((local, domain)) = email.split_once('@') else {
            return Err(format!("Invalid email address: '{email}'"));
        };
        if local.is_empty() || domain.is_empty() || email.contains(char::is_whitespace) {
            return Err(format!("Invalid email address: '{email}'"));
        }
        if let Some(id) = &self.id {
            if id.as_str().is_empty()
                || !id
                    .as_str()
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(format!(
                    "Invalid user ID '{id}': use letters, digits, '-' or '_'"
                ));
            }
        }
        Ok(())
    }
}

/// The acting user for a single operation.
///
/// Every desk operation receives the session explicitly; there is no ambient
/// "current user".
#[derive(Debug, Clone)]
pub struct Session {
    user: UserProfile,
}

impl Session {
    /// Create a session acting as `user`.
    pub fn new(user: UserProfile) -> Self {
        Self { user }
    }

    /// The acting user's profile
    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    /// The acting user's ID
    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    /// The acting user's role
    pub fn role(&self) -> Role {
        self.user.role
    }

    /// Fail with `PermissionDenied` unless the session has one of `roles`.
    pub fn require(&self, roles: &[Role], action: &'static str) -> Result<()> {
        if roles.contains(&self.user.role) {
            Ok(())
        } else {
            Err(Error::PermissionDenied {
                role: self.user.role,
                action,
            })
        }
    }
}
