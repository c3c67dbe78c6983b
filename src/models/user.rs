//! Roster models

use serde::Serialize;

/// Roster role. Only affects downstream authorization, never presence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Employee,
}

impl Role {
    /// Fold a source spelling into a role. Anything but `admin` is an employee.
    pub fn from_source(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Employee
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }
}

/// Roster member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl User {
    /// Whether `reference` names this user by id.
    pub fn matches_id(&self, reference: &str) -> bool {
        !self.id.is_empty() && self.id == reference
    }

    /// Whether `reference` names this user by email (case-insensitive).
    pub fn matches_email(&self, reference: &str) -> bool {
        let email = self.email.trim();
        !email.is_empty() && email.eq_ignore_ascii_case(reference.trim())
    }
}
