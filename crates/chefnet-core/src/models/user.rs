//! User and student models

use serde::{Deserialize, Serialize};

/// Role a user holds on the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Browsing without an account
    Guest,
    /// Registered user
    #[default]
    User,
    /// Registered user enrolled as a student
    Student,
    /// Moderator with recipe approval rights
    Admin,
}

impl Role {
    /// Parse a backend role label. Unknown labels map to [`Role::User`].
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "invitado" | "visitante" | "guest" => Self::Guest,
            "alumno" | "estudiante" | "student" => Self::Student,
            "admin" | "administrador" | "empresa" => Self::Admin,
            _ => Self::User,
        }
    }
}

/// A platform account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
    pub role: Role,
}

/// A user enrolled as a course student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Student {
    #[serde(flatten)]
    pub user: User,
    pub card_number: Option<String>,
    pub balance: f64,
    pub enrolled_courses: Vec<String>,
}
