//! Remote backend client.
//!
//! [`ChefNetApi`] is the seam between the data layer and the backend. It
//! hands back raw backend JSON (mapping happens in [`crate::mappers`]) and
//! reports every failure as a [`RemoteError`] whose kind is decided once, at
//! the client boundary, so callers never re-parse error text.

mod http;
mod offline;

use std::fmt;

use serde_json::Value;
use thiserror::Error;

pub use http::HttpApi;
pub use offline::OfflineApi;

/// Broad class of a backend failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// Unreachable host, timeout, 5xx, undecodable response
    Connectivity,
    /// The referenced user/course/recipe does not exist
    NotFound,
    /// The backend rejected the identifiers or payload
    Validation,
    /// Missing or rejected credentials
    Unauthorized,
    /// Any other backend-reported failure, e.g. a business-rule conflict
    Api,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connectivity => "connectivity",
            Self::NotFound => "not found",
            Self::Validation => "validation",
            Self::Unauthorized => "unauthorized",
            Self::Api => "api",
        };
        f.write_str(label)
    }
}

/// Failure of a backend call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Backend {kind} error: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    /// HTTP status when the backend answered
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Connectivity, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Validation, message)
    }

    /// Build an error from an HTTP status and response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        Self {
            kind: classify_response(status, body),
            status: Some(status),
            message: crate::util::compact_text(body),
        }
    }

    /// Domain-class failures are not retryable and must reach the user.
    pub const fn is_domain(&self) -> bool {
        !self.is_retryable()
    }

    /// Failures worth queueing and trying again later.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            RemoteErrorKind::Connectivity | RemoteErrorKind::Unauthorized
        )
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(error: reqwest::Error) -> Self {
        Self {
            kind: RemoteErrorKind::Connectivity,
            status: error.status().map(|status| status.as_u16()),
            message: error.to_string(),
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Classify a non-success HTTP response.
///
/// The attendance endpoint reports unknown students/courses as free text
/// (e.g. "Alumno no encontrado") with a generic status, so the body is
/// inspected before the status code.
pub fn classify_response(status: u16, body: &str) -> RemoteErrorKind {
    let body = body.to_lowercase();
    if body.contains("no encontrado")
        || body.contains("no existe")
        || body.contains("not found")
        || status == 404
    {
        return RemoteErrorKind::NotFound;
    }
    if body.contains("inválido")
        || body.contains("invalido")
        || body.contains("invalid")
        || status == 400
        || status == 422
    {
        return RemoteErrorKind::Validation;
    }

    match status {
        401 | 403 => RemoteErrorKind::Unauthorized,
        408 | 429 | 500..=599 => RemoteErrorKind::Connectivity,
        _ => RemoteErrorKind::Api,
    }
}

/// Backend resources consumed by the data layer.
///
/// List endpoints return the raw records; single-resource endpoints return
/// the raw record. Mutations report success as `Ok(())`.
#[allow(async_fn_in_trait)]
pub trait ChefNetApi {
    // Recipes
    async fn list_recipes(&self) -> RemoteResult<Vec<Value>>;
    async fn get_recipe(&self, recipe_id: &str) -> RemoteResult<Value>;
    async fn recipes_by_user(&self, user_id: &str) -> RemoteResult<Vec<Value>>;
    async fn search_recipes_by_name(&self, name: &str) -> RemoteResult<Vec<Value>>;
    async fn search_recipes_by_ingredient(&self, ingredient: &str) -> RemoteResult<Vec<Value>>;
    /// Returns the stored record, or `Value::Null` when the backend answers
    /// with an empty body.
    async fn create_recipe(&self, payload: &Value) -> RemoteResult<Value>;
    async fn update_recipe(&self, recipe_id: &str, payload: &Value) -> RemoteResult<Value>;
    async fn delete_recipe(&self, recipe_id: &str) -> RemoteResult<()>;
    async fn approve_recipe(&self, recipe_id: &str) -> RemoteResult<()>;

    // Courses
    async fn list_courses(&self) -> RemoteResult<Vec<Value>>;
    async fn get_course(&self, course_id: &str) -> RemoteResult<Value>;
    async fn enroll(&self, course_id: &str, user_id: &str) -> RemoteResult<()>;
    async fn cancel_enrollment(&self, course_id: &str, user_id: &str) -> RemoteResult<()>;

    // Users
    async fn get_user(&self, user_id: &str) -> RemoteResult<Value>;

    // Per-user pending recipe list
    async fn pending_list(&self, user_id: &str) -> RemoteResult<Vec<Value>>;
    async fn add_pending(&self, user_id: &str, recipe_id: &str) -> RemoteResult<()>;
    async fn remove_pending(&self, user_id: &str, recipe_id: &str) -> RemoteResult<()>;
    async fn set_pending_completed(
        &self,
        user_id: &str,
        recipe_id: &str,
        completed: bool,
    ) -> RemoteResult<()>;

    /// Returns the backend's plain-text confirmation.
    async fn record_attendance(&self, student_id: &str, course_id: &str) -> RemoteResult<String>;
}
