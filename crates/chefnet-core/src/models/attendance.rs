//! Offline attendance queue model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An attendance submission waiting to reach the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    /// Queue entry identifier (UUID v7, time-sortable)
    pub id: Uuid,
    pub student_id: String,
    pub course_id: String,
    /// When the attendance was originally taken
    pub timestamp: DateTime<Utc>,
    pub synced: bool,
    pub last_error: Option<String>,
    #[serde(default)]
    pub attempts: u32,
}

impl AttendanceRecord {
    pub fn new(
        student_id: impl Into<String>,
        course_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        last_error: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            student_id: student_id.into(),
            course_id: course_id.into(),
            timestamp,
            synced: false,
            last_error,
            attempts: 1,
        }
    }
}
