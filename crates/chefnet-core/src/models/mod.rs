//! Data models for ChefNet

mod attendance;
mod course;
mod pending;
mod recipe;
mod user;

pub use attendance::AttendanceRecord;
pub use course::{Course, Schedule, Site};
pub use pending::PendingListEntry;
pub use recipe::{Authorization, Ingredient, Recipe, Step, UserRef, UNKNOWN_DURATION};
pub use user::{Role, Student, User};
