pub mod attendance;
pub mod common;
pub mod completions;
pub mod courses;
pub mod pending;
pub mod recipes;
pub mod session;
