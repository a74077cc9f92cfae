//! Client used when no backend is configured.

use serde_json::Value;

use super::{ChefNetApi, RemoteError, RemoteResult};

/// Every call fails with a connectivity error, so callers take their local
/// fallback paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineApi;

fn offline<T>() -> RemoteResult<T> {
    Err(RemoteError::connectivity("backend is not configured"))
}

impl ChefNetApi for OfflineApi {
    async fn list_recipes(&self) -> RemoteResult<Vec<Value>> {
        offline()
    }

    async fn get_recipe(&self, _recipe_id: &str) -> RemoteResult<Value> {
        offline()
    }

    async fn recipes_by_user(&self, _user_id: &str) -> RemoteResult<Vec<Value>> {
        offline()
    }

    async fn search_recipes_by_name(&self, _name: &str) -> RemoteResult<Vec<Value>> {
        offline()
    }

    async fn search_recipes_by_ingredient(&self, _ingredient: &str) -> RemoteResult<Vec<Value>> {
        offline()
    }

    async fn create_recipe(&self, _payload: &Value) -> RemoteResult<Value> {
        offline()
    }

    async fn update_recipe(&self, _recipe_id: &str, _payload: &Value) -> RemoteResult<Value> {
        offline()
    }

    async fn delete_recipe(&self, _recipe_id: &str) -> RemoteResult<()> {
        offline()
    }

    async fn approve_recipe(&self, _recipe_id: &str) -> RemoteResult<()> {
        offline()
    }

    async fn list_courses(&self) -> RemoteResult<Vec<Value>> {
        offline()
    }

    async fn get_course(&self, _course_id: &str) -> RemoteResult<Value> {
        offline()
    }

    async fn enroll(&self, _course_id: &str, _user_id: &str) -> RemoteResult<()> {
        offline()
    }

    async fn cancel_enrollment(&self, _course_id: &str, _user_id: &str) -> RemoteResult<()> {
        offline()
    }

    async fn get_user(&self, _user_id: &str) -> RemoteResult<Value> {
        offline()
    }

    async fn pending_list(&self, _user_id: &str) -> RemoteResult<Vec<Value>> {
        offline()
    }

    async fn add_pending(&self, _user_id: &str, _recipe_id: &str) -> RemoteResult<()> {
        offline()
    }

    async fn remove_pending(&self, _user_id: &str, _recipe_id: &str) -> RemoteResult<()> {
        offline()
    }

    async fn set_pending_completed(
        &self,
        _user_id: &str,
        _recipe_id: &str,
        _completed: bool,
    ) -> RemoteResult<()> {
        offline()
    }

    async fn record_attendance(&self, _student_id: &str, _course_id: &str) -> RemoteResult<String> {
        offline()
    }
}
