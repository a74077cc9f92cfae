//! In-crate backend stub for tests.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::remote::{ChefNetApi, RemoteError, RemoteResult};

/// Scriptable [`ChefNetApi`] that keeps its "backend" state in memory.
#[derive(Default)]
pub struct StubApi {
    recipes: Mutex<HashMap<String, Value>>,
    courses: Mutex<Vec<Value>>,
    pending: Mutex<Vec<Value>>,
    failure: Mutex<Option<RemoteError>>,
    attendance_failure: Mutex<Option<RemoteError>>,
    stale_removals: Mutex<bool>,
    calls: Mutex<Vec<String>>,
}

fn guard<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn record_id(record: &Value) -> String {
    ["idReceta", "id"]
        .iter()
        .find_map(|key| match record.get(*key) {
            Some(Value::String(id)) => Some(id.trim().to_string()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

impl StubApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipe the backend knows about.
    pub fn with_recipe(self, record: Value) -> Self {
        guard(&self.recipes).insert(record_id(&record), record);
        self
    }

    pub fn with_course(self, record: Value) -> Self {
        guard(&self.courses).push(record);
        self
    }

    /// Replace the remote pending list.
    pub fn set_pending(&self, records: Vec<Value>) {
        *guard(&self.pending) = records;
    }

    pub fn pending_ids(&self) -> Vec<String> {
        guard(&self.pending).iter().map(record_id).collect()
    }

    /// Fail every call with `error` (or stop failing with `None`).
    pub fn fail_with(&self, error: Option<RemoteError>) {
        *guard(&self.failure) = error;
    }

    /// Fail only attendance calls with `error`.
    pub fn fail_attendance_with(&self, error: Option<RemoteError>) {
        *guard(&self.attendance_failure) = error;
    }

    /// Acknowledge removals without dropping the entry, like a lagging replica.
    pub fn set_stale_removals(&self, stale: bool) {
        *guard(&self.stale_removals) = stale;
    }

    pub fn calls(&self) -> Vec<String> {
        guard(&self.calls).clone()
    }

    fn call(&self, name: String) -> RemoteResult<()> {
        guard(&self.calls).push(name);
        guard(&self.failure).clone().map_or(Ok(()), Err)
    }
}

impl ChefNetApi for StubApi {
    async fn list_recipes(&self) -> RemoteResult<Vec<Value>> {
        self.call("list_recipes".to_string())?;
        let mut records: Vec<Value> = guard(&self.recipes).values().cloned().collect();
        records.sort_by_key(record_id);
        Ok(records)
    }

    async fn get_recipe(&self, recipe_id: &str) -> RemoteResult<Value> {
        self.call(format!("get_recipe:{recipe_id}"))?;
        guard(&self.recipes)
            .get(recipe_id)
            .cloned()
            .ok_or_else(|| RemoteError::from_response(404, "Receta no encontrada"))
    }

    async fn recipes_by_user(&self, user_id: &str) -> RemoteResult<Vec<Value>> {
        self.call(format!("recipes_by_user:{user_id}"))?;
        Ok(guard(&self.recipes)
            .values()
            .filter(|record| {
                record
                    .get("idUsuario")
                    .map(|id| id.to_string().trim_matches('"') == user_id)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn search_recipes_by_name(&self, name: &str) -> RemoteResult<Vec<Value>> {
        self.call(format!("search_recipes_by_name:{name}"))?;
        let name = name.to_lowercase();
        Ok(guard(&self.recipes)
            .values()
            .filter(|record| {
                record
                    .get("nombreReceta")
                    .and_then(Value::as_str)
                    .is_some_and(|title| title.to_lowercase().contains(&name))
            })
            .cloned()
            .collect())
    }

    async fn search_recipes_by_ingredient(&self, ingredient: &str) -> RemoteResult<Vec<Value>> {
        self.call(format!("search_recipes_by_ingredient:{ingredient}"))?;
        Ok(Vec::new())
    }

    async fn create_recipe(&self, payload: &Value) -> RemoteResult<Value> {
        self.call("create_recipe".to_string())?;
        let mut record = payload.clone();
        let id = (guard(&self.recipes).len() + 100).to_string();
        if let Value::Object(fields) = &mut record {
            fields.insert("idReceta".to_string(), Value::String(id.clone()));
        }
        guard(&self.recipes).insert(id, record.clone());
        Ok(record)
    }

    async fn update_recipe(&self, recipe_id: &str, payload: &Value) -> RemoteResult<Value> {
        self.call(format!("update_recipe:{recipe_id}"))?;
        let mut recipes = guard(&self.recipes);
        let record = recipes
            .get_mut(recipe_id)
            .ok_or_else(|| RemoteError::from_response(404, "Receta no encontrada"))?;
        *record = payload.clone();
        Ok(Value::Null)
    }

    async fn delete_recipe(&self, recipe_id: &str) -> RemoteResult<()> {
        self.call(format!("delete_recipe:{recipe_id}"))?;
        guard(&self.recipes).remove(recipe_id);
        Ok(())
    }

    async fn approve_recipe(&self, recipe_id: &str) -> RemoteResult<()> {
        self.call(format!("approve_recipe:{recipe_id}"))?;
        if let Some(Value::Object(record)) = guard(&self.recipes).get_mut(recipe_id) {
            record.insert("autorizada".to_string(), Value::Bool(true));
        }
        Ok(())
    }

    async fn list_courses(&self) -> RemoteResult<Vec<Value>> {
        self.call("list_courses".to_string())?;
        Ok(guard(&self.courses).clone())
    }

    async fn get_course(&self, course_id: &str) -> RemoteResult<Value> {
        self.call(format!("get_course:{course_id}"))?;
        guard(&self.courses)
            .iter()
            .find(|record| {
                record
                    .get("idCurso")
                    .is_some_and(|id| id.to_string().trim_matches('"') == course_id)
            })
            .cloned()
            .ok_or_else(|| RemoteError::from_response(404, "Curso no encontrado"))
    }

    async fn enroll(&self, course_id: &str, user_id: &str) -> RemoteResult<()> {
        self.call(format!("enroll:{course_id}:{user_id}"))
    }

    async fn cancel_enrollment(&self, course_id: &str, user_id: &str) -> RemoteResult<()> {
        self.call(format!("cancel_enrollment:{course_id}:{user_id}"))
    }

    async fn get_user(&self, user_id: &str) -> RemoteResult<Value> {
        self.call(format!("get_user:{user_id}"))?;
        Ok(serde_json::json!({ "idUsuario": user_id, "nickname": format!("user{user_id}") }))
    }

    async fn pending_list(&self, user_id: &str) -> RemoteResult<Vec<Value>> {
        self.call(format!("pending_list:{user_id}"))?;
        Ok(guard(&self.pending).clone())
    }

    async fn add_pending(&self, user_id: &str, recipe_id: &str) -> RemoteResult<()> {
        self.call(format!("add_pending:{user_id}:{recipe_id}"))?;
        let record = guard(&self.recipes)
            .get(recipe_id)
            .cloned()
            .ok_or_else(|| RemoteError::from_response(404, "Receta no encontrada"))?;
        guard(&self.pending).push(record);
        Ok(())
    }

    async fn remove_pending(&self, user_id: &str, recipe_id: &str) -> RemoteResult<()> {
        self.call(format!("remove_pending:{user_id}:{recipe_id}"))?;
        if !*guard(&self.stale_removals) {
            guard(&self.pending).retain(|record| record_id(record) != recipe_id);
        }
        Ok(())
    }

    async fn set_pending_completed(
        &self,
        user_id: &str,
        recipe_id: &str,
        completed: bool,
    ) -> RemoteResult<()> {
        self.call(format!(
            "set_pending_completed:{user_id}:{recipe_id}:{completed}"
        ))
    }

    async fn record_attendance(&self, student_id: &str, course_id: &str) -> RemoteResult<String> {
        self.call(format!("record_attendance:{student_id}:{course_id}"))?;
        guard(&self.attendance_failure)
            .clone()
            .map_or_else(|| Ok("Asistencia registrada".to_string()), Err)
    }
}
