//! `reqwest` implementation of [`ChefNetApi`].

use reqwest::{Method, RequestBuilder, Response};
use serde_json::{json, Value};
use urlencoding::encode;

use super::{ChefNetApi, RemoteError, RemoteResult};
use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// HTTP client for the ChefNet REST backend.
#[derive(Clone)]
pub struct HttpApi {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpApi {
    /// Build a client from configuration. Requires `api_base_url`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = config
            .api_base_url
            .clone()
            .ok_or_else(|| Error::Config("API base URL is not configured".to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| Error::Config(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            base_url,
            auth_token: config.auth_token.clone(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, self.url(path))
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> RemoteResult<Response> {
        let response = builder.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let error = RemoteError::from_response(status, &body);
        tracing::debug!(status, kind = %error.kind, "Backend returned an error");
        Err(error)
    }

    async fn fetch(&self, path: &str) -> RemoteResult<Value> {
        let response = self.send(self.request(Method::GET, path)).await?;
        Ok(response.json::<Value>().await?)
    }

    async fn fetch_list(&self, path: &str) -> RemoteResult<Vec<Value>> {
        self.fetch(path).await.map(into_list)
    }

    /// Send a write and decode whatever record the backend echoes back.
    async fn submit(&self, builder: RequestBuilder) -> RemoteResult<Value> {
        let body = self.send(builder).await?.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|error| {
            RemoteError::connectivity(format!("undecodable backend response: {error}"))
        })
    }

    async fn execute(&self, builder: RequestBuilder) -> RemoteResult<()> {
        self.send(builder).await.map(|_| ())
    }
}

/// Extract records from a list response, accepting bare arrays and the
/// common `{ "data": [...] }` / `{ "content": [...] }` envelopes.
fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut object) => ["data", "content", "items"]
            .iter()
            .find_map(|key| match object.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

impl ChefNetApi for HttpApi {
    async fn list_recipes(&self) -> RemoteResult<Vec<Value>> {
        self.fetch_list("/recetas").await
    }

    async fn get_recipe(&self, recipe_id: &str) -> RemoteResult<Value> {
        self.fetch(&format!("/recetas/{}", encode(recipe_id))).await
    }

    async fn recipes_by_user(&self, user_id: &str) -> RemoteResult<Vec<Value>> {
        self.fetch_list(&format!("/recetas/usuario/{}", encode(user_id)))
            .await
    }

    async fn search_recipes_by_name(&self, name: &str) -> RemoteResult<Vec<Value>> {
        self.fetch_list(&format!("/recetas/buscar?nombre={}", encode(name)))
            .await
    }

    async fn search_recipes_by_ingredient(&self, ingredient: &str) -> RemoteResult<Vec<Value>> {
        self.fetch_list(&format!("/recetas/ingrediente?nombre={}", encode(ingredient)))
            .await
    }

    async fn create_recipe(&self, payload: &Value) -> RemoteResult<Value> {
        self.submit(self.request(Method::POST, "/recetas").json(payload))
            .await
    }

    async fn update_recipe(&self, recipe_id: &str, payload: &Value) -> RemoteResult<Value> {
        let path = format!("/recetas/{}", encode(recipe_id));
        self.submit(self.request(Method::PUT, &path).json(payload))
            .await
    }

    async fn delete_recipe(&self, recipe_id: &str) -> RemoteResult<()> {
        let path = format!("/recetas/{}", encode(recipe_id));
        self.execute(self.request(Method::DELETE, &path)).await
    }

    async fn approve_recipe(&self, recipe_id: &str) -> RemoteResult<()> {
        let path = format!("/recetas/{}/aprobar", encode(recipe_id));
        self.execute(self.request(Method::PUT, &path)).await
    }

    async fn list_courses(&self) -> RemoteResult<Vec<Value>> {
        self.fetch_list("/cursos").await
    }

    async fn get_course(&self, course_id: &str) -> RemoteResult<Value> {
        self.fetch(&format!("/cursos/{}", encode(course_id))).await
    }

    async fn enroll(&self, course_id: &str, user_id: &str) -> RemoteResult<()> {
        let path = format!("/cursos/{}/inscribir", encode(course_id));
        self.execute(
            self.request(Method::POST, &path)
                .json(&json!({ "idUsuario": user_id })),
        )
        .await
    }

    async fn cancel_enrollment(&self, course_id: &str, user_id: &str) -> RemoteResult<()> {
        let path = format!("/cursos/{}/cancelar", encode(course_id));
        self.execute(
            self.request(Method::POST, &path)
                .json(&json!({ "idUsuario": user_id })),
        )
        .await
    }

    async fn get_user(&self, user_id: &str) -> RemoteResult<Value> {
        self.fetch(&format!("/usuarios/{}", encode(user_id))).await
    }

    async fn pending_list(&self, user_id: &str) -> RemoteResult<Vec<Value>> {
        self.fetch_list(&format!("/usuarios/{}/pendientes", encode(user_id)))
            .await
    }

    async fn add_pending(&self, user_id: &str, recipe_id: &str) -> RemoteResult<()> {
        let path = format!("/usuarios/{}/pendientes", encode(user_id));
        self.execute(
            self.request(Method::POST, &path)
                .json(&json!({ "idReceta": recipe_id })),
        )
        .await
    }

    async fn remove_pending(&self, user_id: &str, recipe_id: &str) -> RemoteResult<()> {
        let path = format!(
            "/usuarios/{}/pendientes/{}",
            encode(user_id),
            encode(recipe_id)
        );
        self.execute(self.request(Method::DELETE, &path)).await
    }

    async fn set_pending_completed(
        &self,
        user_id: &str,
        recipe_id: &str,
        completed: bool,
    ) -> RemoteResult<()> {
        let path = format!(
            "/usuarios/{}/pendientes/{}/completada",
            encode(user_id),
            encode(recipe_id)
        );
        self.execute(
            self.request(Method::PUT, &path)
                .json(&json!({ "completada": completed })),
        )
        .await
    }

    async fn record_attendance(&self, student_id: &str, course_id: &str) -> RemoteResult<String> {
        let response = self
            .send(
                self.request(Method::POST, "/registrarAsistencia")
                    .form(&[("idAlumno", student_id), ("idCurso", course_id)]),
            )
            .await?;
        Ok(response.text().await?.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_requires_base_url() {
        let error = HttpApi::new(&ClientConfig::default()).err().unwrap();
        assert!(error.to_string().contains("not configured"));
    }

    #[test]
    fn url_joins_base_and_path() {
        let config = ClientConfig::default()
            .with_api_base_url("https://api.chefnet.app/")
            .unwrap();
        let api = HttpApi::new(&config).unwrap();
        assert_eq!(api.url("/recetas"), "https://api.chefnet.app/recetas");
    }

    #[test]
    fn into_list_accepts_envelopes() {
        assert_eq!(into_list(json!([1, 2])).len(), 2);
        assert_eq!(into_list(json!({ "data": [1] })).len(), 1);
        assert_eq!(into_list(json!({ "content": [1, 2, 3] })).len(), 3);
        assert!(into_list(json!({ "message": "ok" })).is_empty());
        assert!(into_list(json!("text")).is_empty());
    }
}
