//! Read-through recipe, course and user lookups.
//!
//! Reads try the fresh cache, then the backend, then whatever the cache still
//! holds past its TTL. Connectivity failures degrade to that stale data (or
//! an empty result); domain failures are returned to the caller. Writes go
//! straight to the backend and invalidate the cache entries they affect.

use serde::de::DeserializeOwned;

use crate::cache::Cache;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::mappers::{map_course, map_recipe, map_user, recipe_payload};
use crate::models::{Course, Recipe, User};
use crate::remote::{ChefNetApi, RemoteError, RemoteErrorKind, RemoteResult};
use crate::store::KeyValueStore;
use crate::util::normalize_id;

const RECIPES: &str = "recipes";
const COURSES: &str = "courses";

fn recipe_resource(id: &str) -> String {
    format!("recipe_{id}")
}

fn course_resource(id: &str) -> String {
    format!("course_{id}")
}

fn backend_disabled() -> RemoteError {
    RemoteError::connectivity("backend is disabled")
}

pub(crate) fn required_id(raw: &str, what: &str) -> Result<String> {
    let id = normalize_id(raw);
    if id.is_empty() {
        Err(Error::InvalidInput(format!("{what} id must not be empty")))
    } else {
        Ok(id)
    }
}

/// Recipe and course catalog.
pub struct Catalog<S, A> {
    ctx: Context<S, A>,
    cache: Cache<S>,
}

impl<S, A> Clone for Catalog<S, A> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<S: KeyValueStore, A: ChefNetApi> Catalog<S, A> {
    pub fn new(ctx: Context<S, A>) -> Self {
        let cache = ctx.cache();
        Self { ctx, cache }
    }

    /// Treat a disabled backend like an unreachable one.
    fn online(&self) -> RemoteResult<()> {
        if self.ctx.backend_enabled() {
            Ok(())
        } else {
            Err(backend_disabled())
        }
    }

    /// Turn a failed read into stale cached data, unless the failure is one
    /// the caller has to see.
    async fn degrade<T>(&self, error: RemoteError, resource: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        if error.is_domain() {
            return Err(error.into());
        }
        tracing::warn!(resource, %error, "Backend unavailable; serving cached data");
        Ok(self
            .cache
            .get_stale_as(resource)
            .await
            .unwrap_or_default())
    }

    /// Every recipe the backend lists.
    pub async fn recipes(&self) -> Result<Vec<Recipe>> {
        if let Some(recipes) = self.cache.get_as(RECIPES).await {
            return Ok(recipes);
        }

        let fetched = match self.online() {
            Ok(()) => self.ctx.api.list_recipes().await,
            Err(error) => Err(error),
        };
        match fetched {
            Ok(raw) => {
                let recipes: Vec<Recipe> = raw.iter().map(map_recipe).collect();
                self.cache.put_as(RECIPES, &recipes).await;
                Ok(recipes)
            }
            Err(error) => self.degrade(error, RECIPES).await,
        }
    }

    /// Resolve one recipe by id. `Ok(None)` when neither the backend nor the
    /// cache knows it.
    pub async fn recipe(&self, recipe_id: &str) -> Result<Option<Recipe>> {
        let id = required_id(recipe_id, "recipe")?;
        let resource = recipe_resource(&id);

        if let Some(recipe) = self.cache.get_as::<Recipe>(&resource).await {
            return Ok(Some(recipe));
        }
        if let Some(recipes) = self.cache.get_as::<Vec<Recipe>>(RECIPES).await {
            if let Some(recipe) = recipes.into_iter().find(|recipe| recipe.id == id) {
                return Ok(Some(recipe));
            }
        }

        let fetched = match self.online() {
            Ok(()) => self.ctx.api.get_recipe(&id).await,
            Err(error) => Err(error),
        };
        match fetched {
            Ok(raw) => {
                let mut recipe = map_recipe(&raw);
                if recipe.id.is_empty() {
                    recipe.id.clone_from(&id);
                }
                self.cache.put_as(&resource, &recipe).await;
                Ok(Some(recipe))
            }
            Err(error) if error.kind == RemoteErrorKind::NotFound => Ok(None),
            Err(error) if error.is_domain() => Err(error.into()),
            Err(error) => {
                tracing::warn!(recipe_id = %id, %error, "Backend unavailable; looking up cached recipe");
                if let Some(recipe) = self.cache.get_stale_as::<Recipe>(&resource).await {
                    return Ok(Some(recipe));
                }
                Ok(self
                    .cache
                    .get_stale_as::<Vec<Recipe>>(RECIPES)
                    .await
                    .and_then(|recipes| recipes.into_iter().find(|recipe| recipe.id == id)))
            }
        }
    }

    /// Recipes whose title matches `name`. Offline, filters the cached list.
    pub async fn search_by_name(&self, name: &str) -> Result<Vec<Recipe>> {
        let fetched = match self.online() {
            Ok(()) => self.ctx.api.search_recipes_by_name(name.trim()).await,
            Err(error) => Err(error),
        };
        match fetched {
            Ok(raw) => Ok(raw.iter().map(map_recipe).collect()),
            Err(error) => {
                let query = name.trim().to_lowercase();
                let cached: Vec<Recipe> = self.degrade(error, RECIPES).await?;
                Ok(cached
                    .into_iter()
                    .filter(|recipe| recipe.title.to_lowercase().contains(&query))
                    .collect())
            }
        }
    }

    /// Recipes using `ingredient`. Offline, filters the cached list.
    pub async fn search_by_ingredient(&self, ingredient: &str) -> Result<Vec<Recipe>> {
        let fetched = match self.online() {
            Ok(()) => {
                self.ctx
                    .api
                    .search_recipes_by_ingredient(ingredient.trim())
                    .await
            }
            Err(error) => Err(error),
        };
        match fetched {
            Ok(raw) => Ok(raw.iter().map(map_recipe).collect()),
            Err(error) => {
                let query = ingredient.trim().to_lowercase();
                let cached: Vec<Recipe> = self.degrade(error, RECIPES).await?;
                Ok(cached
                    .into_iter()
                    .filter(|recipe| {
                        recipe
                            .ingredients
                            .iter()
                            .any(|item| item.name.to_lowercase().contains(&query))
                    })
                    .collect())
            }
        }
    }

    /// Recipes authored by `user_id`.
    pub async fn recipes_by_user(&self, user_id: &str) -> Result<Vec<Recipe>> {
        let user_id = required_id(user_id, "user")?;
        let fetched = match self.online() {
            Ok(()) => self.ctx.api.recipes_by_user(&user_id).await,
            Err(error) => Err(error),
        };
        match fetched {
            Ok(raw) => Ok(raw.iter().map(map_recipe).collect()),
            Err(error) => {
                let cached: Vec<Recipe> = self.degrade(error, RECIPES).await?;
                Ok(cached
                    .into_iter()
                    .filter(|recipe| recipe.user.as_ref().is_some_and(|user| user.id == user_id))
                    .collect())
            }
        }
    }

    /// Submit a new recipe. The backend assigns the id.
    pub async fn create_recipe(&self, recipe: &Recipe) -> Result<Recipe> {
        self.online()?;
        let stored = self.ctx.api.create_recipe(&recipe_payload(recipe)).await?;
        self.cache.invalidate(RECIPES).await;

        if stored.is_object() {
            Ok(map_recipe(&stored))
        } else {
            Ok(recipe.clone())
        }
    }

    /// Replace the author-editable fields of an existing recipe.
    pub async fn update_recipe(&self, recipe: &Recipe) -> Result<Recipe> {
        let id = required_id(&recipe.id, "recipe")?;
        self.online()?;
        let stored = self
            .ctx
            .api
            .update_recipe(&id, &recipe_payload(recipe))
            .await?;
        self.invalidate_recipe(&id).await;

        if stored.is_object() {
            Ok(map_recipe(&stored))
        } else {
            Ok(recipe.clone())
        }
    }

    pub async fn delete_recipe(&self, recipe_id: &str) -> Result<()> {
        let id = required_id(recipe_id, "recipe")?;
        self.online()?;
        self.ctx.api.delete_recipe(&id).await?;
        self.invalidate_recipe(&id).await;
        Ok(())
    }

    /// Publish a recipe waiting for moderation. Admin only on the backend.
    pub async fn approve_recipe(&self, recipe_id: &str) -> Result<()> {
        let id = required_id(recipe_id, "recipe")?;
        self.online()?;
        self.ctx.api.approve_recipe(&id).await?;
        self.invalidate_recipe(&id).await;
        Ok(())
    }

    async fn invalidate_recipe(&self, id: &str) {
        self.cache.invalidate(&recipe_resource(id)).await;
        self.cache.invalidate(RECIPES).await;
    }

    pub async fn courses(&self) -> Result<Vec<Course>> {
        if let Some(courses) = self.cache.get_as(COURSES).await {
            return Ok(courses);
        }

        let fetched = match self.online() {
            Ok(()) => self.ctx.api.list_courses().await,
            Err(error) => Err(error),
        };
        match fetched {
            Ok(raw) => {
                let courses: Vec<Course> = raw.iter().map(map_course).collect();
                self.cache.put_as(COURSES, &courses).await;
                Ok(courses)
            }
            Err(error) => self.degrade(error, COURSES).await,
        }
    }

    pub async fn course(&self, course_id: &str) -> Result<Option<Course>> {
        let id = required_id(course_id, "course")?;
        let resource = course_resource(&id);

        if let Some(course) = self.cache.get_as::<Course>(&resource).await {
            return Ok(Some(course));
        }

        let fetched = match self.online() {
            Ok(()) => self.ctx.api.get_course(&id).await,
            Err(error) => Err(error),
        };
        match fetched {
            Ok(raw) => {
                let mut course = map_course(&raw);
                if course.id.is_empty() {
                    course.id.clone_from(&id);
                }
                self.cache.put_as(&resource, &course).await;
                Ok(Some(course))
            }
            Err(error) if error.kind == RemoteErrorKind::NotFound => Ok(None),
            Err(error) if error.is_domain() => Err(error.into()),
            Err(error) => {
                tracing::warn!(course_id = %id, %error, "Backend unavailable; looking up cached course");
                if let Some(course) = self.cache.get_stale_as::<Course>(&resource).await {
                    return Ok(Some(course));
                }
                Ok(self
                    .cache
                    .get_stale_as::<Vec<Course>>(COURSES)
                    .await
                    .and_then(|courses| courses.into_iter().find(|course| course.id == id)))
            }
        }
    }

    /// Enroll the signed-in user in a course.
    pub async fn enroll(&self, course_id: &str) -> Result<()> {
        let id = required_id(course_id, "course")?;
        let user = self.signed_in().await?;
        self.online()?;
        self.ctx.api.enroll(&id, &user.id).await?;
        self.invalidate_course(&id).await;
        tracing::info!(course_id = %id, user_id = %user.id, "Enrolled in course");
        Ok(())
    }

    /// Cancel the signed-in user's enrollment in a course.
    pub async fn cancel_enrollment(&self, course_id: &str) -> Result<()> {
        let id = required_id(course_id, "course")?;
        let user = self.signed_in().await?;
        self.online()?;
        self.ctx.api.cancel_enrollment(&id, &user.id).await?;
        self.invalidate_course(&id).await;
        tracing::info!(course_id = %id, user_id = %user.id, "Cancelled course enrollment");
        Ok(())
    }

    async fn invalidate_course(&self, id: &str) {
        self.cache.invalidate(&course_resource(id)).await;
        self.cache.invalidate(COURSES).await;
    }

    /// Fetch a user profile from the backend.
    pub async fn user(&self, user_id: &str) -> Result<User> {
        let id = required_id(user_id, "user")?;
        self.online()?;
        let raw = self.ctx.api.get_user(&id).await?;
        let mut user = map_user(&raw);
        if user.id.is_empty() {
            user.id = id;
        }
        Ok(user)
    }

    async fn signed_in(&self) -> Result<User> {
        self.ctx
            .current_user()
            .await
            .ok_or_else(|| Error::InvalidInput("no user is signed in".to_string()))
    }
}
