//! Recipe model

use serde::{Deserialize, Serialize};

/// Sentinel shown when a duration is unknown.
pub const UNKNOWN_DURATION: &str = "-";

/// Moderation state of a recipe. Owned by the backend and never set locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Authorization {
    /// Waiting for admin approval
    #[default]
    Pending,
    /// Approved and visible to everyone
    Published,
}

/// An ingredient line with its amount already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Ingredient {
    pub name: String,
    /// Quantity and unit, e.g. `"200 g"`
    pub amount: String,
}

/// One instruction step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Step {
    pub number: u32,
    pub text: String,
    pub image: Option<String>,
}

/// Lightweight reference to the recipe's author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UserRef {
    pub id: String,
    pub name: String,
}

/// A normalized recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Recipe {
    /// Stable identifier; the only join key between local and remote copies
    #[serde(deserialize_with = "crate::util::deserialize_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub servings: u32,
    pub people: u32,
    pub created_at: Option<String>,
    pub duration: String,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,
    pub user: Option<UserRef>,
    pub category: String,
    /// Average review score
    pub rating: f64,
    pub review_count: u32,
    pub authorization: Authorization,
}

impl Default for Recipe {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            image: None,
            servings: 0,
            people: 0,
            created_at: None,
            duration: UNKNOWN_DURATION.to_string(),
            ingredients: Vec::new(),
            steps: Vec::new(),
            user: None,
            category: String::new(),
            rating: 0.0,
            review_count: 0,
            authorization: Authorization::Pending,
        }
    }
}

impl Recipe {
    pub const fn is_published(&self) -> bool {
        matches!(self.authorization, Authorization::Published)
    }

    /// Case-insensitive match against the title or any ingredient name.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query)
            || self
                .ingredients
                .iter()
                .any(|ingredient| ingredient.name.to_lowercase().contains(&query))
    }
}
