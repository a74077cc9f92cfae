//! Pending recipe list entry model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::recipe::Recipe;
use crate::util::normalize_id;

/// A recipe queued in the user's "to cook" list, plus the fields the device
/// overlays on top of the backend copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct PendingListEntry {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub completed: bool,
    pub completed_date: Option<DateTime<Utc>>,
    pub added_date: Option<DateTime<Utc>>,
}

impl PendingListEntry {
    /// Fresh, not yet completed entry for a recipe.
    pub fn new(recipe: Recipe, added_date: DateTime<Utc>) -> Self {
        Self {
            recipe,
            completed: false,
            completed_date: None,
            added_date: Some(added_date),
        }
    }

    /// Normalized id used for every local/remote comparison.
    pub fn key(&self) -> String {
        normalize_id(&self.recipe.id)
    }

    /// Take the locally-owned fields from `local`.
    pub fn overlay_local(&mut self, local: &Self) {
        self.completed = local.completed;
        self.completed_date = local.completed_date;
        if local.added_date.is_some() {
            self.added_date = local.added_date;
        }
    }

    /// Set the completion flag, stamping or clearing the completion date.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        self.completed = completed;
        self.completed_date = completed.then_some(now);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn deserializes_flattened_partial_entry() {
        let entry: PendingListEntry =
            serde_json::from_str(r#"{"id":"5","completed":true}"#).unwrap();
        assert_eq!(entry.recipe.id, "5");
        assert!(entry.completed);
        assert!(entry.completed_date.is_none());
    }

    #[test]
    fn serializes_with_camel_case_overlay_fields() {
        let now = Utc.timestamp_millis_opt(0).unwrap();
        let mut entry = PendingListEntry::new(
            Recipe {
                id: "7".to_string(),
                ..Recipe::default()
            },
            now,
        );
        entry.set_completed(true, now);

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], "7");
        assert_eq!(json["completed"], true);
        assert!(json.get("completedDate").is_some());
        assert!(json.get("addedDate").is_some());
    }

    #[test]
    fn overlay_keeps_remote_added_date_when_local_has_none() {
        let now = Utc.timestamp_millis_opt(1_000).unwrap();
        let mut remote = PendingListEntry::new(Recipe::default(), now);
        let local = PendingListEntry {
            completed: true,
            ..PendingListEntry::default()
        };

        remote.overlay_local(&local);
        assert!(remote.completed);
        assert_eq!(remote.added_date, Some(now));
    }

    #[test]
    fn uncompleting_clears_date() {
        let now = Utc.timestamp_millis_opt(1_000).unwrap();
        let mut entry = PendingListEntry::default();
        entry.set_completed(true, now);
        assert_eq!(entry.completed_date, Some(now));
        entry.set_completed(false, now);
        assert!(entry.completed_date.is_none());
    }
}
