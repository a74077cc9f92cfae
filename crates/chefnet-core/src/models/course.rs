//! Course, site and schedule models

use serde::{Deserialize, Serialize};

use super::recipe::UNKNOWN_DURATION;

/// A physical location where a course is taught.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Site {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

/// A dated run of a course at a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    pub course_id: String,
    pub site_id: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub available_slots: u32,
}

/// A course offered by the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub duration: String,
    pub price: Option<f64>,
    pub modality: String,
    pub requirements: String,
    pub contents: Vec<String>,
    pub sites: Vec<Site>,
    pub schedules: Vec<Schedule>,
}

impl Default for Course {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            image: None,
            duration: UNKNOWN_DURATION.to_string(),
            price: None,
            modality: String::new(),
            requirements: String::new(),
            contents: Vec::new(),
            sites: Vec::new(),
            schedules: Vec::new(),
        }
    }
}
