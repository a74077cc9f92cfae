use std::env;
use std::path::PathBuf;

use chefnet_core::{AttendanceRecord, ClientConfig, Course, PendingListEntry, Recipe};
use chrono::Utc;
use serde::Serialize;

use crate::error::CliError;

pub const DB_PATH_ENV: &str = "CHEFNET_DB_PATH";

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match cli_db_path.or_else(|| env::var_os(DB_PATH_ENV).map(PathBuf::from)) {
        Some(path) => Ok(path),
        None => default_db_path(),
    }
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("chefnet").join("chefnet.db"))
        .ok_or_else(|| {
            CliError::Config("could not resolve a data directory; pass --db-path".to_string())
        })
}

/// Environment configuration with command-line overrides applied.
pub fn resolve_config(api_url: Option<&str>, offline: bool) -> Result<ClientConfig, CliError> {
    config_from_lookup(|key| env::var(key).ok(), api_url, offline)
}

pub fn config_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
    api_url: Option<&str>,
    offline: bool,
) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_lookup(lookup)?;
    if let Some(url) = api_url {
        config = config.with_api_base_url(url)?;
    }
    if offline {
        config.use_backend = false;
    }
    Ok(config)
}

pub fn normalize_search_query(query: &str) -> Result<String, CliError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySearchQuery)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// First `max_chars` characters of the first line, with an ellipsis when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    if first_line.chars().count() <= max_chars {
        return first_line.to_string();
    }
    let mut cut = first_line
        .chars()
        .take(max_chars.saturating_sub(3))
        .collect::<String>();
    cut.push_str("...");
    cut
}

pub fn format_recipe_lines(recipes: &[Recipe]) -> Vec<String> {
    recipes
        .iter()
        .map(|recipe| {
            let title = preview(&recipe.title, 40);
            let status = if recipe.is_published() {
                ""
            } else {
                "  (awaiting approval)"
            };
            format!(
                "{:<6}  {title:<40}  {:<8}  {:.1}*{status}",
                recipe.id, recipe.duration, recipe.rating
            )
        })
        .collect()
}

pub fn format_recipe_details(recipe: &Recipe) -> Vec<String> {
    let mut lines = vec![format!("{} (#{})", recipe.title, recipe.id)];
    if !recipe.description.is_empty() {
        lines.push(recipe.description.clone());
    }
    lines.push(format!(
        "Duration: {}  Servings: {}  Rating: {:.1} ({} reviews)",
        recipe.duration, recipe.servings, recipe.rating, recipe.review_count
    ));
    if let Some(user) = &recipe.user {
        lines.push(format!("By: {}", display_or(&user.name, &user.id)));
    }

    if !recipe.ingredients.is_empty() {
        lines.push(String::new());
        lines.push("Ingredients:".to_string());
        for ingredient in &recipe.ingredients {
            if ingredient.amount.is_empty() {
                lines.push(format!("  - {}", ingredient.name));
            } else {
                lines.push(format!("  - {} ({})", ingredient.name, ingredient.amount));
            }
        }
    }
    if !recipe.steps.is_empty() {
        lines.push(String::new());
        lines.push("Steps:".to_string());
        for step in &recipe.steps {
            lines.push(format!("  {}. {}", step.number, step.text));
        }
    }
    lines
}

pub fn format_course_lines(courses: &[Course]) -> Vec<String> {
    courses
        .iter()
        .map(|course| {
            let title = preview(&course.title, 40);
            let price = course
                .price
                .map_or_else(|| "-".to_string(), |price| format!("${price:.2}"));
            format!(
                "{:<6}  {title:<40}  {:<8}  {price}",
                course.id, course.duration
            )
        })
        .collect()
}

pub fn format_course_details(course: &Course) -> Vec<String> {
    let mut lines = vec![format!("{} (#{})", course.title, course.id)];
    if !course.description.is_empty() {
        lines.push(course.description.clone());
    }
    lines.push(format!(
        "Duration: {}  Modality: {}",
        course.duration,
        display_or(&course.modality, "-")
    ));
    for schedule in &course.schedules {
        let site = course
            .sites
            .iter()
            .find(|site| site.id == schedule.site_id)
            .map_or(schedule.site_id.as_str(), |site| site.name.as_str());
        lines.push(format!(
            "  {} -> {} at {} ({} slots)",
            schedule.start_date.as_deref().unwrap_or("?"),
            schedule.end_date.as_deref().unwrap_or("?"),
            display_or(site, "-"),
            schedule.available_slots
        ));
    }
    lines
}

pub fn format_pending_lines(entries: &[PendingListEntry]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    entries
        .iter()
        .map(|entry| {
            let mark = if entry.completed { "x" } else { " " };
            let title = preview(&entry.recipe.title, 40);
            let added = entry.added_date.map_or_else(String::new, |date| {
                format!("added {}", format_relative_time(date.timestamp_millis(), now_ms))
            });
            format!("[{mark}] {:<6}  {title:<40}  {added}", entry.recipe.id)
        })
        .collect()
}

pub fn format_queue_lines(records: &[AttendanceRecord]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    records
        .iter()
        .map(|record| {
            format!(
                "student={} course={}  {}  attempts={}  {}",
                record.student_id,
                record.course_id,
                format_relative_time(record.timestamp.timestamp_millis(), now_ms),
                record.attempts,
                record.last_error.as_deref().unwrap_or("")
            )
        })
        .collect()
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

fn display_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}
