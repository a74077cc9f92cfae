use chefnet_core::{Catalog, ChefNetApi, Context, KeyValueStore};

use crate::cli::CourseCommands;
use crate::commands::common::{format_course_details, format_course_lines, print_json};
use crate::error::CliError;

pub async fn run_courses<S: KeyValueStore, A: ChefNetApi>(
    ctx: &Context<S, A>,
    command: CourseCommands,
) -> Result<(), CliError> {
    let catalog = Catalog::new(ctx.clone());

    match command {
        CourseCommands::List { json } => {
            let courses = catalog.courses().await?;
            if json {
                return print_json(&courses);
            }
            if courses.is_empty() {
                println!("No courses found.");
            }
            for line in format_course_lines(&courses) {
                println!("{line}");
            }
        }
        CourseCommands::Show { id, json } => {
            let course = catalog
                .course(&id)
                .await?
                .ok_or_else(|| CliError::CourseNotFound(id.trim().to_string()))?;
            if json {
                return print_json(&course);
            }
            for line in format_course_details(&course) {
                println!("{line}");
            }
        }
        CourseCommands::Enroll { id } => {
            catalog.enroll(&id).await?;
            println!("Enrolled in course {}", id.trim());
        }
        CourseCommands::Cancel { id } => {
            catalog.cancel_enrollment(&id).await?;
            println!("Cancelled enrollment in course {}", id.trim());
        }
    }
    Ok(())
}
