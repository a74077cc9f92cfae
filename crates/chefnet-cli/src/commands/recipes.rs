use chefnet_core::{Catalog, ChefNetApi, Context, KeyValueStore};

use crate::cli::RecipeCommands;
use crate::commands::common::{
    format_recipe_details, format_recipe_lines, normalize_search_query, print_json,
};
use crate::commands::session::require_user;
use crate::error::CliError;

pub async fn run_recipes<S: KeyValueStore, A: ChefNetApi>(
    ctx: &Context<S, A>,
    command: RecipeCommands,
) -> Result<(), CliError> {
    let catalog = Catalog::new(ctx.clone());

    match command {
        RecipeCommands::List { limit, json } => {
            let mut recipes = catalog.recipes().await?;
            recipes.truncate(limit);
            print_recipes(&recipes, json)
        }
        RecipeCommands::Show { id, json } => {
            let recipe = catalog
                .recipe(&id)
                .await?
                .ok_or_else(|| CliError::RecipeNotFound(id.trim().to_string()))?;
            if json {
                return print_json(&recipe);
            }
            for line in format_recipe_details(&recipe) {
                println!("{line}");
            }
            Ok(())
        }
        RecipeCommands::Search {
            query,
            ingredient,
            json,
        } => {
            let query = normalize_search_query(&query)?;
            let recipes = if ingredient {
                catalog.search_by_ingredient(&query).await?
            } else {
                catalog.search_by_name(&query).await?
            };
            print_recipes(&recipes, json)
        }
        RecipeCommands::Mine { json } => {
            let user = require_user(ctx).await?;
            let recipes = catalog.recipes_by_user(&user.id).await?;
            print_recipes(&recipes, json)
        }
        RecipeCommands::Approve { id } => {
            catalog.approve_recipe(&id).await?;
            println!("Approved recipe {}", id.trim());
            Ok(())
        }
        RecipeCommands::Delete { id } => {
            catalog.delete_recipe(&id).await?;
            println!("Deleted recipe {}", id.trim());
            Ok(())
        }
    }
}

fn print_recipes(recipes: &[chefnet_core::Recipe], as_json: bool) -> Result<(), CliError> {
    if as_json {
        return print_json(recipes);
    }
    if recipes.is_empty() {
        println!("No recipes found.");
        return Ok(());
    }
    for line in format_recipe_lines(recipes) {
        println!("{line}");
    }
    Ok(())
}
