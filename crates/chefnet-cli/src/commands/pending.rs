use chefnet_core::{ChefNetApi, Context, KeyValueStore, MutationOutcome, PendingRecipes};

use crate::cli::PendingCommands;
use crate::commands::common::{format_pending_lines, print_json};
use crate::error::CliError;

pub async fn run_pending<S: KeyValueStore, A: ChefNetApi>(
    ctx: &Context<S, A>,
    command: PendingCommands,
) -> Result<(), CliError> {
    let pending = PendingRecipes::new(ctx.clone());

    match command {
        PendingCommands::List { cached, json } => {
            let entries = if cached {
                pending.snapshot().await.unwrap_or_default()
            } else {
                pending.list().await
            };
            if json {
                return print_json(&entries);
            }
            if entries.is_empty() {
                println!("Your pending list is empty.");
            }
            for line in format_pending_lines(&entries) {
                println!("{line}");
            }
        }
        PendingCommands::Add { id } => {
            let outcome = pending.add(&id).await?;
            println!("{}", outcome_line(&id, "add", outcome));
        }
        PendingCommands::Remove { id } => {
            let outcome = pending.remove(&id).await?;
            println!("{}", outcome_line(&id, "remove", outcome));
        }
        PendingCommands::Done { id } => {
            let outcome = pending.toggle_completed(&id, true).await?;
            println!("{}", outcome_line(&id, "done", outcome));
        }
        PendingCommands::Undone { id } => {
            let outcome = pending.toggle_completed(&id, false).await?;
            println!("{}", outcome_line(&id, "undone", outcome));
        }
        PendingCommands::Tombstones => {
            let ids = pending.tombstones().await;
            if ids.is_empty() {
                println!("No removed recipes are hidden.");
            }
            for id in ids {
                println!("{id}");
            }
        }
        PendingCommands::ClearTombstones => {
            let cleared = pending.clear_tombstones().await;
            println!("Cleared {cleared} hidden recipe(s)");
        }
    }
    Ok(())
}

pub fn outcome_line(id: &str, action: &str, outcome: MutationOutcome) -> String {
    format!("{action} {}: {outcome}", id.trim())
}
