use chefnet_core::models::User;
use chefnet_core::{Catalog, ChefNetApi, Context, Error, KeyValueStore};

use crate::commands::common::print_json;
use crate::error::CliError;

/// Sign in as `user_id`. The profile comes from the backend when it can be
/// reached; otherwise a bare profile is stored so offline commands work.
pub async fn run_login<S: KeyValueStore, A: ChefNetApi>(
    ctx: &Context<S, A>,
    user_id: &str,
    name: Option<String>,
) -> Result<(), CliError> {
    let fallback = || User {
        id: user_id.trim().to_string(),
        username: name.clone().unwrap_or_default(),
        ..User::default()
    };

    let user = match Catalog::new(ctx.clone()).user(user_id).await {
        Ok(user) => user,
        Err(Error::Remote(error)) if !error.is_domain() => {
            tracing::warn!(%error, "Backend unavailable; signing in offline");
            fallback()
        }
        Err(error) => return Err(error.into()),
    };

    ctx.sign_in(&user).await?;
    println!("Signed in as {}", display_name(&user));
    Ok(())
}

pub async fn run_logout<S: KeyValueStore, A>(ctx: &Context<S, A>) -> Result<(), CliError> {
    ctx.sign_out().await?;
    println!("Signed out");
    Ok(())
}

pub async fn run_whoami<S: KeyValueStore, A>(
    ctx: &Context<S, A>,
    as_json: bool,
) -> Result<(), CliError> {
    let user = require_user(ctx).await?;
    if as_json {
        return print_json(&user);
    }
    println!("{} (#{}, {:?})", display_name(&user), user.id, user.role);
    Ok(())
}

pub async fn require_user<S: KeyValueStore, A>(ctx: &Context<S, A>) -> Result<User, CliError> {
    ctx.current_user().await.ok_or(CliError::NotSignedIn)
}

pub fn display_name(user: &User) -> &str {
    [&user.name, &user.username, &user.id]
        .into_iter()
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .unwrap_or("unknown")
}
