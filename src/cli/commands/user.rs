//! User command implementation.
//!
//! Registration runs without an actor; listing users and `whoami`
//! authenticate first.

use crate::cli::{RegisterArgs, UserCommands};
use crate::config;
use crate::error::Result;
use crate::model::User;
use crate::storage::NewUser;
use tracing::info;

use super::CommandContext;

/// Execute a user subcommand.
///
/// # Errors
///
/// Returns an error if the email or username is invalid or taken, or if
/// authentication fails for `list` or `whoami`.
pub fn execute(command: &UserCommands, json: bool, cli: &config::CliOverrides) -> Result<()> {
    let mut ctx = CommandContext::open(json, cli)?;

    match command {
        UserCommands::Register(args) => {
            let user = register(&mut ctx, args)?;
            if ctx.json {
                super::print_json(&user)?;
            } else {
                println!("Registered {} <{}> as user {}", user.username, user.email, user.id);
            }
        }
        UserCommands::List => {
            ctx.authenticate()?;
            let users = ctx.storage.list_users()?;
            if ctx.json {
                return super::print_json(&users);
            }
            for user in &users {
                println!("{}", format_user(user));
            }
        }
        UserCommands::Whoami => {
            let user = ctx.authenticate()?;
            if ctx.json {
                return super::print_json(&user);
            }
            println!("{}", format_user(&user));
        }
    }
    Ok(())
}

fn register(ctx: &mut CommandContext, args: &RegisterArgs) -> Result<User> {
    let user = ctx.storage.create_user(&NewUser {
        email: args.email.clone(),
        username: args.username.clone(),
        full_name: args.full_name.clone(),
    })?;
    info!(id = user.id, username = %user.username, "Registered user");
    Ok(user)
}

fn format_user(user: &User) -> String {
    match &user.full_name {
        Some(name) => format!("{:>4}  {} <{}> {name}", user.id, user.username, user.email),
        None => format!("{:>4}  {} <{}>", user.id, user.username, user.email),
    }
}
