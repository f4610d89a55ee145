//! Subcommand implementations.
//!
//! Each module exposes an `execute` function taking the parsed arguments,
//! the `--json` flag and the CLI config overrides.

use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::auth::{Authenticator, StoreAuthenticator};
use crate::config::{self, CliOverrides, ConfigLayer, ConfigPaths};
use crate::error::Result;
use crate::format::TextFormatOptions;
use crate::model::User;
use crate::storage::SqliteStorage;

pub mod bulk_status;
pub mod comment;
pub mod completions;
pub mod config_cmd;
pub mod create;
pub mod dashboard;
pub mod import;
pub mod init;
pub mod label;
pub mod list;
pub mod report;
pub mod schema;
pub mod show;
pub mod timeline;
pub mod update;
pub mod user;
pub mod version;

/// An opened workspace with its merged configuration.
pub struct CommandContext {
    pub issuedb_dir: PathBuf,
    pub paths: ConfigPaths,
    pub storage: SqliteStorage,
    pub config: ConfigLayer,
    pub json: bool,
}

impl CommandContext {
    /// Discover the workspace, open its database and load every config layer.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` outside a workspace, or a config/database error.
    pub fn open(json: bool, cli: &CliOverrides) -> Result<Self> {
        let issuedb_dir = config::discover_issuedb_dir(None)?;
        let (storage, paths) =
            config::open_storage(&issuedb_dir, cli.db.as_ref(), cli.lock_timeout)?;
        let config = config::load_config(&issuedb_dir, Some(&storage), cli)?;
        let json = json || config::json_from_layer(&config);
        debug!(db = %paths.db_path.display(), json, "Opened workspace");

        Ok(Self {
            issuedb_dir,
            paths,
            storage,
            config,
            json,
        })
    }

    /// Resolve the acting user from the merged configuration.
    ///
    /// # Errors
    ///
    /// Returns `Auth` when no actor is configured or it is not registered.
    pub fn authenticate(&self) -> Result<User> {
        let actor = config::actor_from_layer(&self.config);
        StoreAuthenticator::new(&self.storage).authenticate(actor.as_deref())
    }

    /// Formatting options for human output on stdout.
    #[must_use]
    pub fn text_options(&self) -> TextFormatOptions {
        text_options()
    }
}

/// Human output options: color and width only when stdout is a terminal.
#[must_use]
pub fn text_options() -> TextFormatOptions {
    use std::io::IsTerminal;

    if std::io::stdout().is_terminal() {
        TextFormatOptions {
            use_color: true,
            max_width: Some(crate::format::terminal_width()),
        }
    } else {
        TextFormatOptions::plain()
    }
}

/// Print a value as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
