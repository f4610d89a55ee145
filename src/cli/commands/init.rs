use crate::config::{CONFIG_FILENAME, DB_FILENAME, WORKSPACE_DIR};
use crate::error::{IssueDbError, Result};
use crate::storage::SqliteStorage;
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::info;

const CONFIG_TEMPLATE: &str = r"# issuedb project configuration
# actor: you@example.com
# default-priority: medium
# list-limit: 50
# lock-timeout: 30000
";

const GITIGNORE: &str = r"# Database
*.db
*.db-shm
*.db-wal
";

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the directory or database cannot be created, or
/// `AlreadyInitialized` when a database exists and `force` is not set.
pub fn execute(force: bool, root_dir: Option<&Path>, json: bool) -> Result<()> {
    let base_dir = root_dir.unwrap_or_else(|| Path::new("."));
    let issuedb_dir = base_dir.join(WORKSPACE_DIR);
    let db_path = issuedb_dir.join(DB_FILENAME);

    if issuedb_dir.exists() {
        if db_path.exists() && !force {
            return Err(IssueDbError::AlreadyInitialized { path: db_path });
        }
    } else {
        fs::create_dir(&issuedb_dir)?;
    }

    // Opening applies the schema.
    SqliteStorage::open(&db_path)?;

    let config_path = issuedb_dir.join(CONFIG_FILENAME);
    if !config_path.exists() || force {
        fs::write(&config_path, CONFIG_TEMPLATE)?;
    }

    let gitignore_path = issuedb_dir.join(".gitignore");
    if !gitignore_path.exists() {
        fs::write(gitignore_path, GITIGNORE)?;
    }

    info!(path = %issuedb_dir.display(), "Initialized workspace");
    if json {
        super::print_json(&json!({
            "initialized": true,
            "path": issuedb_dir.display().to_string(),
        }))?;
    } else {
        println!("Initialized issuedb workspace in {WORKSPACE_DIR}/");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_workspace() {
        let temp_dir = TempDir::new().unwrap();
        execute(false, Some(temp_dir.path()), false).unwrap();

        let dir = temp_dir.path().join(".issuedb");
        assert!(dir.join("issues.db").exists());
        assert!(dir.join("config.yaml").exists());
        assert!(dir.join(".gitignore").exists());
    }

    #[test]
    fn test_init_fails_if_already_initialized() {
        let temp_dir = TempDir::new().unwrap();
        execute(false, Some(temp_dir.path()), false).unwrap();

        let err = execute(false, Some(temp_dir.path()), false).unwrap_err();
        assert!(matches!(err, IssueDbError::AlreadyInitialized { .. }));
    }

    #[test]
    fn test_init_force_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        execute(false, Some(temp_dir.path()), false).unwrap();

        let db_path = temp_dir.path().join(".issuedb/issues.db");
        {
            let mut storage = SqliteStorage::open(&db_path).unwrap();
            storage.set_config("list-limit", "20").unwrap();
        }

        execute(true, Some(temp_dir.path()), false).unwrap();
        let storage = SqliteStorage::open(&db_path).unwrap();
        assert_eq!(
            storage.get_config("list-limit").unwrap(),
            Some("20".to_string())
        );
    }

    #[test]
    fn test_gitignore_content() {
        let temp_dir = TempDir::new().unwrap();
        execute(false, Some(temp_dir.path()), false).unwrap();

        let content = fs::read_to_string(temp_dir.path().join(".issuedb/.gitignore")).unwrap();
        assert!(content.contains("*.db"));
        assert!(content.contains("*.db-wal"));
    }
}
