//! Configuration management for `issuedb`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`IDB_*`)
//! 3. Project config (.issuedb/config.yaml)
//! 4. User config (~/.config/issuedb/config.yaml)
//! 5. DB config table
//! 6. Defaults

use crate::error::{IssueDbError, Result};
use crate::model::Priority;
use crate::storage::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, SqliteStorage};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Workspace directory name.
pub const WORKSPACE_DIR: &str = ".issuedb";
/// Database filename inside the workspace.
pub const DB_FILENAME: &str = "issues.db";
/// Project config filename inside the workspace.
pub const CONFIG_FILENAME: &str = "config.yaml";
/// Environment variable that points at a workspace directly.
pub const WORKSPACE_ENV: &str = "ISSUEDB_DIR";
/// Prefix for config environment variables.
pub const ENV_PREFIX: &str = "IDB_";
/// Busy timeout used when nothing is configured.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 30_000;

/// Keys that may be stored in the DB config table.
pub const RUNTIME_KEYS: &[&str] = &["default-priority", "list-limit"];

/// Resolved paths for this workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub issuedb_dir: PathBuf,
    pub db_path: PathBuf,
}

impl ConfigPaths {
    #[must_use]
    pub fn resolve(issuedb_dir: &Path, db_override: Option<&PathBuf>) -> Self {
        let db_path = db_override.map_or_else(
            || issuedb_dir.join(DB_FILENAME),
            |path| {
                if path.is_absolute() {
                    path.clone()
                } else {
                    issuedb_dir.join(path)
                }
            },
        );
        Self {
            issuedb_dir: issuedb_dir.to_path_buf(),
            db_path,
        }
    }
}

/// Discover the active `.issuedb` directory.
///
/// Honors `ISSUEDB_DIR` when set, otherwise walks up from `start` (or CWD).
///
/// # Errors
///
/// Returns `NotInitialized` if no workspace is found.
pub fn discover_issuedb_dir(start: Option<&Path>) -> Result<PathBuf> {
    let env_override = env::var(WORKSPACE_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from);
    discover_issuedb_dir_with_env(start, env_override.as_deref())
}

fn discover_issuedb_dir_with_env(
    start: Option<&Path>,
    env_override: Option<&Path>,
) -> Result<PathBuf> {
    if let Some(path) = env_override {
        if path.is_dir() {
            return Ok(path.to_path_buf());
        }
    }

    let mut current = match start {
        Some(path) => path.to_path_buf(),
        None => env::current_dir()?,
    };

    loop {
        let candidate = current.join(WORKSPACE_DIR);
        if candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            break;
        }
    }

    Err(IssueDbError::NotInitialized)
}

/// Open storage using resolved config paths, returning the storage and paths used.
///
/// # Errors
///
/// Returns an error if startup config cannot be read or the database cannot be opened.
pub fn open_storage(
    issuedb_dir: &Path,
    db_override: Option<&PathBuf>,
    lock_timeout: Option<u64>,
) -> Result<(SqliteStorage, ConfigPaths)> {
    let startup_layer = load_startup_config(issuedb_dir)?;
    let resolved_db_override = db_override
        .cloned()
        .or_else(|| db_override_from_layer(&startup_layer));
    let resolved_lock_timeout = lock_timeout
        .or_else(|| lock_timeout_from_layer(&startup_layer))
        .unwrap_or(DEFAULT_LOCK_TIMEOUT_MS);
    let paths = ConfigPaths::resolve(issuedb_dir, resolved_db_override.as_ref());
    if !paths.db_path.exists() {
        return Err(IssueDbError::NotInitialized);
    }
    let storage = SqliteStorage::open_with_timeout(&paths.db_path, Some(resolved_lock_timeout))?;
    Ok((storage, paths))
}

/// A configuration layer split into startup-only and runtime (DB) keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub startup: HashMap<String, String>,
    pub runtime: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.startup {
            self.startup.insert(key.clone(), value.clone());
        }
        for (key, value) in &other.runtime {
            self.runtime.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_vars(env::vars())
    }

    /// Build a layer from `IDB_*` variables: `IDB_LIST_LIMIT` sets `list-limit`.
    #[must_use]
    pub fn from_env_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                insert_key_value(&mut layer, &normalize_key(stripped), value);
            }
        }
        layer
    }

    /// Build a layer from DB config table values.
    ///
    /// # Errors
    ///
    /// Returns an error if config table lookup fails.
    pub fn from_db(storage: &SqliteStorage) -> Result<Self> {
        let mut layer = Self::default();
        for (key, value) in storage.get_all_config()? {
            if is_startup_key(&key) {
                continue;
            }
            layer.runtime.insert(normalize_key(&key), value);
        }
        Ok(layer)
    }

    /// Look up a merged value by key, startup keys first.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&String> {
        let key = normalize_key(key);
        self.startup.get(&key).or_else(|| self.runtime.get(&key))
    }

    /// All keys with their values, sorted by key.
    #[must_use]
    pub fn entries(&self) -> Vec<(&String, &String)> {
        let mut entries: Vec<_> = self.startup.iter().chain(self.runtime.iter()).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db: Option<PathBuf>,
    pub actor: Option<String>,
    pub json: Option<bool>,
    pub lock_timeout: Option<u64>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(path) = &self.db {
            insert_key_value(&mut layer, "db", path.to_string_lossy().to_string());
        }
        if let Some(actor) = &self.actor {
            insert_key_value(&mut layer, "actor", actor.clone());
        }
        if let Some(json) = self.json {
            insert_key_value(&mut layer, "json", json.to_string());
        }
        if let Some(lock_timeout) = self.lock_timeout {
            insert_key_value(&mut layer, "lock-timeout", lock_timeout.to_string());
        }

        layer
    }
}

/// Load project config (.issuedb/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(issuedb_dir: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&issuedb_dir.join(CONFIG_FILENAME))
}

/// Load user config (~/.config/issuedb/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigLayer> {
    let Ok(home) = env::var("HOME") else {
        return Ok(ConfigLayer::default());
    };
    let path = Path::new(&home)
        .join(".config")
        .join("issuedb")
        .join(CONFIG_FILENAME);
    ConfigLayer::from_yaml(&path)
}

/// Load startup-only configuration layers (YAML + env, no DB).
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed.
pub fn load_startup_config(issuedb_dir: &Path) -> Result<ConfigLayer> {
    let user = load_user_config()?;
    let project = load_project_config(issuedb_dir)?;
    let env_layer = ConfigLayer::from_env();

    Ok(ConfigLayer::merge_layers(&[user, project, env_layer]))
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    layer.runtime.insert(
        "default-priority".to_string(),
        Priority::default().as_str().to_string(),
    );
    layer
        .runtime
        .insert("list-limit".to_string(), DEFAULT_PAGE_SIZE.to_string());
    layer
}

/// Load configuration with full precedence order.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed, or DB access fails.
pub fn load_config(
    issuedb_dir: &Path,
    storage: Option<&SqliteStorage>,
    cli: &CliOverrides,
) -> Result<ConfigLayer> {
    let defaults = default_config_layer();
    let db_layer = match storage {
        Some(storage) => ConfigLayer::from_db(storage)?,
        None => ConfigLayer::default(),
    };
    let user = load_user_config()?;
    let project = load_project_config(issuedb_dir)?;
    let env_layer = ConfigLayer::from_env();
    let cli_layer = cli.as_layer();

    Ok(ConfigLayer::merge_layers(&[
        defaults, db_layer, user, project, env_layer, cli_layer,
    ]))
}

/// Resolve default priority for new issues from config.
///
/// # Errors
///
/// Returns an error if the configured value is not a valid priority.
pub fn default_priority_from_layer(layer: &ConfigLayer) -> Result<Priority> {
    layer
        .runtime
        .get("default-priority")
        .map_or_else(|| Ok(Priority::default()), |value| Priority::from_str(value.trim()))
}

/// Resolve the default page size for listings.
///
/// # Errors
///
/// Returns a config error if the value is not an integer in 1..=100.
pub fn list_limit_from_layer(layer: &ConfigLayer) -> Result<usize> {
    let Some(value) = layer.runtime.get("list-limit") else {
        return Ok(DEFAULT_PAGE_SIZE);
    };
    match value.trim().parse::<usize>() {
        Ok(limit) if (1..=MAX_PAGE_SIZE).contains(&limit) => Ok(limit),
        _ => Err(IssueDbError::Config(format!(
            "list-limit must be an integer between 1 and {MAX_PAGE_SIZE}, got '{value}'"
        ))),
    }
}

/// Resolve actor from a merged config layer.
#[must_use]
pub fn actor_from_layer(layer: &ConfigLayer) -> Option<String> {
    layer
        .startup
        .get("actor")
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Whether JSON output was requested through config.
#[must_use]
pub fn json_from_layer(layer: &ConfigLayer) -> bool {
    layer
        .startup
        .get("json")
        .and_then(|value| parse_bool(value))
        .unwrap_or(false)
}

/// Determine if a key is startup-only.
///
/// Startup-only keys can only be set in YAML config files, the environment,
/// or on the command line, never in the database.
#[must_use]
pub fn is_startup_key(key: &str) -> bool {
    matches!(
        normalize_key(key).as_str(),
        "db" | "actor" | "json" | "lock-timeout"
    )
}

/// Check a value before it is written to the DB config table.
///
/// # Errors
///
/// Returns a config error for startup-only or unknown keys and for values the
/// key cannot hold.
pub fn validate_runtime_value(key: &str, value: &str) -> Result<()> {
    let key = normalize_key(key);
    if is_startup_key(&key) {
        return Err(IssueDbError::Config(format!(
            "'{key}' is a startup key; set it in {WORKSPACE_DIR}/{CONFIG_FILENAME} or via {ENV_PREFIX}{}",
            key.to_uppercase().replace('-', "_")
        )));
    }
    if !RUNTIME_KEYS.contains(&key.as_str()) {
        return Err(IssueDbError::Config(format!(
            "unknown config key '{key}' (known: {})",
            RUNTIME_KEYS.join(", ")
        )));
    }

    let mut layer = ConfigLayer::default();
    layer.runtime.insert(key, value.to_string());
    default_priority_from_layer(&layer)?;
    list_limit_from_layer(&layer)?;
    Ok(())
}

/// Canonical key form: lowercase, dashes instead of underscores.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn insert_key_value(layer: &mut ConfigLayer, key: &str, value: String) {
    let key = normalize_key(key);
    if is_startup_key(&key) {
        layer.startup.insert(key, value);
    } else {
        layer.runtime.insert(key, value);
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn db_override_from_layer(layer: &ConfigLayer) -> Option<PathBuf> {
    layer.startup.get("db").and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    })
}

fn lock_timeout_from_layer(layer: &ConfigLayer) -> Option<u64> {
    layer
        .startup
        .get("lock-timeout")
        .and_then(|value| value.trim().parse::<u64>().ok())
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    for (key, value) in flat {
        insert_key_value(&mut layer, &key, value);
    }

    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
