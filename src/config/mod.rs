//! Configuration management for `issue_triage`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`TRIAGE_*`)
//! 3. Project config (.triage/config.yaml)
//! 4. User config (~/.config/triage/config.yaml)
//! 5. DB config table
//! 6. Defaults

use crate::error::{Result, TriageError};
use crate::resolution::DEFAULT_SEMVER_RELEASE_WINDOW;
use crate::storage::SqliteStorage;
use std::collections::{BTreeSet, HashMap};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the workspace directory.
pub const TRIAGE_DIR_NAME: &str = ".triage";
/// Database filename inside the workspace directory.
pub const DEFAULT_DB_FILENAME: &str = "triage.db";
/// Busy timeout used when nothing else is configured.
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 30_000;

/// Discover the active `.triage` directory.
///
/// Honors `TRIAGE_DIR` when set, otherwise walks up from `start` (or CWD).
///
/// # Errors
///
/// Returns `NotInitialized` if no triage directory is found, or an I/O error
/// if the CWD cannot be read.
pub fn discover_triage_dir(start: Option<&Path>) -> Result<PathBuf> {
    discover_triage_dir_with_env(start, None)
}

fn discover_triage_dir_with_env(
    start: Option<&Path>,
    env_override: Option<&Path>,
) -> Result<PathBuf> {
    if let Some(path) = env_override {
        if path.is_dir() {
            return Ok(path.to_path_buf());
        }
    } else if let Ok(value) = env::var("TRIAGE_DIR") {
        if !value.trim().is_empty() {
            let path = PathBuf::from(value);
            if path.is_dir() {
                return Ok(path);
            }
        }
    }

    let mut current = match start {
        Some(path) => path.to_path_buf(),
        None => env::current_dir()?,
    };

    loop {
        let candidate = current.join(TRIAGE_DIR_NAME);
        if candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            break;
        }
    }

    Err(TriageError::NotInitialized)
}

/// Storage opened for a command, plus the config it was opened with.
#[derive(Debug)]
pub struct OpenStorageResult {
    pub storage: SqliteStorage,
    pub db_path: PathBuf,
    pub config: ConfigLayer,
}

/// Open the workspace database, honoring startup overrides for the path and
/// busy timeout, then load the full config (including the DB layer).
///
/// # Errors
///
/// Returns an error if config cannot be read or the database cannot be opened.
pub fn open_storage_with_cli(triage_dir: &Path, cli: &CliOverrides) -> Result<OpenStorageResult> {
    let startup = ConfigLayer::merge_layers(&[load_startup_config(triage_dir)?, cli.as_layer()]);
    let db_path = resolve_db_path(triage_dir, db_override_from_layer(&startup).as_ref());

    if !db_path.exists() {
        return Err(TriageError::DatabaseNotFound { path: db_path });
    }

    let lock_timeout = lock_timeout_from_layer(&startup).unwrap_or(DEFAULT_LOCK_TIMEOUT_MS);
    let storage = SqliteStorage::open_with_timeout(&db_path, Some(lock_timeout))?;
    let config = load_config(triage_dir, Some(&storage), cli)?;
    let storage = storage.with_semver_release_window(semver_release_window_from_layer(&config));

    debug!(path = %db_path.display(), "Opened triage database");
    Ok(OpenStorageResult {
        storage,
        db_path,
        config,
    })
}

fn resolve_db_path(triage_dir: &Path, db_override: Option<&PathBuf>) -> PathBuf {
    match db_override {
        Some(path) if path.is_absolute() => path.clone(),
        Some(path) => env::current_dir().map_or_else(|_| path.clone(), |cwd| cwd.join(path)),
        None => triage_dir.join(DEFAULT_DB_FILENAME),
    }
}

/// A configuration layer split into startup-only and runtime (DB) keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub startup: HashMap<String, String>,
    pub runtime: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    ///
    /// Keys are normalized first, so `release_window` in one layer and
    /// `release-window` in another name the same setting.
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.startup {
            self.startup.insert(normalize_key(key), value.clone());
        }
        for (key, value) in &other.runtime {
            self.runtime.insert(normalize_key(key), value.clone());
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

    /// Build a layer from `TRIAGE_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut layer = Self::default();

        for (key, value) in vars {
            // TRIAGE_DIR selects the workspace and is not a config key.
            if key == "TRIAGE_DIR" {
                continue;
            }
            if let Some(stripped) = key.strip_prefix("TRIAGE_") {
                let normalized = stripped.to_lowercase();
                for variant in env_key_variants(&normalized) {
                    insert_key_value(&mut layer, &variant, value.clone());
                }
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
        let map = storage.get_all_config()?;
        for (key, value) in map {
            if is_startup_key(&key) {
                continue;
            }
            layer.runtime.insert(normalize_key(&key), value);
        }
        Ok(layer)
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db: Option<PathBuf>,
    pub actor: Option<String>,
    pub json: Option<bool>,
    pub lock_timeout: Option<u64>,
    pub organization: Option<i64>,
    pub project: Option<i64>,
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
        if let Some(organization) = self.organization {
            insert_key_value(&mut layer, "default-organization", organization.to_string());
        }
        if let Some(project) = self.project {
            insert_key_value(&mut layer, "default-project", project.to_string());
        }

        layer
    }
}

/// Load project config (.triage/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(triage_dir: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&triage_dir.join("config.yaml"))
}

/// Load user config (~/.config/triage/config.yaml).
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
        .join("triage")
        .join("config.yaml");
    ConfigLayer::from_yaml(&path)
}

/// Load startup-only configuration layers (YAML + env, no DB).
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed.
pub fn load_startup_config(triage_dir: &Path) -> Result<ConfigLayer> {
    let user = load_user_config()?;
    let project = load_project_config(triage_dir)?;
    let env_layer = ConfigLayer::from_env();

    Ok(ConfigLayer::merge_layers(&[user, project, env_layer]))
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    layer.runtime.insert(
        "semver.release-window".to_string(),
        DEFAULT_SEMVER_RELEASE_WINDOW.to_string(),
    );
    layer
        .runtime
        .insert("default-organization".to_string(), "1".to_string());
    layer
        .runtime
        .insert("default-project".to_string(), "1".to_string());
    layer
}

/// Load configuration with classic precedence order.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed, or DB access fails.
pub fn load_config(
    triage_dir: &Path,
    storage: Option<&SqliteStorage>,
    cli: &CliOverrides,
) -> Result<ConfigLayer> {
    let defaults = default_config_layer();
    let db_layer = match storage {
        Some(storage) => ConfigLayer::from_db(storage)?,
        None => ConfigLayer::default(),
    };
    let user = load_user_config()?;
    let project = load_project_config(triage_dir)?;
    let env_layer = ConfigLayer::from_env();
    let cli_layer = cli.as_layer();

    Ok(ConfigLayer::merge_layers(&[
        defaults, db_layer, user, project, env_layer, cli_layer,
    ]))
}

/// Number of recent releases inspected by the semver scheme check.
#[must_use]
pub fn semver_release_window_from_layer(layer: &ConfigLayer) -> usize {
    parse_usize(layer, &["semver.release-window", "semver.release_window"])
        .filter(|window| *window > 0)
        .unwrap_or(DEFAULT_SEMVER_RELEASE_WINDOW)
}

/// Organization used when a command does not name one.
///
/// # Errors
///
/// Returns a validation error if the configured value is not an integer.
pub fn default_organization_from_layer(layer: &ConfigLayer) -> Result<i64> {
    parse_id(layer, &["default-organization", "default_organization"], "default-organization")
}

/// Project used when a command does not name one.
///
/// # Errors
///
/// Returns a validation error if the configured value is not an integer.
pub fn default_project_from_layer(layer: &ConfigLayer) -> Result<i64> {
    parse_id(layer, &["default-project", "default_project"], "default-project")
}

/// Features enabled for every organization through config.
#[must_use]
pub fn enabled_features_from_layer(layer: &ConfigLayer) -> BTreeSet<String> {
    get_startup_value(layer, &["features.enabled"])
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|feature| !feature.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Resolve actor from a merged config layer.
#[must_use]
pub fn actor_from_layer(layer: &ConfigLayer) -> Option<String> {
    get_startup_value(layer, &["actor"])
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Resolve actor with fallback to USER and a safe default.
#[must_use]
pub fn resolve_actor(layer: &ConfigLayer) -> String {
    actor_from_layer(layer)
        .or_else(|| env::var("USER").ok().map(|value| value.trim().to_string()))
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Determine if a key is startup-only.
///
/// Startup-only keys can only be set in YAML config files, the environment
/// or on the command line, never in the database.
#[must_use]
pub fn is_startup_key(key: &str) -> bool {
    let normalized = normalize_key(key);

    if normalized.starts_with("features.") {
        return true;
    }

    matches!(
        normalized.as_str(),
        "json" | "db" | "actor" | "lock-timeout" | "log-file"
    )
}

/// Look up a key in the merged layer, startup keys first.
#[must_use]
pub fn lookup<'a>(layer: &'a ConfigLayer, key: &str) -> Option<&'a String> {
    if is_startup_key(key) {
        get_startup_value(layer, &[key])
    } else {
        layer.runtime.get(&normalize_key(key))
    }
}

fn insert_key_value(layer: &mut ConfigLayer, key: &str, value: String) {
    let key = normalize_key(key);
    if is_startup_key(&key) {
        layer.startup.insert(key, value);
    } else {
        layer.runtime.insert(key, value);
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn env_key_variants(raw: &str) -> Vec<String> {
    let raw_lower = raw.to_lowercase();
    // TRIAGE_SEMVER__RELEASE_WINDOW -> semver.release-window
    let dotted = raw_lower.replace("__", ".").replace('_', "-");
    let mut variants = vec![raw_lower.replace('_', "-"), raw_lower.replace('_', ".")];
    if !variants.contains(&dotted) {
        variants.push(dotted);
    }
    variants
}

// Layers store normalized keys, so each spelling resolves to one entry.
fn get_startup_value<'a>(layer: &'a ConfigLayer, keys: &[&str]) -> Option<&'a String> {
    keys.iter()
        .find_map(|key| layer.startup.get(&normalize_key(key)))
}

fn get_value<'a>(layer: &'a ConfigLayer, keys: &[&str]) -> Option<&'a String> {
    keys.iter()
        .find_map(|key| layer.runtime.get(&normalize_key(key)))
}

fn parse_usize(layer: &ConfigLayer, keys: &[&str]) -> Option<usize> {
    get_value(layer, keys).and_then(|value| value.trim().parse::<usize>().ok())
}

fn parse_id(layer: &ConfigLayer, keys: &[&str], field: &str) -> Result<i64> {
    let value = get_value(layer, keys)
        .ok_or_else(|| TriageError::Config(format!("{field} is not configured")))?;
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| TriageError::validation(field, format!("'{value}' is not an integer id")))
}

fn db_override_from_layer(layer: &ConfigLayer) -> Option<PathBuf> {
    get_startup_value(layer, &["db", "database"]).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    })
}

fn lock_timeout_from_layer(layer: &ConfigLayer) -> Option<u64> {
    get_startup_value(layer, &["lock-timeout", "lock_timeout"])
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
