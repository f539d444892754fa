//! Configuration management for `issue_board`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`BOARD_*`)
//! 3. Project config (.board/config.yaml)
//! 4. User config (~/.config/board/config.yaml)
//! 5. Defaults
//!
//! Scalar keys are flattened (`dump-file`, `log.level` ...). The column list
//! is taken whole from the highest layer that defines `columns`.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::columns::{ColumnDefinition, Columns};
use crate::error::{BoardError, Result};

/// Directory holding board state and project config.
pub const BOARD_DIR_NAME: &str = ".board";

/// Project config filename inside the board directory.
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Default dump filename, relative to the board directory.
const DEFAULT_DUMP_FILENAME: &str = "board.json";

const ENV_PREFIX: &str = "BOARD_";

/// Discover the active `.board` directory.
///
/// Honors `BOARD_DIR` when set, otherwise walks up from `start` (or CWD).
///
/// # Errors
///
/// Returns `BoardError::NotInitialized` if no board directory is found.
pub fn discover_board_dir(start: Option<&Path>) -> Result<PathBuf> {
    let env_override = env::var("BOARD_DIR")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from);
    discover_board_dir_with_env(start, env_override.as_deref())
}

fn discover_board_dir_with_env(start: Option<&Path>, env_override: Option<&Path>) -> Result<PathBuf> {
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
        let candidate = current.join(BOARD_DIR_NAME);
        if candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            break;
        }
    }

    Err(BoardError::NotInitialized)
}

/// One configuration source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
    pub columns: Option<Vec<ColumnDefinition>>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
        if other.columns.is_some() {
            self.columns.clone_from(&other.columns);
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

        let contents = fs::read_to_string(path)
            .map_err(|e| crate::error::io_context("read config", path, e))?;
        Self::from_yaml_str(&contents)
    }

    /// Build a layer from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or `columns` is not a list
    /// of column records.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(contents)?;
        let mut layer = Self::default();

        let serde_yaml::Value::Mapping(map) = value else {
            return Ok(layer);
        };

        for (key, value) in &map {
            let Some(key) = key.as_str() else {
                continue;
            };
            if normalize_key(key) == "columns" {
                layer.columns = Some(parse_columns(value.clone())?);
            } else {
                flatten_yaml(value, key, &mut layer.values);
            }
        }

        Ok(layer)
    }

    /// Build a layer from `BOARD_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `BOARD_COLUMNS` is set but is not a YAML/JSON
    /// list of column records.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::vars())
    }

    /// Build a layer from an explicit set of variables.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigLayer::from_env`].
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();

        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let normalized = normalize_key(stripped);
            if normalized == "columns" {
                let parsed: serde_yaml::Value = serde_yaml::from_str(&value)?;
                layer.columns = Some(parse_columns(parsed)?);
            } else {
                layer.values.insert(normalized, value);
            }
        }

        Ok(layer)
    }

    /// Look up a scalar, accepting `_` or `-` spellings.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        let wanted = normalize_key(key);
        self.values
            .iter()
            .find(|(candidate, _)| normalize_key(candidate) == wanted)
            .map(|(_, value)| value.as_str())
    }
}

/// CLI overrides for config loading.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dump: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub json: Option<bool>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(path) = &self.dump {
            layer
                .values
                .insert("dump-file".to_string(), path.to_string_lossy().to_string());
        }
        if let Some(path) = &self.log_file {
            layer
                .values
                .insert("log-file".to_string(), path.to_string_lossy().to_string());
        }
        if let Some(json) = self.json {
            layer.values.insert("json".to_string(), json.to_string());
        }

        layer
    }
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    layer
        .values
        .insert("dump-file".to_string(), DEFAULT_DUMP_FILENAME.to_string());
    layer
}

/// Load project config (.board/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(board_dir: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&board_dir.join(CONFIG_FILENAME))
}

/// Load user config (~/.config/board/config.yaml).
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
        .join("board")
        .join(CONFIG_FILENAME);
    ConfigLayer::from_yaml(&path)
}

/// Load and merge every layer.
///
/// # Errors
///
/// Returns an error if any config source cannot be read or parsed.
pub fn load_config(board_dir: &Path, cli: &CliOverrides) -> Result<ConfigLayer> {
    Ok(ConfigLayer::merge_layers(&[
        default_config_layer(),
        load_user_config()?,
        load_project_config(board_dir)?,
        ConfigLayer::from_env()?,
        cli.as_layer(),
    ]))
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub board_dir: PathBuf,
    pub dump_file: PathBuf,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<String>,
    pub columns: Columns,
}

impl BoardConfig {
    /// Resolve typed settings from a merged layer.
    ///
    /// Relative paths are resolved against `board_dir`.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Config` if the column list is empty or has
    /// duplicate names.
    pub fn from_layer(board_dir: &Path, layer: &ConfigLayer) -> Result<Self> {
        let columns = match &layer.columns {
            Some(definitions) => Columns::new(definitions.clone())
                .map_err(|e| BoardError::Config(format!("invalid columns: {e}")))?,
            None => Columns::default(),
        };

        let resolve = |value: &str| {
            let path = PathBuf::from(value.trim());
            if path.is_absolute() {
                path
            } else {
                board_dir.join(path)
            }
        };

        let dump_file = resolve(layer.get("dump-file").unwrap_or(DEFAULT_DUMP_FILENAME));
        let log_file = layer
            .get("log-file")
            .filter(|value| !value.trim().is_empty())
            .map(resolve);
        let log_level = layer
            .get("log-level")
            .or_else(|| layer.get("log.level"))
            .map(str::to_string);

        Ok(Self {
            board_dir: board_dir.to_path_buf(),
            dump_file,
            log_file,
            log_level,
            columns,
        })
    }

    /// Discover the board directory and load every layer.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::NotInitialized` if no board directory exists,
    /// or any configuration error.
    pub fn load(dir_override: Option<&Path>, cli: &CliOverrides) -> Result<Self> {
        let board_dir = match dir_override {
            Some(dir) if dir.is_dir() => dir.to_path_buf(),
            Some(_) => return Err(BoardError::NotInitialized),
            None => discover_board_dir(None)?,
        };
        let layer = load_config(&board_dir, cli)?;
        Self::from_layer(&board_dir, &layer)
    }
}

fn parse_columns(value: serde_yaml::Value) -> Result<Vec<ColumnDefinition>> {
    serde_yaml::from_value(value)
        .map_err(|e| BoardError::Config(format!("columns must be a list of column records: {e}")))
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                flatten_yaml(value, &format!("{prefix}.{key_str}"), out);
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
