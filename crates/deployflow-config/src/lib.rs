pub mod error;

pub use error::*;

use deployflow_cloud::{Condition, DEFAULT_DELIMITER, NamedCondition, PollConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable pointing directly at a config file
pub const CONFIG_PATH_ENV: &str = "DEPLOYFLOW_CONFIG_PATH";

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

/// Operator configuration shared by every task
///
/// ```yaml
/// region: eu-west-1
/// delimiter: ","
/// poll:
///   max_attempts: 60
///   interval_secs: 10
///   remote_errors:
///     policy: retry
///     max_retries: 3
/// tag_sets:
///   web:
///     env:
///       or:
///         - equals: prod
///         - equals: staging
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployflowConfig {
    /// Region passed to the API client; falls back to the SDK's own lookup
    #[serde(default)]
    pub region: Option<String>,

    /// Delimiter for multi-value strings
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    #[serde(default)]
    pub poll: PollConfig,

    /// Named sets of tag conditions (tag key -> condition)
    ///
    /// Conditions are written as single-key maps (`or: [...]`) rather than
    /// YAML tags (`!or [...]`).
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub tag_sets: BTreeMap<String, BTreeMap<String, Condition>>,
}

impl Default for DeployflowConfig {
    fn default() -> Self {
        Self {
            region: None,
            delimiter: default_delimiter(),
            poll: PollConfig::default(),
            tag_sets: BTreeMap::new(),
        }
    }
}

impl DeployflowConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml(path: &Path, content: &str) -> Result<Self> {
        let config: DeployflowConfig =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some((name, _)) = self.tag_sets.iter().find(|(_, set)| set.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "tag set '{}' has no conditions",
                name
            )));
        }
        Ok(())
    }

    /// Conditions of a named tag set
    pub fn tag_set(&self, name: &str) -> Option<Vec<NamedCondition>> {
        self.tag_sets.get(name).map(|set| {
            set.iter()
                .map(|(key, condition)| NamedCondition::new(key.clone(), condition.clone()))
                .collect()
        })
    }
}

/// Locate the config file
///
/// Search order:
/// 1. `DEPLOYFLOW_CONFIG_PATH` (must exist when set)
/// 2. current directory: deployflow.yaml, .deployflow.yaml
/// 3. `<config dir>/deployflow/config.yaml`
///
/// Returns `Ok(None)` when no file exists; defaults apply then.
pub fn find_config_file() -> Result<Option<PathBuf>> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(ConfigError::NotFound(path));
    }

    let current_dir = std::env::current_dir()?;
    for filename in ["deployflow.yaml", ".deployflow.yaml"] {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("deployflow").join("config.yaml");
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// Load a config file from an explicit path
pub fn load_from(path: &Path) -> Result<DeployflowConfig> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let config = DeployflowConfig::from_yaml(path, &content)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Load the discovered config file, or defaults when there is none
pub fn load() -> Result<DeployflowConfig> {
    match find_config_file()? {
        Some(path) => load_from(&path),
        None => {
            tracing::debug!("No config file found, using defaults");
            Ok(DeployflowConfig::default())
        }
    }
}
