//! TOML-based configuration for metaguard.
//!
//! The principal may be given literally or through an environment variable
//! named by `principal_env`, resolved at runtime via
//! [`MetaguardConfig::resolve_env_vars`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::conflict::ConflictSettings;
use crate::errors::ConfigError;
use crate::metadata::{MetadataDictionary, MetadataInfo};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaguardConfig {
    /// Workspace location and logging.
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Conflict detection settings.
    #[serde(default)]
    pub conflict: ConflictConfig,

    /// Extra metadata types, overriding built-ins with the same name.
    #[serde(default)]
    pub metadata: Vec<MetadataInfo>,
}

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Project root components are written into.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            log_level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Conflict detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictConfig {
    /// Run the conflict checker before retrieving.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Identity the baseline belongs to.
    #[serde(default)]
    pub principal: String,

    /// Environment variable overriding `principal` when set.
    #[serde(default)]
    pub principal_env: Option<String>,

    /// Package directory, relative to the workspace root.
    #[serde(default = "default_outputdir")]
    pub outputdir: String,

    /// Directory holding one baseline snapshot per principal.
    #[serde(default = "default_baseline_dir")]
    pub baseline_dir: PathBuf,
}

fn default_true() -> bool {
    true
}
fn default_outputdir() -> String {
    "force-app".into()
}
fn default_baseline_dir() -> PathBuf {
    PathBuf::from(".metaguard/baseline")
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            principal: String::new(),
            principal_env: None,
            outputdir: default_outputdir(),
            baseline_dir: default_baseline_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl MetaguardConfig {
    /// Load a [`MetaguardConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: MetaguardConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Replace `conflict.principal` with the value of `principal_env` when
    /// that variable is set and non-empty.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref env_name) = self.conflict.principal_env {
            match std::env::var(env_name) {
                Ok(val) if !val.is_empty() => {
                    debug!(env_name, "resolved principal from environment");
                    self.conflict.principal = val;
                }
                Ok(_) => warn!(env_name, "env var is set but empty"),
                Err(_) => warn!(env_name, "env var not set"),
            }
        }
        Ok(())
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.workspace.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "workspace.log_level".into(),
                detail: format!("expected one of {}", LOG_LEVELS.join(", ")),
            });
        }
        if self.conflict.enabled && self.conflict.principal.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "conflict.principal".into(),
                detail: "principal must not be empty when conflict detection is enabled".into(),
            });
        }
        if self.conflict.outputdir.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "conflict.outputdir".into(),
                detail: "output directory must not be empty".into(),
            });
        }
        for (i, info) in self.metadata.iter().enumerate() {
            if info.type_name.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("metadata[{i}].type"),
                    detail: "type must not be empty".into(),
                });
            }
            if let Some(ext) = info.extensions.iter().find(|e| !e.starts_with('.')) {
                return Err(ConfigError::InvalidValue {
                    field: format!("metadata[{i}].extensions"),
                    detail: format!("extension '{ext}' must start with '.'"),
                });
            }
        }
        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Built-in metadata dictionary extended with the configured types.
    pub fn metadata_dictionary(&self) -> MetadataDictionary {
        let mut dict = MetadataDictionary::builtin();
        dict.extend(self.metadata.iter().cloned());
        dict
    }

    pub fn conflict_settings(&self) -> ConflictSettings {
        ConflictSettings {
            principal: self.conflict.principal.clone(),
            outputdir: self.conflict.outputdir.clone(),
        }
    }
}
