//! Engine configuration from `liveedit.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── session    # [session]
//! │   ├── compiler   # [compiler]
//! │   └── device     # [device]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   ├── field      # FieldPath
//! │   └── handle     # Global config handle
//! └── mod.rs         # EngineConfig (this file)
//! ```
//!
//! Every section is optional; a missing file yields the defaults.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{CompilerConfig, DeviceConfig, SessionConfig, TriggerMode};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath, cfg, init_config, reload_config};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name, searched upward from the working directory.
pub const CONFIG_FILE: &str = "liveedit.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing liveedit.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// File the config was loaded from (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub compiler: CompilerConfig,

    #[serde(default)]
    pub device: DeviceConfig,
}

impl EngineConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `liveedit.toml` is searched
    /// upward from the working directory and defaults apply when none is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) if !path.exists() => {
                bail!("config file '{}' not found", path.display());
            }
            Some(path) => Some(path.to_path_buf()),
            None => {
                let cwd =
                    std::env::current_dir().context("Failed to get current working directory")?;
                find_config_file(Path::new(CONFIG_FILE), &cwd)
            }
        };

        let Some(path) = path else {
            crate::debug!("config"; "no {CONFIG_FILE} found, using defaults");
            return Ok(Self::default());
        };

        let mut config = Self::from_path(&path)?;
        config.config_path = Some(path);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        let mut diag = ConfigDiagnostics::new();
        for field in ignored {
            diag.warn(field);
        }
        diag.print_warnings();

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Validate every section, failing with all diagnostics at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        self.session.validate(&mut diag);
        self.device.validate(&mut diag);
        diag.into_result().map_err(ConfigError::Diagnostics)
    }
}

/// Parse a config snippet, failing the test on unknown fields.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> EngineConfig {
    let (parsed, ignored) = EngineConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_str_invalid_toml() {
        let result = EngineConfig::from_str("[session\ntrigger = \"auto\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_collected() {
        let (config, ignored) =
            EngineConfig::parse_with_ignored("[device]\npoll_count = 3\npol_interval = 1\n[extra]\nx = 1")
                .unwrap();
        assert_eq!(config.device.poll_count, 3);
        assert_eq!(ignored, vec!["device.pol_interval".to_string(), "extra".to_string()]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[session]\ntrigger = \"manual\"\n[device]\npoll_count = 1\n").unwrap();

        let config = EngineConfig::load(Some(&path)).unwrap();
        assert!(config.session.is_manual());
        assert_eq!(config.device.poll_count, 1);
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = TempDir::new().unwrap();
        let result = EngineConfig::load(Some(&dir.path().join("missing.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_reports_all_diagnostics() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[session]\nmax_buffered_edits = 0\n[device]\npoll_count = 0\n").unwrap();

        let err = EngineConfig::load(Some(&path)).unwrap_err();
        let Some(ConfigError::Diagnostics(diag)) = err.downcast_ref::<ConfigError>() else {
            panic!("expected diagnostics, got {err}");
        };
        assert_eq!(diag.len(), 2);
    }

    #[test]
    fn test_defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }
}
