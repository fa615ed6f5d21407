#![forbid(unsafe_code)]

//! Editor configuration.
//!
//! Every field has a default, so partial files are fine. With the `config`
//! feature enabled the configuration can be loaded from TOML or JSON:
//!
//! ```toml
//! [history]
//! max_depth = 200
//!
//! [history.merge]
//! enabled = true
//! max_gap_ms = 750
//!
//! [message_log]
//! capacity = 512
//! ```

#[cfg(feature = "config")]
use std::path::Path;
use std::path::PathBuf;

use crate::undo::MergePolicy;

/// Upper bound accepted for `history.merge.max_gap_ms`.
const MAX_MERGE_GAP_MS: u64 = 60_000;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct EditorConfig {
    pub history: HistoryConfig,
    pub message_log: MessageLogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct HistoryConfig {
    /// Maximum number of entries kept (0 = unlimited).
    pub max_depth: usize,
    pub merge: MergePolicy,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: 100,
            merge: MergePolicy::default(),
        }
    }
}

impl HistoryConfig {
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_depth: 0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_merge(mut self, merge: MergePolicy) -> Self {
        self.merge = merge;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct MessageLogConfig {
    /// Entries kept before the oldest is dropped.
    pub capacity: usize,
}

impl Default for MessageLogConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

impl EditorConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&read_config(path.as_ref())?)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&read_config(path.as_ref())?)
    }

    /// Validate all values are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.message_log.capacity == 0 {
            errors.push("message_log.capacity must be > 0".into());
        }

        if self.history.merge.max_gap_ms > MAX_MERGE_GAP_MS {
            errors.push(format!(
                "history.merge.max_gap_ms must be <= {MAX_MERGE_GAP_MS}, got {}",
                self.history.merge.max_gap_ms
            ));
        }

        errors
    }

    /// Validate, returning the config or every error at once.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

#[cfg(feature = "config")]
fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Errors from loading or validating an [`EditorConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// The editor config file at `path` could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Every out-of-range setting, as reported by [`EditorConfig::validate`].
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read editor config '{}': {source}", path.display())
            }
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "editor config is not valid TOML: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "editor config is not valid JSON: {e}"),
            Self::Validation(errors) => {
                write!(f, "editor config rejected: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
