use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = ".mtr-audit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read the configuration file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse the configuration file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// One pattern or several, as written in the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GlobPatterns {
    One(String),
    Many(Vec<String>),
}

impl GlobPatterns {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            GlobPatterns::One(pattern) => vec![pattern.clone()],
            GlobPatterns::Many(patterns) => patterns.clone(),
        }
    }
}

impl Default for GlobPatterns {
    fn default() -> Self {
        GlobPatterns::Many(Vec::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Directory holding the MTRs and the repository (or repositories)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Patterns locating the MTR documents, relative to `path`
    #[serde(default)]
    pub glob_patterns: GlobPatterns,
}

impl AuditConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a TOML configuration file. The result is not validated.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(config)
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_glob_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.glob_patterns = GlobPatterns::Many(patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn glob_patterns(&self) -> Vec<String> {
        self.glob_patterns.to_vec()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let patterns = self.glob_patterns();

        if patterns.is_empty() {
            return Err(ConfigError::Invalid(
                "glob_patterns must contain at least one pattern".to_string(),
            ));
        }

        if patterns.iter().any(|pattern| pattern.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "glob_patterns cannot contain empty patterns".to_string(),
            ));
        }

        if self
            .path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(ConfigError::Invalid("path cannot be empty".to_string()));
        }

        Ok(())
    }
}
