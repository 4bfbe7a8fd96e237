//! Discovery of MTR documents

use crate::resolver::{glob_in, ResolveError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Missing required parameter {0}")]
    MissingParameter(&'static str),

    #[error(
        "No MTR Files found in {} with the following glob patterns: {}",
        .path.display(),
        .glob_patterns.join(", ")
    )]
    NoMtrFilesFound {
        path: PathBuf,
        glob_patterns: Vec<String>,
    },

    #[error(transparent)]
    Glob(#[from] ResolveError),
}

pub type ExplorerResult<T> = Result<T, ExplorerError>;

/// Finds MTR documents below a path
#[derive(Debug, Clone)]
pub struct Explorer {
    path: PathBuf,
    glob_patterns: Vec<String>,
}

impl Explorer {
    pub fn new(path: impl Into<PathBuf>, glob_patterns: Vec<String>) -> ExplorerResult<Self> {
        let path = path.into();

        if path.as_os_str().is_empty() {
            return Err(ExplorerError::MissingParameter("path"));
        }
        if glob_patterns.is_empty() {
            return Err(ExplorerError::MissingParameter("glob_patterns"));
        }

        Ok(Self {
            path,
            glob_patterns,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn glob_patterns(&self) -> &[String] {
        &self.glob_patterns
    }

    /// Every file matching any of the patterns, pattern by pattern.
    pub fn files(&self) -> ExplorerResult<Vec<PathBuf>> {
        info!("Searching for Manual Test Records...");

        let mut files = Vec::new();
        for glob_pattern in &self.glob_patterns {
            info!("Globbing {} with {glob_pattern}...", self.path.display());

            for file in glob_in(&self.path, glob_pattern)? {
                info!("Found MTR file: {}", file.display());
                files.push(file);
            }
        }

        if files.is_empty() {
            return Err(ExplorerError::NoMtrFilesFound {
                path: self.path.clone(),
                glob_patterns: self.glob_patterns.clone(),
            });
        }

        Ok(files)
    }
}
