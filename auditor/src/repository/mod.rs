//! Repository handles
//!
//! Verification runs against one of two handle shapes:
//!
//! - [`GitRepository`]: a single git working copy. Supports every git
//!   operation but cannot hand out sub-repositories.
//! - [`MultiRepository`]: a directory holding several working copies (a
//!   `git-repo` style checkout). It has no git repository of its own, so every
//!   git operation fails with [`RepositoryError::IncompatibleOperation`]; it
//!   only hands out (and caches) handles to the repositories inside it.
//!
//! Both share the [`RepositoryHandle`] contract. Every operation has a default
//! implementation that refuses to run, so a handle only supports what it
//! explicitly overrides.

pub mod git;
pub mod multi;
pub mod types;

pub use git::GitRepository;
pub use multi::MultiRepository;
pub use types::{Branch, Commit, Diff, FileStat};

use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

/// Number of characters kept when shortening a commit SHA for messages
pub const SHORT_SHA1_LENGTH: usize = 10;

#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The path given to a single-repository handle could not be opened.
    #[error("Unable to open a git repository at '{}': {source}", .path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    /// A sub-repository of a multi-repo set-up is missing or broken.
    #[error("The path '{path}' does not contain a valid git repository.")]
    NotARepository { path: String },

    #[error("Failed to perform the action '{operation}' on '{}'. {guidance}", .path.display())]
    IncompatibleOperation {
        operation: &'static str,
        path: PathBuf,
        guidance: &'static str,
    },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Invalid UTF-8 in git data: {0}")]
    InvalidUtf8(String),

    #[error("No HEAD commit found")]
    NoHeadCommit,

    #[error("The repository at '{}' has no remotes", .0.display())]
    NoRemote(PathBuf),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// First [`SHORT_SHA1_LENGTH`] characters of the given SHA
pub fn shorten_sha1(sha1: &str) -> &str {
    match sha1.char_indices().nth(SHORT_SHA1_LENGTH) {
        Some((index, _)) => &sha1[..index],
        None => sha1,
    }
}

/// Operations the verifiers and the CLI need from a repository
pub trait RepositoryHandle {
    /// Location of the handle on disk
    fn path(&self) -> &Path;

    fn is_multi(&self) -> bool;

    /// Builds the error returned by operations this handle does not support.
    fn incompatible(&self, operation: &'static str) -> RepositoryError;

    /// Name of the checked out branch
    fn branch(&self) -> RepositoryResult<String> {
        Err(self.incompatible("branch"))
    }

    /// Every local and remote branch
    fn branches(&self) -> RepositoryResult<Vec<Branch>> {
        Err(self.incompatible("branches"))
    }

    fn head(&self) -> RepositoryResult<Commit> {
        Err(self.incompatible("head"))
    }

    /// Changes between two revisions
    fn diff(&self, _from: &str, _to: &str) -> RepositoryResult<Diff> {
        Err(self.incompatible("diff"))
    }

    /// Changes between two revisions, restricted to `path`
    fn diff_path(&self, _from: &str, _to: &str, _path: &str) -> RepositoryResult<Diff> {
        Err(self.incompatible("diff"))
    }

    /// Path component of the first remote's URL
    fn remote_uri_path(&self) -> RepositoryResult<String> {
        Err(self.incompatible("remote_uri_path"))
    }

    /// Branches whose history contains `commit`
    fn branches_with(&self, _commit: &str) -> RepositoryResult<Vec<Branch>> {
        Err(self.incompatible("branches_with"))
    }

    /// Branches whose history contains the current HEAD
    fn branches_with_head(&self) -> RepositoryResult<Vec<Branch>> {
        Err(self.incompatible("branches_with_head"))
    }

    /// Handle to the repository at `relative_path` inside this one. Repeated
    /// calls with the same path return the same handle.
    fn repository(&self, _relative_path: &str) -> RepositoryResult<Rc<GitRepository>> {
        Err(self.incompatible("repositories"))
    }
}
