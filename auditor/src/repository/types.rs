//! Git data read from repositories
//!
//! Plain values: nothing here keeps a reference to the repository it was
//! read from.

use serde::{Deserialize, Serialize};

/// A branch and the commit at its tip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Branch name (`main`, or `origin/main` for remote branches)
    pub name: String,

    /// Whether this is a local or remote branch
    pub is_remote: bool,

    /// SHA of the commit at the tip of the branch
    pub head_sha: String,
}

impl Branch {
    pub fn new_local(name: String, head_sha: String) -> Self {
        Self {
            name,
            is_remote: false,
            head_sha,
        }
    }

    pub fn new_remote(name: String, head_sha: String) -> Self {
        Self {
            name,
            is_remote: true,
            head_sha,
        }
    }
}

/// A commit, as far as reporting needs it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Full commit SHA
    pub sha: String,

    /// Commit message title (first line)
    pub title: String,

    pub author: String,

    pub author_email: String,

    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Commit {
    pub fn new(
        sha: String,
        title: String,
        author: String,
        author_email: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            sha,
            title,
            author,
            author_email,
            timestamp,
        }
    }
}

/// Line counts for one file of a diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    pub path: String,
    pub insertions: usize,
    pub deletions: usize,
}

/// Changes between two revisions, one entry per changed file in the order
/// git reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    pub from: String,
    pub to: String,
    pub files: Vec<FileStat>,
}

impl Diff {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            files: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of changed files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn changed_files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|file| file.path.as_str())
    }

    pub fn insertions(&self) -> usize {
        self.files.iter().map(|file| file.insertions).sum()
    }

    pub fn deletions(&self) -> usize {
        self.files.iter().map(|file| file.deletions).sum()
    }

    /// Summary string like "+66/-233"
    pub fn summary(&self) -> String {
        format!("+{}/-{}", self.insertions(), self.deletions())
    }
}
