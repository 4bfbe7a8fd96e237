//! Single git working copy, read through git2

use super::types::{Branch, Commit, Diff, FileStat};
use super::{RepositoryError, RepositoryHandle, RepositoryResult};
use git2::{BranchType, DiffOptions, Oid, Patch, Repository};
use regex::Regex;
use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

const SINGLE_REPO_GUIDANCE: &str = "The path was not set-up as a multi-repo path. If you are \
running without the --multi-repo command line switch make sure that none of your MTRs have a \
'repos' attribute or run with the --multi-repo switch";

/// `scheme://[user@]host[:port]/path`
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^/]*(?P<path>/.*)?$").expect("valid URL pattern")
});

/// `[user@]host:path`, the scp-like syntax understood by git
static SCP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[^@/:]+@)?(?P<host>[^@/:]+):(?P<path>.*)$").expect("valid scp pattern")
});

pub struct GitRepository {
    path: PathBuf,
    repo: Repository,
    head: OnceCell<Commit>,
    branches_with_head: OnceCell<Vec<Branch>>,
}

impl fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitRepository")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl GitRepository {
    /// Opens the working copy rooted at `path`.
    pub fn open(path: impl Into<PathBuf>) -> RepositoryResult<Self> {
        let path = path.into();
        let repo = Repository::open(&path).map_err(|source| RepositoryError::InvalidPath {
            path: path.clone(),
            source,
        })?;

        debug!("Opened git repository at {}", path.display());
        Ok(Self {
            path,
            repo,
            head: OnceCell::new(),
            branches_with_head: OnceCell::new(),
        })
    }

    fn tree_of(&self, revision: &str) -> RepositoryResult<git2::Tree<'_>> {
        Ok(self.repo.revparse_single(revision)?.peel_to_tree()?)
    }

    fn read_diff(&self, from: &str, to: &str, path: Option<&str>) -> RepositoryResult<Diff> {
        let from_tree = self.tree_of(from)?;
        let to_tree = self.tree_of(to)?;

        let mut options = DiffOptions::new();
        if let Some(path) = path {
            options.pathspec(path);
        }

        let git_diff =
            self.repo
                .diff_tree_to_tree(Some(&from_tree), Some(&to_tree), Some(&mut options))?;

        let mut diff = Diff::new(from, to);
        for (index, delta) in git_diff.deltas().enumerate() {
            let file = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .ok_or_else(|| RepositoryError::InvalidUtf8("file path".to_string()))?;
            let file = file
                .to_str()
                .ok_or_else(|| RepositoryError::InvalidUtf8("file path".to_string()))?;

            let (insertions, deletions) = match Patch::from_diff(&git_diff, index)? {
                Some(patch) => {
                    let (_context, insertions, deletions) = patch.line_stats()?;
                    (insertions, deletions)
                }
                None => (0, 0),
            };

            diff.files.push(FileStat {
                path: file.to_string(),
                insertions,
                deletions,
            });
        }

        Ok(diff)
    }

    fn read_commit(&self, oid: Oid) -> RepositoryResult<Commit> {
        let commit = self.repo.find_commit(oid)?;

        let title = commit
            .message()
            .and_then(|message| message.lines().next())
            .unwrap_or("")
            .to_string();

        let author = commit.author();
        let author_name = author
            .name()
            .ok_or_else(|| RepositoryError::InvalidUtf8("author name".to_string()))?
            .to_string();
        let author_email = author
            .email()
            .ok_or_else(|| RepositoryError::InvalidUtf8("author email".to_string()))?
            .to_string();

        let timestamp = chrono::DateTime::from_timestamp(commit.time().seconds(), 0)
            .ok_or_else(|| RepositoryError::InvalidUtf8("timestamp".to_string()))?;

        Ok(Commit::new(
            oid.to_string(),
            title,
            author_name,
            author_email,
            timestamp,
        ))
    }

    /// True when `commit` is the tip of `branch` or one of its ancestors.
    fn branch_contains(&self, branch: &Branch, commit: Oid) -> RepositoryResult<bool> {
        let tip = Oid::from_str(&branch.head_sha)?;
        Ok(tip == commit || self.repo.graph_descendant_of(tip, commit)?)
    }
}

impl RepositoryHandle for GitRepository {
    fn path(&self) -> &Path {
        &self.path
    }

    fn is_multi(&self) -> bool {
        false
    }

    fn incompatible(&self, operation: &'static str) -> RepositoryError {
        RepositoryError::IncompatibleOperation {
            operation,
            path: self.path.clone(),
            guidance: SINGLE_REPO_GUIDANCE,
        }
    }

    fn branch(&self) -> RepositoryResult<String> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Ok("HEAD".to_string());
        }

        Ok(head
            .shorthand()
            .ok_or_else(|| RepositoryError::InvalidUtf8("branch name".to_string()))?
            .to_string())
    }

    fn branches(&self) -> RepositoryResult<Vec<Branch>> {
        let mut branches = Vec::new();

        for branch_result in self.repo.branches(None)? {
            let (branch, branch_type) = branch_result?;
            let Some(name) = branch.name()? else {
                continue;
            };
            // Symbolic refs such as origin/HEAD have no direct target.
            let Some(oid) = branch.get().target() else {
                continue;
            };

            branches.push(match branch_type {
                BranchType::Local => Branch::new_local(name.to_string(), oid.to_string()),
                BranchType::Remote => Branch::new_remote(name.to_string(), oid.to_string()),
            });
        }

        Ok(branches)
    }

    fn head(&self) -> RepositoryResult<Commit> {
        if let Some(head) = self.head.get() {
            return Ok(head.clone());
        }

        let oid = self
            .repo
            .head()?
            .target()
            .ok_or(RepositoryError::NoHeadCommit)?;
        let head = self.read_commit(oid)?;
        Ok(self.head.get_or_init(|| head).clone())
    }

    fn diff(&self, from: &str, to: &str) -> RepositoryResult<Diff> {
        self.read_diff(from, to, None)
    }

    fn diff_path(&self, from: &str, to: &str, path: &str) -> RepositoryResult<Diff> {
        self.read_diff(from, to, Some(path))
    }

    fn remote_uri_path(&self) -> RepositoryResult<String> {
        let remotes = self.repo.remotes()?;
        let name = remotes
            .iter()
            .flatten()
            .next()
            .ok_or_else(|| RepositoryError::NoRemote(self.path.clone()))?;

        let remote = self.repo.find_remote(name)?;
        let url = remote
            .url()
            .ok_or_else(|| RepositoryError::InvalidUtf8("remote url".to_string()))?;

        Ok(uri_path(url))
    }

    fn branches_with(&self, commit: &str) -> RepositoryResult<Vec<Branch>> {
        let commit = self.repo.revparse_single(commit)?.peel_to_commit()?.id();

        let mut branches = Vec::new();
        for branch in self.branches()? {
            if self.branch_contains(&branch, commit)? {
                branches.push(branch);
            }
        }
        Ok(branches)
    }

    fn branches_with_head(&self) -> RepositoryResult<Vec<Branch>> {
        if let Some(branches) = self.branches_with_head.get() {
            return Ok(branches.clone());
        }

        let head = self.head()?;
        let branches = self.branches_with(&head.sha)?;
        Ok(self.branches_with_head.get_or_init(|| branches).clone())
    }
}

/// Extracts the path component of a remote URL:
///
/// ```text
/// ssh://jenkins@gerrit.example.com:29418/tools/dragnet  -> /tools/dragnet
/// git@github.com:tools/dragnet.git                       -> /tools/dragnet.git
/// /srv/git/dragnet.git                                    -> /srv/git/dragnet.git
/// ```
pub fn uri_path(url: &str) -> String {
    if let Some(captures) = URL_PATTERN.captures(url) {
        let path = captures.name("path").map_or("", |path| path.as_str());
        return path.to_string();
    }

    if let Some(captures) = SCP_PATTERN.captures(url) {
        // A single letter before the colon is a Windows drive, not a host.
        let is_drive = captures.name("host").is_some_and(|host| host.len() == 1);
        if !is_drive {
            let path = captures.name("path").map_or("", |path| path.as_str());
            return if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{path}")
            };
        }
    }

    url.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_path_of_urls() {
        assert_eq!(
            uri_path("ssh://jenkins@gerrit.example.com:29418/tools/dragnet"),
            "/tools/dragnet"
        );
        assert_eq!(
            uri_path("https://github.com/esrlabs/dragnet.git"),
            "/esrlabs/dragnet.git"
        );
        assert_eq!(
            uri_path("git://git.example.com/project"),
            "/project"
        );
        assert_eq!(uri_path("file:///srv/git/project"), "/srv/git/project");
        assert_eq!(uri_path("https://example.com"), "");
    }

    #[test]
    fn test_uri_path_of_scp_like_addresses() {
        assert_eq!(
            uri_path("git@github.com:esrlabs/dragnet.git"),
            "/esrlabs/dragnet.git"
        );
        assert_eq!(
            uri_path("gerrit.example.com:/srv/project"),
            "/srv/project"
        );
    }

    #[test]
    fn test_uri_path_of_filesystem_paths() {
        assert_eq!(uri_path("/srv/git/project.git"), "/srv/git/project.git");
        assert_eq!(uri_path("../project"), "../project");
        assert_eq!(
            uri_path(r"C:\repositories\project"),
            "C:/repositories/project"
        );
    }

    #[test]
    fn test_open_invalid_path() {
        let directory = tempfile::tempdir().unwrap();
        let result = GitRepository::open(directory.path());

        match result {
            Err(RepositoryError::InvalidPath { path, .. }) => {
                assert_eq!(path, directory.path());
            }
            Err(other) => panic!("Unexpected error: {other}"),
            Ok(_) => panic!("Expected the open to fail"),
        }
    }

    #[test]
    fn test_repositories_are_not_supported() {
        let directory = tempfile::tempdir().unwrap();
        Repository::init(directory.path()).unwrap();

        let repository = GitRepository::open(directory.path()).unwrap();
        assert!(!repository.is_multi());

        let error = repository.repository("libs/core").unwrap_err();
        assert!(matches!(
            error,
            RepositoryError::IncompatibleOperation {
                operation: "repositories",
                ..
            }
        ));
        assert!(error
            .to_string()
            .contains("The path was not set-up as a multi-repo path."));
    }
}
