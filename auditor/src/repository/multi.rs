//! Multi-repo root: a directory of git working copies with none of its own

use super::git::GitRepository;
use super::{RepositoryError, RepositoryHandle, RepositoryResult};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

const MULTI_REPO_GUIDANCE: &str = "There isn't a git repository there. If you are running with \
the --multi-repo command line switch make sure that all of your MTRs contain a valid 'repos' \
attribute.";

/// Owns the handles of the repositories below its path, keyed by the relative
/// path they were requested with.
///
/// The cache is a `RefCell` behind shared references and is not safe for
/// concurrent use.
#[derive(Debug)]
pub struct MultiRepository {
    path: PathBuf,
    repositories: RefCell<HashMap<String, Rc<GitRepository>>>,
}

impl MultiRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            repositories: RefCell::new(HashMap::new()),
        }
    }

    /// Number of repositories opened so far
    pub fn len(&self) -> usize {
        self.repositories.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.borrow().is_empty()
    }
}

impl RepositoryHandle for MultiRepository {
    fn path(&self) -> &Path {
        &self.path
    }

    fn is_multi(&self) -> bool {
        true
    }

    fn incompatible(&self, operation: &'static str) -> RepositoryError {
        RepositoryError::IncompatibleOperation {
            operation,
            path: self.path.clone(),
            guidance: MULTI_REPO_GUIDANCE,
        }
    }

    fn repository(&self, relative_path: &str) -> RepositoryResult<Rc<GitRepository>> {
        if let Some(repository) = self.repositories.borrow().get(relative_path) {
            return Ok(Rc::clone(repository));
        }

        let repository = GitRepository::open(self.path.join(relative_path)).map_err(|error| {
            debug!("Unable to open {relative_path}: {error}");
            RepositoryError::NotARepository {
                path: relative_path.to_string(),
            }
        })?;

        let repository = Rc::new(repository);
        self.repositories
            .borrow_mut()
            .insert(relative_path.to_string(), Rc::clone(&repository));
        Ok(repository)
    }
}
