//! Fixture repositories for the integration tests
#![allow(dead_code)]

use git2::{IndexAddOption, Repository, Signature};
use std::fs;
use std::path::{Path, PathBuf};

/// A git working copy at an arbitrary path
pub struct WorkingCopy {
    path: PathBuf,
    repo: Repository,
}

impl WorkingCopy {
    pub fn init(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        fs::create_dir_all(&path).unwrap();
        let repo = Repository::init(&path).unwrap();
        Self { path, repo }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, file: &str, content: &str) -> &Self {
        write(&self.path, file, content);
        self
    }

    pub fn commit(&self, message: &str) -> String {
        let mut index = self.repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();

        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let signature = Signature::now("Jane Doe", "jane.doe@example.com").unwrap();
        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap()
            .to_string()
    }

    pub fn branch(&self, name: &str) {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        self.repo.branch(name, &head, false).unwrap();
    }

    pub fn add_remote(&self, name: &str, url: &str) {
        self.repo.remote(name, url).unwrap();
    }
}

pub fn write(base: &Path, file: &str, content: &str) -> PathBuf {
    let path = base.join(file);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}
