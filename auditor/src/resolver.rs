//! Resolution of the paths declared in test records
//!
//! Declared `files` are glob patterns relative to a base directory. Resolving
//! them replaces the patterns with the concrete files they match, as
//! forward-slash paths relative to that same base. Declared `repos` paths must
//! exist; their own `files` are resolved against the repository directory.

use glob::{MatchOptions, Pattern};
use mtr_model::{Repo, TestRecord};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Could not find any files matching {pattern} in {}", .base.display())]
    FileNotFound { pattern: String, base: PathBuf },

    #[error("Cannot find the repository path {path}{}", inside(.base))]
    RepoPathNotFound {
        path: String,
        /// Only set when the declared path is relative
        base: Option<PathBuf>,
    },

    #[error("Invalid glob pattern {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

pub type ResolveResult<T> = Result<T, ResolveError>;

fn inside(base: &Option<PathBuf>) -> String {
    base.as_ref()
        .map(|base| format!(" inside {}", base.display()))
        .unwrap_or_default()
}

/// Matching rules shared by every glob in the crate: `*` stays within one
/// directory and hidden files must be named explicitly.
pub(crate) const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Anything carrying a declared list of files
pub trait DeclaredFiles {
    fn declared_files(&self) -> Option<&[String]>;
    fn replace_files(&mut self, files: Vec<String>);
}

impl DeclaredFiles for TestRecord {
    fn declared_files(&self) -> Option<&[String]> {
        self.files.as_deref()
    }

    fn replace_files(&mut self, files: Vec<String>) {
        self.files = Some(files);
    }
}

impl DeclaredFiles for Repo {
    fn declared_files(&self) -> Option<&[String]> {
        self.files.as_deref()
    }

    fn replace_files(&mut self, files: Vec<String>) {
        self.files = Some(files);
    }
}

/// Expands a glob pattern under `base` into the files that exist there.
/// Brace groups (`{a,b}`) are expanded first; matches follow the order of the
/// alternatives and each file appears once.
pub fn glob_in(base: &Path, pattern: &str) -> ResolveResult<Vec<PathBuf>> {
    let base = Pattern::escape(&base.to_string_lossy());
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for alternative in expand_braces(pattern) {
        let full_pattern = format!("{base}/{alternative}");
        let paths = glob::glob_with(&full_pattern, MATCH_OPTIONS).map_err(|source| {
            ResolveError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;

        for entry in paths {
            match entry {
                Ok(path) => {
                    if seen.insert(path.clone()) {
                        files.push(path);
                    }
                }
                Err(error) => debug!("Skipping unreadable path while globbing: {error}"),
            }
        }
    }

    Ok(files)
}

/// `src/{a,b}.c` into `src/a.c` and `src/b.c`. Groups may nest; a `{` without
/// its closing `}` is kept literally.
fn expand_braces(pattern: &str) -> Vec<String> {
    let Some((open, close, alternatives)) = brace_group(pattern) else {
        return vec![pattern.to_string()];
    };

    let (prefix, suffix) = (&pattern[..open], &pattern[close + 1..]);
    alternatives
        .into_iter()
        .flat_map(|alternative| expand_braces(&format!("{prefix}{alternative}{suffix}")))
        .collect()
}

/// Byte offsets of the first top-level brace group and its alternatives
fn brace_group(pattern: &str) -> Option<(usize, usize, Vec<&str>)> {
    let mut depth = 0usize;
    let mut open = 0;
    let mut commas = Vec::new();
    let mut escaped = false;

    for (index, character) in pattern.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }

        match character {
            '\\' => escaped = true,
            '{' => {
                if depth == 0 {
                    open = index;
                    commas.clear();
                }
                depth += 1;
            }
            ',' if depth == 1 => commas.push(index),
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    let mut alternatives = Vec::with_capacity(commas.len() + 1);
                    let mut start = open + 1;
                    for &comma in &commas {
                        alternatives.push(&pattern[start..comma]);
                        start = comma + 1;
                    }
                    alternatives.push(&pattern[start..index]);
                    return Some((open, index, alternatives));
                }
            }
            _ => {}
        }
    }

    None
}

/// `path` relative to `base`, with `/` as separator
pub fn relative_path(base: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);

    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            Component::RootDir | Component::Prefix(_) | Component::CurDir => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub struct FilesResolver<'a> {
    base: &'a Path,
}

impl<'a> FilesResolver<'a> {
    pub fn new(base: &'a Path) -> Self {
        Self { base }
    }

    /// Replaces the declared files of `target` with the files they match.
    /// Does nothing when no files are declared.
    pub fn resolve<T: DeclaredFiles>(&self, target: &mut T) -> ResolveResult<()> {
        let Some(files) = target.declared_files() else {
            return Ok(());
        };

        let resolved = self.resolve_files(files)?;
        target.replace_files(resolved);
        Ok(())
    }

    /// Resolves every pattern, in order. A pattern without matches fails the
    /// whole resolution.
    pub fn resolve_files(&self, patterns: &[String]) -> ResolveResult<Vec<String>> {
        let mut resolved = Vec::new();

        for pattern in patterns {
            let pattern = force_relative(&translate(pattern));
            let matches = glob_in(self.base, &pattern)?;

            if matches.is_empty() {
                return Err(ResolveError::FileNotFound {
                    pattern,
                    base: self.base.to_path_buf(),
                });
            }

            debug!("{pattern} matched {} file(s)", matches.len());
            resolved.extend(matches.iter().map(|path| relative_path(self.base, path)));
        }

        Ok(resolved)
    }
}

pub struct ReposResolver<'a> {
    base: &'a Path,
}

impl<'a> ReposResolver<'a> {
    pub fn new(base: &'a Path) -> Self {
        Self { base }
    }

    /// Normalizes the path of every declared repo, checks that it exists and
    /// resolves its files inside it.
    pub fn resolve(&self, record: &mut TestRecord) -> ResolveResult<()> {
        let Some(repos) = record.repos.as_mut() else {
            return Ok(());
        };

        for repo in repos.iter_mut() {
            repo.path = translate(&repo.path);

            let declared = Path::new(&repo.path);
            let complete_path = self.base.join(declared);

            if !complete_path.exists() {
                return Err(ResolveError::RepoPathNotFound {
                    path: repo.path.clone(),
                    base: declared.is_relative().then(|| self.base.to_path_buf()),
                });
            }

            FilesResolver::new(&complete_path).resolve(repo)?;
        }

        Ok(())
    }
}

/// Windows separators to forward slashes
fn translate(path: &str) -> String {
    path.replace('\\', "/")
}

/// Declared paths are always relative to the base, even when written with a
/// leading separator.
fn force_relative(path: &str) -> String {
    path.strip_prefix('/').unwrap_or(path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(base: &Path, file: &str) {
        let path = base.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "content").unwrap();
    }

    fn record(files: Option<Vec<&str>>) -> TestRecord {
        TestRecord::proxy(
            "abcdef1",
            files.map(|files| files.into_iter().map(String::from).collect()),
        )
    }

    #[test]
    fn test_resolves_globs_in_order() {
        let directory = tempfile::tempdir().unwrap();
        touch(directory.path(), "test/b.yaml");
        touch(directory.path(), "test/a.yaml");
        touch(directory.path(), "test/nested/c.yaml");

        let resolved = FilesResolver::new(directory.path())
            .resolve_files(&["test/*.yaml".to_string()])
            .unwrap();

        assert_eq!(resolved, vec!["test/a.yaml", "test/b.yaml"]);
    }

    #[test]
    fn test_missing_files() {
        let directory = tempfile::tempdir().unwrap();
        touch(directory.path(), "src/main.cpp");

        let error = FilesResolver::new(directory.path())
            .resolve_files(&["src/main.cpp".to_string(), "test/*.yaml".to_string()])
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            format!(
                "Could not find any files matching test/*.yaml in {}",
                directory.path().display()
            )
        );
    }

    #[test]
    fn test_normalizes_declared_paths() {
        let directory = tempfile::tempdir().unwrap();
        touch(directory.path(), "src/boot/main.cpp");
        touch(directory.path(), "include/boot.h");

        let mut record = record(Some(vec![r"src\boot\main.cpp", "/include/boot.h"]));
        FilesResolver::new(directory.path())
            .resolve(&mut record)
            .unwrap();

        assert_eq!(
            record.files,
            Some(vec![
                "src/boot/main.cpp".to_string(),
                "include/boot.h".to_string()
            ])
        );
    }

    #[test]
    fn test_no_files_is_a_no_op() {
        let directory = tempfile::tempdir().unwrap();
        let mut record = record(None);

        FilesResolver::new(directory.path())
            .resolve(&mut record)
            .unwrap();
        assert_eq!(record.files, None);
    }

    #[test]
    fn test_hidden_files_need_explicit_names() {
        let directory = tempfile::tempdir().unwrap();
        touch(directory.path(), "config/.env");
        touch(directory.path(), "config/app.toml");

        let resolver = FilesResolver::new(directory.path());
        assert_eq!(
            resolver.resolve_files(&["config/*".to_string()]).unwrap(),
            vec!["config/app.toml"]
        );
        assert_eq!(
            resolver.resolve_files(&["config/.env".to_string()]).unwrap(),
            vec!["config/.env"]
        );
    }

    #[test]
    fn test_base_with_glob_characters() {
        let directory = tempfile::tempdir().unwrap();
        let base = directory.path().join("project [v2]");
        touch(&base, "src/main.cpp");

        let resolved = FilesResolver::new(&base)
            .resolve_files(&["src/*.cpp".to_string()])
            .unwrap();
        assert_eq!(resolved, vec!["src/main.cpp"]);
    }

    #[test]
    fn test_resolves_repos() {
        let directory = tempfile::tempdir().unwrap();
        touch(directory.path(), "libs/core/src/a.c");
        touch(directory.path(), "libs/core/src/b.c");

        let mut record = record(None);
        record.repos = Some(vec![Repo {
            path: r"libs\core".to_string(),
            sha1: "abcdef1".to_string(),
            files: Some(vec!["src/*.c".to_string()]),
        }]);

        ReposResolver::new(directory.path())
            .resolve(&mut record)
            .unwrap();

        let repo = &record.repos.unwrap()[0];
        assert_eq!(repo.path, "libs/core");
        assert_eq!(
            repo.files,
            Some(vec!["src/a.c".to_string(), "src/b.c".to_string()])
        );
    }

    #[test]
    fn test_missing_relative_repo() {
        let directory = tempfile::tempdir().unwrap();

        let mut record = record(None);
        record.repos = Some(vec![Repo {
            path: "libs/missing".to_string(),
            sha1: "abcdef1".to_string(),
            files: None,
        }]);

        let error = ReposResolver::new(directory.path())
            .resolve(&mut record)
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            format!(
                "Cannot find the repository path libs/missing inside {}",
                directory.path().display()
            )
        );
    }

    #[test]
    fn test_missing_absolute_repo() {
        let directory = tempfile::tempdir().unwrap();
        let missing = directory.path().join("elsewhere");
        let missing = missing.to_string_lossy().into_owned();

        let mut record = record(None);
        record.repos = Some(vec![Repo {
            path: missing.clone(),
            sha1: "abcdef1".to_string(),
            files: None,
        }]);

        let error = ReposResolver::new(Path::new("/workspace"))
            .resolve(&mut record)
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            format!("Cannot find the repository path {missing}")
        );
    }

    #[test]
    fn test_expand_braces() {
        assert_eq!(expand_braces("src/{a,b}.cpp"), vec!["src/a.cpp", "src/b.cpp"]);
        assert_eq!(
            expand_braces("{src,include}/*.{c,h}"),
            vec!["src/*.c", "src/*.h", "include/*.c", "include/*.h"]
        );
        assert_eq!(
            expand_braces("lib/{core,net/{tcp,udp}}.rs"),
            vec!["lib/core.rs", "lib/net/tcp.rs", "lib/net/udp.rs"]
        );
        assert_eq!(expand_braces("src/{a}.cpp"), vec!["src/a.cpp"]);
        assert_eq!(expand_braces("src/{a,b.cpp"), vec!["src/{a,b.cpp"]);
        assert_eq!(expand_braces("src/*.cpp"), vec!["src/*.cpp"]);
    }

    #[test]
    fn test_resolves_brace_patterns() {
        let directory = tempfile::tempdir().unwrap();
        touch(directory.path(), "src/a.cpp");
        touch(directory.path(), "src/b.cpp");
        touch(directory.path(), "src/c.cpp");

        let resolver = FilesResolver::new(directory.path());
        assert_eq!(
            resolver
                .resolve_files(&["src/{b,a}.cpp".to_string()])
                .unwrap(),
            vec!["src/b.cpp", "src/a.cpp"]
        );
        assert_eq!(
            resolver
                .resolve_files(&["src/{a,*}.cpp".to_string()])
                .unwrap(),
            vec!["src/a.cpp", "src/b.cpp", "src/c.cpp"]
        );
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/workspace"), Path::new("/workspace/src/a.c")),
            "src/a.c"
        );
        assert_eq!(
            relative_path(Path::new("/workspace"), Path::new("other/b.c")),
            "other/b.c"
        );
    }
}
