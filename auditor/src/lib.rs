pub mod audit;
pub mod config;
pub mod explorer;
pub mod export;
pub mod repository;
pub mod resolver;
pub mod validator;
pub mod verifier;
pub mod verifiers;

#[cfg(test)]
mod test_support;

pub use audit::{check, AuditError, AuditReport, AuditResult, CheckOptions};
pub use config::{AuditConfig, ConfigError, ConfigResult, GlobPatterns, DEFAULT_CONFIG_FILE};
pub use explorer::{Explorer, ExplorerError, ExplorerResult};
pub use export::{ExportError, ExportFormat, ExportResult, Exporter, IdGenerator, JsonExporter};
pub use repository::{
    shorten_sha1, Branch, Commit, Diff, FileStat, GitRepository, MultiRepository,
    RepositoryError, RepositoryHandle, RepositoryResult,
};
pub use resolver::{FilesResolver, ReposResolver, ResolveError, ResolveResult};
pub use validator::{LoadError, ValidationFailure, ValidationOutcome, Validator};
pub use verifier::{Verifier, VerifierError, VerifierResult};
pub use verifiers::TestRecordVerifier;
