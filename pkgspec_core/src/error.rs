/*============================================================
  PkgSpec Project: pkgspec
  Module: pkgspec_core::error
  ------------------------------------------------------------
  Purpose:
    Centralise PkgSpec error types so every conversion failure
    carries consistent diagnostics and exit semantics.

  Security / Safety Notes:
    Diagnostics echo interpreter output and dump text verbatim;
    descriptors are operator-supplied, so nothing is redacted.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Used across modules to propagate fatal conversion failures
    and consolidate exit codes for the binary entry point.

  Revision History:
    2025-02-11 RKM  Established shared error definitions.
  ------------------------------------------------------------
  Principles Observed:
    - Explicit error taxonomy with actionable context
    - No silent failure paths
    - Stable exit codes for pipeline tooling
============================================================*/

use std::process::ExitCode;

use thiserror::Error;

/// Result alias for PkgSpec operations.
pub type Result<T> = std::result::Result<T, PkgspecError>;

/// Enumerates the failure domains of a single conversion run.
#[derive(Debug, Error)]
pub enum PkgspecError {
    #[error("Required command `{command}` not found in PATH")]
    CommandMissing { command: String },
    #[error("Shell extraction failed: {0}")]
    Extraction(String),
    #[error("Can't parse line `{line}` of environment dump:\n{dump}")]
    DumpParse { line: String, dump: String },
    #[error("Name mapping {path}: {reason}")]
    MappingLoad { path: String, reason: String },
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Serialization: {0}")]
    Serialization(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error("Runtime: {0}")]
    Runtime(String),
}

impl PkgspecError {
    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }

    /// Numeric status behind [`PkgspecError::exit_code`].
    pub fn exit_status(&self) -> u8 {
        match self {
            PkgspecError::CommandMissing { .. } => 10,
            PkgspecError::Extraction(_) => 11,
            PkgspecError::DumpParse { .. } => 12,
            PkgspecError::Config(_) => 20,
            PkgspecError::MappingLoad { .. } => 21,
            PkgspecError::Serialization(_) => 31,
            PkgspecError::Filesystem(_) => 40,
            PkgspecError::Runtime(_) => 50,
        }
    }
}
