//! Error definitions for ccviz.
//!
//! These errors never leave a pipeline run: the runner turns each one into a
//! diagnostic for the stage it happened in. They do surface from
//! configuration parsing and from the binary's startup.

use std::path::PathBuf;

use thiserror::Error;

/// Main `Result` type for the library.
pub type VizResult<T> = Result<T, VizError>;

/// All errors produced by ccviz.
#[derive(Error, Debug)]
pub enum VizError {
    #[error("failed to create temporary workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("failed to write source file '{}': {source}", path.display())]
    WriteSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read artifact '{}': {source}", path.display())]
    ReadArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Command not found: {program} ({source})")]
    CommandNotFound {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("empty tool command")]
    EmptyCommand,

    #[error("unknown optimization level '{0}' (expected O0, O1, O2, O3, Os or Oz)")]
    InvalidOptLevel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
