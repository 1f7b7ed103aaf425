//! Errors raised while validating, materializing and submitting a job graph
//!
//! Every variant is fatal for the node being processed. Nothing is retried and nothing is rolled
//! back: jobs already accepted by the scheduler stay submitted.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DagError {
    /// The graph breaks a structural invariant (root count, orphaned parent reference, duplicate
    /// id, unreachable node)
    #[error("The workflow graph is invalid: {0}")]
    InvalidWorkflow(String),

    /// Mismatched dependency arguments or an unknown start condition, raised before any scheduler
    /// process is spawned
    #[error("Invalid submission configuration: {0}")]
    Configuration(String),

    #[error("Can't write job script {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The scheduler process failed, or its output didn't contain a job id
    #[error("Job submission failed: {0}")]
    Submission(String),

    /// A workflow request file couldn't be read, failed schema validation, or didn't deserialise
    #[error("Invalid workflow request: {0}")]
    Request(String),

    #[error("Submission ledger error: {0}")]
    Ledger(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DagError>;

impl DagError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DagError::Io { path: path.into(), source }
    }
}
