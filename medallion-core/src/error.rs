// medallion-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MedallionError {
    // --- DOMAIN ERRORS (cleaning contract, KPI catalog) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (IO, codecs, stores) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- PIPELINE ERRORS ---
    /// A raw artifact could not be parsed. Fatal for that entity.
    #[error("Source parse error in '{object}': {source}")]
    SourceParse {
        object: String,
        #[source]
        source: InfrastructureError,
    },

    /// A table sync stopped before reaching `done`.
    #[error("Sync of '{table}' failed while {phase}: {reason}")]
    Sync {
        table: String,
        phase: String,
        reason: String,
    },

    #[error("Internal Error: {0}")]
    InternalError(String),

    #[error("Unsafe path traversal detected: {0}")]
    UnsafePath(String),
}

impl From<std::io::Error> for MedallionError {
    fn from(err: std::io::Error) -> Self {
        MedallionError::Infrastructure(InfrastructureError::Io(err))
    }
}
