// medallion-core/src/infrastructure/error.rs

use datafusion::arrow::error::ArrowError;
use datafusion::error::DataFusionError;
use datafusion::parquet::errors::ParquetError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(medallion::infra::database::duckdb),
        help("An error occurred inside the serving store.")
    )]
    DuckDB(#[from] duckdb::Error),

    #[error("DataFusion Engine Error: {0}")]
    #[diagnostic(code(medallion::infra::database::datafusion))]
    DataFusion(#[from] DataFusionError),
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE (Abstracted) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(medallion::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- OBJECT STORAGE ---
    #[error("Object '{key}' not found in bucket '{bucket}'")]
    #[diagnostic(code(medallion::infra::object_not_found))]
    ObjectNotFound { bucket: String, key: String },

    #[error("Bucket '{0}' does not exist")]
    #[diagnostic(code(medallion::infra::bucket_not_found))]
    BucketNotFound(String),

    #[error("Invalid object key or collection name: {0}")]
    #[diagnostic(code(medallion::infra::invalid_key))]
    InvalidKey(String),

    // --- CODECS ---
    #[error("Arrow Error: {0}")]
    #[diagnostic(
        code(medallion::infra::arrow),
        help("The artifact does not match the expected tabular layout.")
    )]
    Arrow(#[from] ArrowError),

    #[error("Parquet Error: {0}")]
    #[diagnostic(code(medallion::infra::parquet))]
    Parquet(#[from] ParquetError),

    #[error("Codec Error: {0}")]
    #[diagnostic(code(medallion::infra::codec))]
    Codec(String),

    #[error("JSON Error: {0}")]
    #[diagnostic(code(medallion::infra::json))]
    Json(#[from] serde_json::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(medallion::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(medallion::infra::config_invalid))]
    Validation(#[from] validator::ValidationErrors),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(code(medallion::infra::config_missing))]
    ConfigNotFound(String),
}

// Shortcuts for `?` on engine calls
impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}

impl From<DataFusionError> for InfrastructureError {
    fn from(err: DataFusionError) -> Self {
        InfrastructureError::Database(DatabaseError::DataFusion(err))
    }
}
