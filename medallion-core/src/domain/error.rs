// medallion-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Column '{column}' is missing from the {entity} source")]
    #[diagnostic(
        code(medallion::domain::missing_column),
        help("The raw export header must contain every column of the entity schema.")
    )]
    MissingColumn { entity: String, column: String },

    #[error("Unknown KPI table '{0}'")]
    #[diagnostic(
        code(medallion::domain::unknown_table),
        help("Run `medallion show --help` to list the KPI table names.")
    )]
    UnknownTable(String),

    #[error("Invalid period: {0}")]
    #[diagnostic(code(medallion::domain::period))]
    InvalidPeriod(String),

    #[error("Schema Error: {0}")]
    #[diagnostic(code(medallion::domain::schema))]
    SchemaError(String),
}
