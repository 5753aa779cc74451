use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A required column is absent from a source table.
    #[error("table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },
    #[error("column name for table '{table}' is empty")]
    EmptyColumnName { table: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
