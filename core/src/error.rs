use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Malformed input (row {row_id:?}): field '{field}' {reason}")]
    MalformedInput {
        row_id: Option<i64>,
        field:  &'static str,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MetricsError {
    pub fn malformed(row_id: Option<i64>, field: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedInput { row_id, field, reason: reason.into() }
    }

    /// True for errors caused by the shape of a single input row.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::MalformedInput { .. })
    }
}

pub type MetricsResult<T> = Result<T, MetricsError>;
