use thiserror::Error;

/// Failure classification at the pipeline boundaries. The concrete service
/// impls wrap their client/sqlx errors into these so a log line or a
/// downcast tells which collaborator failed.
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("Event source error: {0}")]
    Source(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),
}
