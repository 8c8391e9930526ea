use thiserror::Error;

/// Error type for fetcher operations
#[derive(Debug, Error)]
pub enum FetcherError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Execute failed: {0}")]
    Execute(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Expected {expected} row(s), got {actual}")]
    UnexpectedRowCount { expected: usize, actual: usize },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),
}

/// Result type alias for fetcher operations
pub type Result<T> = std::result::Result<T, FetcherError>;

/// Raised by a connection that could not be started.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct ConnectionFailure(pub String);

/// Raised by a started connection when a read query fails.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct QueryFailure(pub String);

/// Raised by a started connection when a statement fails.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct ExecuteFailure(pub String);

impl From<ConnectionFailure> for FetcherError {
    fn from(failure: ConnectionFailure) -> Self {
        FetcherError::Connection(failure.0)
    }
}

impl From<QueryFailure> for FetcherError {
    fn from(failure: QueryFailure) -> Self {
        FetcherError::Query(failure.0)
    }
}

impl From<ExecuteFailure> for FetcherError {
    fn from(failure: ExecuteFailure) -> Self {
        FetcherError::Execute(failure.0)
    }
}
