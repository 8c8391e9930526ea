use async_trait::async_trait;

use crate::error::{ConnectionFailure, ExecuteFailure, QueryFailure};
use crate::types::{RawQueryResult, SqlValue};

/// Source of connection handles.
///
/// Every call to `connection` must return a fresh, not yet started handle.
/// Concurrent operations on one fetcher each get their own handle, so any
/// pooling belongs behind this trait.
pub trait DatabaseDriver: Send + Sync {
    fn connection(&self) -> Box<dyn DatabaseConnection>;
}

/// A single database session, owned by one fetcher operation.
#[async_trait]
pub trait DatabaseConnection: Send {
    /// Open the session.
    async fn start(&mut self) -> Result<(), ConnectionFailure>;

    /// Close the session. Must not fail and must be safe to call on a
    /// handle whose `start` failed or was never called.
    fn stop(&mut self);

    /// Run a read query. Parameters use PostgreSQL-style placeholders ($1, $2, etc.)
    async fn query(&mut self, sql: &str, params: &[SqlValue])
        -> Result<RawQueryResult, QueryFailure>;

    /// Run a statement that produces no result set.
    async fn exec(&mut self, sql: &str, params: &[SqlValue]) -> Result<(), ExecuteFailure>;
}
