mod in_memory_test;
mod tokio_postgres;

pub use self::in_memory_test::{
    ConnectionEvent, InMemoryTestDriver, InMemoryTestResponseBuilder, RecordedQuery,
};
pub use self::tokio_postgres::{TokioPostgresConnection, TokioPostgresDriver};
