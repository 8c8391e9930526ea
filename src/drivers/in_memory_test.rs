use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{ConnectionFailure, ExecuteFailure, QueryFailure};
use crate::traits::{DatabaseConnection, DatabaseDriver};
use crate::types::{RawQueryResult, SqlValue};

/// A recorded query or statement for verification.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Something that happened to a connection handle, tagged with the
/// handle's number (handles are numbered from 0 in creation order).
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Start(usize),
    Stop(usize),
    Query(usize, RecordedQuery),
    Exec(usize, RecordedQuery),
}

#[derive(Default)]
struct State {
    responses: VecDeque<RawQueryResult>,
    default_response: RawQueryResult,
    start_failure: Option<String>,
    query_failure: Option<String>,
    exec_failure: Option<String>,
    events: Vec<ConnectionEvent>,
    next_connection: usize,
}

/// An in-memory database driver for testing.
///
/// Hands out connection handles that share one event log, so tests can
/// check both what was run and how each handle was opened and closed.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use dbfetcher::drivers::{InMemoryTestDriver, InMemoryTestResponseBuilder};
///
/// let driver = Arc::new(
///     InMemoryTestDriver::new().with_response(
///         InMemoryTestResponseBuilder::new()
///             .columns(&["id", "name"])
///             .row(&["1", "Alice"])
///             .build(),
///     ),
/// );
/// assert!(driver.events().is_empty());
/// ```
pub struct InMemoryTestDriver {
    state: Arc<Mutex<State>>,
}

impl InMemoryTestDriver {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Add a response to be returned by the next query.
    /// Responses are returned in FIFO order.
    pub fn with_response(self, response: RawQueryResult) -> Self {
        self.state.lock().unwrap().responses.push_back(response);
        self
    }

    /// Set a default response to use when no queued responses remain.
    pub fn with_default_response(self, response: RawQueryResult) -> Self {
        self.state.lock().unwrap().default_response = response;
        self
    }

    /// Make every `start` fail with `message`.
    pub fn with_start_failure(self, message: &str) -> Self {
        self.state.lock().unwrap().start_failure = Some(message.to_string());
        self
    }

    /// Make every `query` fail with `message`.
    pub fn with_query_failure(self, message: &str) -> Self {
        self.state.lock().unwrap().query_failure = Some(message.to_string());
        self
    }

    /// Make every `exec` fail with `message`.
    pub fn with_exec_failure(self, message: &str) -> Self {
        self.state.lock().unwrap().exec_failure = Some(message.to_string());
        self
    }

    /// All lifecycle events so far, in order.
    pub fn events(&self) -> Vec<ConnectionEvent> {
        self.state.lock().unwrap().events.clone()
    }

    /// Number of handles given out.
    pub fn connection_count(&self) -> usize {
        self.state.lock().unwrap().next_connection
    }

    pub fn start_count(&self) -> usize {
        self.count(|e| matches!(e, ConnectionEvent::Start(_)))
    }

    pub fn stop_count(&self) -> usize {
        self.count(|e| matches!(e, ConnectionEvent::Stop(_)))
    }

    /// Queries and statements run so far, in order.
    pub fn recorded_queries(&self) -> Vec<RecordedQuery> {
        self.state
            .lock()
            .unwrap()
            .events
            .iter()
            .filter_map(|e| match e {
                ConnectionEvent::Query(_, q) | ConnectionEvent::Exec(_, q) => Some(q.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_query(&self) -> Option<RecordedQuery> {
        self.recorded_queries().pop()
    }

    /// Assert that the last query matches the expected SQL and parameters.
    pub fn assert_last_query(&self, expected_sql: &str, expected_params: &[SqlValue]) {
        let last = self.last_query().expect("No queries were recorded");
        assert_eq!(
            last.sql, expected_sql,
            "SQL mismatch.\nExpected: {}\nActual: {}",
            expected_sql, last.sql
        );
        assert_eq!(
            last.params, expected_params,
            "Parameters mismatch.\nExpected: {:?}\nActual: {:?}",
            expected_params, last.params
        );
    }

    /// Assert that exactly n queries or statements were run.
    pub fn assert_query_count(&self, expected: usize) {
        let actual = self.recorded_queries().len();
        assert_eq!(
            actual, expected,
            "Query count mismatch. Expected: {}, Actual: {}",
            expected, actual
        );
    }

    /// Assert that `expected` handles were used and that each one was
    /// started once and stopped once, with the stop coming last.
    pub fn assert_started_and_stopped(&self, expected: usize) {
        let events = self.events();
        assert_eq!(
            self.connection_count(),
            expected,
            "Connection count mismatch. Events: {:?}",
            events
        );
        for id in 0..expected {
            let own: Vec<&ConnectionEvent> = events
                .iter()
                .filter(|e| match e {
                    ConnectionEvent::Start(c)
                    | ConnectionEvent::Stop(c)
                    | ConnectionEvent::Query(c, _)
                    | ConnectionEvent::Exec(c, _) => *c == id,
                })
                .collect();
            let starts = own.iter().filter(|e| matches!(e, ConnectionEvent::Start(_))).count();
            let stops = own.iter().filter(|e| matches!(e, ConnectionEvent::Stop(_))).count();
            assert_eq!(starts, 1, "Connection {} started {} times", id, starts);
            assert_eq!(stops, 1, "Connection {} stopped {} times", id, stops);
            assert!(
                matches!(own.last(), Some(ConnectionEvent::Stop(_))),
                "Connection {} was used after stop: {:?}",
                id,
                own
            );
        }
    }

    fn count(&self, f: impl Fn(&ConnectionEvent) -> bool) -> usize {
        self.state.lock().unwrap().events.iter().filter(|e| f(e)).count()
    }
}

impl Default for InMemoryTestDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseDriver for InMemoryTestDriver {
    fn connection(&self) -> Box<dyn DatabaseConnection> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_connection;
        state.next_connection += 1;
        Box::new(InMemoryTestConnection {
            state: Arc::clone(&self.state),
            id,
            started: false,
        })
    }
}

struct InMemoryTestConnection {
    state: Arc<Mutex<State>>,
    id: usize,
    started: bool,
}

#[async_trait]
impl DatabaseConnection for InMemoryTestConnection {
    async fn start(&mut self) -> Result<(), ConnectionFailure> {
        let mut state = self.state.lock().unwrap();
        state.events.push(ConnectionEvent::Start(self.id));
        if let Some(message) = state.start_failure.clone() {
            return Err(ConnectionFailure(message));
        }
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.started = false;
        self.state
            .lock()
            .unwrap()
            .events
            .push(ConnectionEvent::Stop(self.id));
    }

    async fn query(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<RawQueryResult, QueryFailure> {
        if !self.started {
            return Err(QueryFailure("connection not started".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        state.events.push(ConnectionEvent::Query(
            self.id,
            RecordedQuery {
                sql: sql.to_string(),
                params: params.to_vec(),
            },
        ));
        if let Some(message) = state.query_failure.clone() {
            return Err(QueryFailure(message));
        }

        // Return next queued response or default
        let response = match state.responses.pop_front() {
            Some(response) => response,
            None => state.default_response.clone(),
        };
        Ok(response)
    }

    async fn exec(&mut self, sql: &str, params: &[SqlValue]) -> Result<(), ExecuteFailure> {
        if !self.started {
            return Err(ExecuteFailure("connection not started".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        state.events.push(ConnectionEvent::Exec(
            self.id,
            RecordedQuery {
                sql: sql.to_string(),
                params: params.to_vec(),
            },
        ));
        match state.exec_failure.clone() {
            Some(message) => Err(ExecuteFailure(message)),
            None => Ok(()),
        }
    }
}

/// Builder for creating test responses easily.
pub struct InMemoryTestResponseBuilder {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl InMemoryTestResponseBuilder {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Set the column names for the response.
    pub fn columns(mut self, cols: &[&str]) -> Self {
        self.columns = cols.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Add a row of non-null values.
    pub fn row(mut self, values: &[&str]) -> Self {
        self.rows
            .push(values.iter().map(|s| Some(s.to_string())).collect());
        self
    }

    /// Add a row where `None` stands for NULL.
    pub fn nullable_row(mut self, values: &[Option<&str>]) -> Self {
        self.rows
            .push(values.iter().map(|v| v.map(str::to_string)).collect());
        self
    }

    pub fn build(self) -> RawQueryResult {
        RawQueryResult::new(self.columns, self.rows)
    }
}

impl Default for InMemoryTestResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
