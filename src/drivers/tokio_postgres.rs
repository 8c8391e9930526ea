use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::types::{FromSql, ToSql, Type};
use tokio_postgres::{Client, Config, NoTls};
use tracing::{debug, error, warn};

use crate::error::{ConnectionFailure, ExecuteFailure, FetcherError, QueryFailure, Result};
use crate::traits::{DatabaseConnection, DatabaseDriver};
use crate::types::{RawQueryResult, SqlValue};

/// PostgreSQL driver implementation using tokio-postgres.
///
/// The driver only holds the parsed configuration; sessions are opened by
/// the handles it gives out.
#[derive(Debug, Clone)]
pub struct TokioPostgresDriver {
    config: Config,
}

impl TokioPostgresDriver {
    /// Parse a libpq-style or `postgres://` connection string.
    /// No connection is attempted here.
    pub fn new(connection_string: &str) -> Result<Self> {
        let config = connection_string
            .parse::<Config>()
            .map_err(|e| FetcherError::Configuration(e.to_string()))?;
        Ok(Self { config })
    }

    pub fn from_config(config: Config) -> Self {
        Self { config }
    }
}

impl DatabaseDriver for TokioPostgresDriver {
    fn connection(&self) -> Box<dyn DatabaseConnection> {
        Box::new(TokioPostgresConnection {
            config: self.config.clone(),
            client: None,
            task: None,
        })
    }
}

/// One tokio-postgres session.
pub struct TokioPostgresConnection {
    config: Config,
    client: Option<Client>,
    task: Option<JoinHandle<()>>,
}

impl TokioPostgresConnection {
    fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }
}

#[async_trait]
impl DatabaseConnection for TokioPostgresConnection {
    async fn start(&mut self) -> std::result::Result<(), ConnectionFailure> {
        let (client, connection) = self
            .config
            .connect(NoTls)
            .await
            .map_err(|e| ConnectionFailure(e.to_string()))?;

        // The connection object drives the socket; it resolves once the client is dropped.
        self.task = Some(tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgreSQL connection error");
            }
        }));
        self.client = Some(client);
        Ok(())
    }

    fn stop(&mut self) {
        if self.client.take().is_some() {
            debug!("closing PostgreSQL session");
        }
        // Detach; the task ends on its own after the client is gone.
        self.task.take();
    }

    async fn query(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> std::result::Result<RawQueryResult, QueryFailure> {
        let client = self
            .client()
            .ok_or_else(|| QueryFailure("connection not started".to_string()))?;

        let converted_params = convert_params(params);
        let param_refs = param_refs(&converted_params);

        let statement = client
            .prepare(sql)
            .await
            .map_err(|e| QueryFailure(e.to_string()))?;

        // Taken from the statement so that an empty result still has its columns.
        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        for (index, col) in statement.columns().iter().enumerate() {
            if !is_supported(col.type_()) {
                return Err(unsupported_column(index, col.name(), col.type_()));
            }
        }

        let rows = client
            .query(&statement, &param_refs)
            .await
            .map_err(|e| QueryFailure(e.to_string()))?;

        let mut result_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            let values = row
                .columns()
                .iter()
                .enumerate()
                .map(|(i, col)| row_value_to_string(row, i, col.type_()))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            result_rows.push(values);
        }

        Ok(RawQueryResult::new(columns, result_rows))
    }

    async fn exec(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> std::result::Result<(), ExecuteFailure> {
        let client = self
            .client()
            .ok_or_else(|| ExecuteFailure("connection not started".to_string()))?;

        let converted_params = convert_params(params);
        let param_refs = param_refs(&converted_params);

        let affected = client
            .execute(sql, &param_refs)
            .await
            .map_err(|e| ExecuteFailure(e.to_string()))?;
        debug!(affected, "statement executed");
        Ok(())
    }
}

fn convert_params(params: &[SqlValue]) -> Vec<Box<dyn ToSql + Sync + Send>> {
    params.iter().map(sql_value_to_tosql).collect()
}

fn param_refs(converted: &[Box<dyn ToSql + Sync + Send>]) -> Vec<&(dyn ToSql + Sync)> {
    converted
        .iter()
        .map(|b| b.as_ref() as &(dyn ToSql + Sync))
        .collect()
}

/// Convert a SqlValue to a boxed ToSql trait object.
fn sql_value_to_tosql(value: &SqlValue) -> Box<dyn ToSql + Sync + Send> {
    match value {
        SqlValue::Null => Box::new(None::<String>),
        SqlValue::Text(s) => Box::new(s.clone()),
        SqlValue::Int32(i) => Box::new(*i),
        SqlValue::Int64(i) => Box::new(*i),
        SqlValue::Float64(f) => Box::new(*f),
        SqlValue::Bool(b) => Box::new(*b),
    }
}

/// Whether `row_value_to_string` can render values of this type.
fn is_supported(type_: &Type) -> bool {
    [
        Type::BOOL,
        Type::INT2,
        Type::INT4,
        Type::INT8,
        Type::FLOAT4,
        Type::FLOAT8,
    ]
    .contains(type_)
        || <String as FromSql>::accepts(type_)
}

fn unsupported_column(index: usize, name: &str, type_: &Type) -> QueryFailure {
    QueryFailure(format!(
        "column {} ({}): unsupported type {}; cast it to text in the query",
        index, name, type_
    ))
}

/// Render the value at `index` as text, `None` for NULL.
///
/// Only types accepted by `is_supported` are rendered. Anything else fails
/// the query rather than coming back as NULL.
fn row_value_to_string(
    row: &tokio_postgres::Row,
    index: usize,
    type_: &Type,
) -> std::result::Result<Option<String>, QueryFailure> {
    let value = if *type_ == Type::BOOL {
        row.try_get::<_, Option<bool>>(index)
            .map(|v| v.map(|b| b.to_string()))
    } else if *type_ == Type::INT2 {
        row.try_get::<_, Option<i16>>(index)
            .map(|v| v.map(|i| i.to_string()))
    } else if *type_ == Type::INT4 {
        row.try_get::<_, Option<i32>>(index)
            .map(|v| v.map(|i| i.to_string()))
    } else if *type_ == Type::INT8 {
        row.try_get::<_, Option<i64>>(index)
            .map(|v| v.map(|i| i.to_string()))
    } else if *type_ == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(index)
            .map(|v| v.map(|f| f.to_string()))
    } else if *type_ == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(index)
            .map(|v| v.map(|f| f.to_string()))
    } else {
        row.try_get::<_, Option<String>>(index)
    };

    value.map_err(|e| {
        warn!(column = index, %type_, error = %e, "could not decode column");
        QueryFailure(format!("column {}: {}", index, e))
    })
}
