use crate::clauses::WhereClause;
use crate::error::{FetcherError, Result};

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_sql(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Statement {
    Select(Vec<String>),
    Insert(Vec<String>),
    Update(Vec<String>),
    Delete,
}

/// A query over one table, rendered to SQL text by `build`.
///
/// Builders are plain values: every method consumes and returns the
/// builder, and cloning gives an independent copy.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
    table: String,
    alias: String,
    statement: Statement,
    where_clause: Option<WhereClause>,
    order_by: Vec<(String, Order)>,
    limit: Option<u64>,
}

impl QueryBuilder {
    /// A `SELECT *` over `table`, without alias.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: String::new(),
            statement: Statement::Select(Vec::new()),
            where_clause: None,
            order_by: Vec::new(),
            limit: None,
        }
    }

    /// Returns a copy of this builder under `alias`. An empty alias removes it.
    pub fn aliased(&self, alias: &str) -> Self {
        Self {
            alias: alias.to_string(),
            ..self.clone()
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The table reference as it appears after FROM: `users` or `users as u`.
    pub fn table_ref(&self) -> String {
        if self.alias.is_empty() {
            self.table.clone()
        } else {
            format!("{} as {}", self.table, self.alias)
        }
    }

    /// Select the given columns. No columns means `*`.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.statement = Statement::Select(to_owned(columns));
        self
    }

    /// Turn this into `INSERT INTO ... (columns) VALUES ($1, ...)`.
    /// `build` rejects an empty column list.
    pub fn insert(mut self, columns: &[&str]) -> Self {
        self.statement = Statement::Insert(to_owned(columns));
        self
    }

    /// Turn this into `UPDATE ... SET column = $n, ...`.
    /// `build` rejects an empty column list.
    pub fn update(mut self, columns: &[&str]) -> Self {
        self.statement = Statement::Update(to_owned(columns));
        self
    }

    pub fn delete(mut self) -> Self {
        self.statement = Statement::Delete;
        self
    }

    /// Add a WHERE clause. Ignored by INSERT.
    pub fn where_(mut self, clause: WhereClause) -> Self {
        self.where_clause = Some(clause);
        self
    }

    /// Append an ORDER BY term. Only SELECT renders it.
    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order_by.push((column.into(), order));
        self
    }

    /// Add a LIMIT. Only SELECT renders it.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Render the SQL text.
    ///
    /// Fails with [`FetcherError::InvalidQuery`] for an INSERT or UPDATE
    /// without columns.
    pub fn build(&self) -> Result<String> {
        let mut sql = String::with_capacity(128);
        let mut placeholder = 0;

        match &self.statement {
            Statement::Select(columns) => {
                sql.push_str("SELECT ");
                if columns.is_empty() {
                    sql.push('*');
                } else {
                    sql.push_str(&columns.join(", "));
                }
                sql.push_str(" FROM ");
                sql.push_str(&self.table_ref());
                self.push_where(&mut sql, &mut placeholder);

                if !self.order_by.is_empty() {
                    let terms: Vec<String> = self
                        .order_by
                        .iter()
                        .map(|(col, order)| format!("{} {}", col, order.as_sql()))
                        .collect();
                    sql.push_str(" ORDER BY ");
                    sql.push_str(&terms.join(", "));
                }

                if let Some(limit) = self.limit {
                    sql.push_str(" LIMIT ");
                    sql.push_str(&limit.to_string());
                }
            }
            Statement::Insert(columns) => {
                self.require_columns("INSERT", columns)?;
                let values: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();
                sql.push_str("INSERT INTO ");
                sql.push_str(&self.table_ref());
                sql.push_str(&format!(
                    " ({}) VALUES ({})",
                    columns.join(", "),
                    values.join(", ")
                ));
            }
            Statement::Update(columns) => {
                self.require_columns("UPDATE", columns)?;
                sql.push_str("UPDATE ");
                sql.push_str(&self.table_ref());
                sql.push_str(" SET ");
                let assignments: Vec<String> = columns
                    .iter()
                    .map(|col| {
                        placeholder += 1;
                        format!("{} = ${}", col, placeholder)
                    })
                    .collect();
                sql.push_str(&assignments.join(", "));
                self.push_where(&mut sql, &mut placeholder);
            }
            Statement::Delete => {
                sql.push_str("DELETE FROM ");
                sql.push_str(&self.table_ref());
                self.push_where(&mut sql, &mut placeholder);
            }
        }

        Ok(sql)
    }

    fn require_columns(&self, statement: &str, columns: &[String]) -> Result<()> {
        if columns.is_empty() {
            return Err(FetcherError::InvalidQuery(format!(
                "{} on {} needs at least one column",
                statement, self.table
            )));
        }
        Ok(())
    }

    fn push_where(&self, sql: &mut String, placeholder: &mut usize) {
        if let Some(ref where_clause) = self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause.build_sql(placeholder));
        }
    }
}

fn to_owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

/// What a query is created from: a bare table name or an existing builder.
#[derive(Debug, Clone, PartialEq)]
pub enum QuerySource {
    Table(String),
    Builder(QueryBuilder),
}

impl QuerySource {
    /// Resolve into a builder carrying `alias`.
    ///
    /// A table becomes `<table>` or `<table> as <alias>`; an empty alias
    /// counts as none. A builder is copied and re-aliased, with `None`
    /// giving the empty alias.
    pub fn into_builder(self, alias: Option<&str>) -> QueryBuilder {
        let alias = alias.unwrap_or_default();
        match self {
            QuerySource::Table(table) => QueryBuilder::new(table).aliased(alias),
            QuerySource::Builder(builder) => builder.aliased(alias),
        }
    }
}

impl From<&str> for QuerySource {
    fn from(table: &str) -> Self {
        QuerySource::Table(table.to_string())
    }
}

impl From<String> for QuerySource {
    fn from(table: String) -> Self {
        QuerySource::Table(table)
    }
}

impl From<QueryBuilder> for QuerySource {
    fn from(builder: QueryBuilder) -> Self {
        QuerySource::Builder(builder)
    }
}

impl From<&QueryBuilder> for QuerySource {
    fn from(builder: &QueryBuilder) -> Self {
        QuerySource::Builder(builder.clone())
    }
}
