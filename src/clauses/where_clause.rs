/// A WHERE condition.
///
/// Conditions render placeholders only; the bound values travel separately
/// in the parameter set handed to the fetcher.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereClause {
    /// column <op> $n
    Compare(String, &'static str),
    /// column IS NULL
    IsNull(String),
    /// Verbatim SQL fragment, placeholders included
    Raw(String),
    /// clause AND clause
    And(Box<WhereClause>, Box<WhereClause>),
    /// clause OR clause
    Or(Box<WhereClause>, Box<WhereClause>),
}

impl WhereClause {
    /// column = $n
    pub fn eq(column: impl Into<String>) -> Self {
        WhereClause::Compare(column.into(), "=")
    }

    /// column <> $n
    pub fn ne(column: impl Into<String>) -> Self {
        WhereClause::Compare(column.into(), "<>")
    }

    /// column < $n
    pub fn lt(column: impl Into<String>) -> Self {
        WhereClause::Compare(column.into(), "<")
    }

    /// column > $n
    pub fn gt(column: impl Into<String>) -> Self {
        WhereClause::Compare(column.into(), ">")
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        WhereClause::IsNull(column.into())
    }

    /// A hand-written condition. Its placeholders are not renumbered.
    pub fn raw(sql: impl Into<String>) -> Self {
        WhereClause::Raw(sql.into())
    }

    /// Combines this clause with another using AND
    pub fn and(self, other: WhereClause) -> Self {
        WhereClause::And(Box::new(self), Box::new(other))
    }

    /// Combines this clause with another using OR
    pub fn or(self, other: WhereClause) -> Self {
        WhereClause::Or(Box::new(self), Box::new(other))
    }

    /// Renders the condition. `placeholder` is the last placeholder number
    /// already used and is advanced for every placeholder emitted.
    pub fn build_sql(&self, placeholder: &mut usize) -> String {
        match self {
            WhereClause::Compare(col, op) => {
                *placeholder += 1;
                format!("{} {} ${}", col, op, placeholder)
            }
            WhereClause::IsNull(col) => format!("{} IS NULL", col),
            WhereClause::Raw(sql) => sql.clone(),
            WhereClause::And(left, right) => {
                let left_sql = left.build_sql(placeholder);
                let right_sql = right.build_sql(placeholder);
                format!("({}) AND ({})", left_sql, right_sql)
            }
            WhereClause::Or(left, right) => {
                let left_sql = left.build_sql(placeholder);
                let right_sql = right.build_sql(placeholder);
                format!("({}) OR ({})", left_sql, right_sql)
            }
        }
    }
}
