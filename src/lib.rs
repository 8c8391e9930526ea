//! dbfetcher - run SQL through a connection that is opened and closed per call
//!
//! # Example
//! ```ignore
//! use dbfetcher::{Fetcher, FetcherError, WhereClause};
//!
//! let fetcher = Fetcher::postgres("postgres://localhost/mydb")?;
//!
//! let users = fetcher.create_query("users", Some("u"))
//!     .select(&["u.id", "u.name"])
//!     .where_(WhereClause::eq("u.name"));
//!
//! match fetcher.query(&users, &["John".into()]).await {
//!     Ok(rows) => {
//!         let row = rows.single_row()?;
//!         let id = row.get("id")?;
//!     }
//!     Err(FetcherError::Connection(msg)) => eprintln!("database unreachable: {msg}"),
//!     Err(e) => return Err(e),
//! }
//! ```

pub mod builders;
pub mod clauses;
pub mod drivers;
pub mod error;
pub mod traits;
pub mod types;

mod fetcher;

// Re-export main types for convenient access
pub use builders::{Order, QueryBuilder, QuerySource};
pub use clauses::WhereClause;
pub use error::{ConnectionFailure, ExecuteFailure, FetcherError, QueryFailure, Result};
pub use fetcher::{Fetcher, DATABASE_URL_ENV};
pub use traits::{DatabaseConnection, DatabaseDriver};
pub use types::{QueryResult, RawQueryResult, Row, SqlValue};
