mod query;

pub use query::{Order, QueryBuilder, QuerySource};
