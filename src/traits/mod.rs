mod driver;

pub use driver::{DatabaseConnection, DatabaseDriver};
