//! Data services for the account browser
//!
//! - Dataset loading (CSV or built-in sample)
//! - Location-driven queries
//! - Background query execution

pub mod dataset;
pub mod query;
pub mod query_runner;

pub use query::{AccountQuery, QueryResult};
pub use query_runner::QueryRunner;
