//! Database connection management and query helpers.

pub mod connection;

pub use connection::{create_pool, DatabasePool, Pagination};
