//! Database Connection Management
//!
//! Utilities for managing PostgreSQL connections with SQLx.

use sqlx::PgPool;
use std::time::Duration;

use crate::config::DatabaseConfig;

/// Database connection pool type alias for convenience
pub type DatabasePool = PgPool;

/// Create a database connection pool from configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .max_lifetime(Duration::from_secs(config.max_lifetime_seconds))
        .connect(&config.url)
        .await
}

/// Simple pagination helper for database queries
#[derive(Debug, Clone)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32) -> Self {
        let per_page = per_page.clamp(1, 100) as i64;
        let page = page.max(1) as i64;
        let offset = (page - 1) * per_page;

        Self {
            limit: per_page,
            offset,
            page,
            per_page,
        }
    }

    /// Number of pages needed for `total` rows
    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total + self.per_page - 1) / self.per_page
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_creation() {
        let pagination = Pagination::new(1, 10);
        assert_eq!(pagination.limit, 10);
        assert_eq!(pagination.offset, 0);

        let pagination = Pagination::new(2, 20);
        assert_eq!(pagination.limit, 20);
        assert_eq!(pagination.offset, 20);
    }

    #[test]
    fn test_pagination_clamping() {
        let pagination = Pagination::new(1, 200); // Should clamp to 100
        assert_eq!(pagination.limit, 100);

        let pagination = Pagination::new(0, 10); // Should default to page 1
        assert_eq!(pagination.offset, 0);
    }

    #[test]
    fn test_total_pages() {
        let pagination = Pagination::new(1, 10);
        assert_eq!(pagination.total_pages(0), 0);
        assert_eq!(pagination.total_pages(1), 1);
        assert_eq!(pagination.total_pages(10), 1);
        assert_eq!(pagination.total_pages(11), 2);
    }
}
