//! # Photo Platform
//!
//! A marketplace service for selling photos, built with Axum and SQLx.
//!
//! ## Features
//!
//! - **User accounts**: registration, JWT authentication with refresh
//!   sessions, profiles, bank accounts, balance withdrawals, and a follow
//!   graph
//! - **Photo listings**: image uploads to S3-compatible storage with
//!   presigned URLs and an available/waiting/sold lifecycle
//! - **Face search**: descriptor storage and cosine-similarity matching over
//!   available listings
//! - **Cart and checkout**: per-user carts and QRIS payments through an
//!   external gateway with signed webhook settlement
//!
//! ## Architecture
//!
//! - `api` - HTTP routes, handlers, and authentication middleware
//! - `config` - Environment-based application configuration
//! - `database` - Connection pooling and pagination helpers
//! - `models` - Domain types and request/response payloads
//! - `service` - Business logic services
//! - `utils` - Errors, security primitives, and validation

pub mod api;
pub mod config;
pub mod database;
pub mod models;
pub mod service;
pub mod utils;

// Re-export commonly used types
pub use api::{create_routes, AppState};
pub use config::AppConfig;
pub use database::create_pool;
pub use utils::error::{AppError, AppResult};

/// Current version of the service
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
