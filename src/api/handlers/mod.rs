//! HTTP Request Handlers
//!
//! Axum handlers for processing HTTP requests and responses, grouped by
//! route prefix.

pub mod cart;
pub mod face;
pub mod photo;
pub mod transaction;
pub mod user;

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};

use crate::{
    service::{
        CartService, FaceService, JwtService, PhotoService, TransactionService, UserService,
    },
    utils::error::AppResult,
    VERSION,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application title and summary from configuration, reported on /health
    pub app_title: String,
    pub app_summary: String,
    pub user_service: Arc<UserService>,
    pub photo_service: Arc<PhotoService>,
    pub face_service: Arc<FaceService>,
    pub cart_service: Arc<CartService>,
    pub transaction_service: Arc<TransactionService>,
    pub jwt_service: Arc<JwtService>,
}

/// Standard success response wrapper
#[derive(serde::Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(serde::Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub title: String,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Health check endpoint
pub async fn health_check(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessResponse<HealthCheckResponse>>> {
    // Check database connectivity
    state.user_service.health_check().await?;

    let response = HealthCheckResponse {
        status: "healthy".to_string(),
        title: state.app_title.clone(),
        summary: state.app_summary.clone(),
        timestamp: Utc::now(),
        version: VERSION.to_string(),
    };

    Ok(Json(SuccessResponse::new(response)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response_shape() {
        let response = SuccessResponse::new("payload");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["data"], "payload");
    }

    #[test]
    fn test_health_response_carries_title_and_summary() {
        let response = HealthCheckResponse {
            status: "healthy".to_string(),
            title: "Photo Platform".to_string(),
            summary: "Marketplace for buying and selling event photos".to_string(),
            timestamp: Utc::now(),
            version: VERSION.to_string(),
        };
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["title"], "Photo Platform");
        assert_eq!(
            value["summary"],
            "Marketplace for buying and selling event photos"
        );
    }
}
