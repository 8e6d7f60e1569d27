//! Cart Handlers
//!
//! Shopping cart endpoints under `/api/cart`. All routes require
//! authentication.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    api::middleware::AuthUser,
    models::cart::{AddCartItemRequest, Cart},
    utils::error::AppResult,
};

use super::user::MessageResponse;
use super::{AppState, SuccessResponse};

/// Fetch the authenticated user's cart
pub async fn get_cart(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<SuccessResponse<Cart>>> {
    let cart = state.cart_service.get(user.user_id).await?;
    Ok(Json(SuccessResponse::new(cart)))
}

/// Add a listing to the cart
pub async fn add_item(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<AddCartItemRequest>,
) -> AppResult<Json<SuccessResponse<Cart>>> {
    let cart = state
        .cart_service
        .add(user.user_id, request.photo_id)
        .await?;
    Ok(Json(SuccessResponse::new(cart)))
}

/// Remove a listing from the cart
pub async fn remove_item(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(photo_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Cart>>> {
    let cart = state.cart_service.remove(user.user_id, photo_id).await?;
    Ok(Json(SuccessResponse::new(cart)))
}

/// Empty the cart
pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    state.cart_service.clear(user.user_id).await?;

    Ok(Json(SuccessResponse::new(MessageResponse {
        message: "Cart cleared".to_string(),
    })))
}
