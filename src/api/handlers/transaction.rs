//! Transaction Handlers
//!
//! Checkout and payment endpoints under `/api/transaction`. The notification
//! endpoint is unauthenticated; the gateway signs each delivery and the
//! service verifies the signature.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    api::middleware::AuthUser,
    models::transaction::{
        CreateTransactionRequest, ListTransactionsQuery, PaymentNotification, Transaction,
        TransactionPage,
    },
    service::payment::PaymentStatus,
    utils::error::AppResult,
};

use super::{AppState, SuccessResponse};

/// Create a transaction and charge the payment gateway
pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<CreateTransactionRequest>,
) -> AppResult<Json<SuccessResponse<Transaction>>> {
    let transaction = state
        .transaction_service
        .create(user.user_id, request)
        .await?;
    Ok(Json(SuccessResponse::new(transaction)))
}

/// List the caller's transactions, as buyer or seller
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(query): Query<ListTransactionsQuery>,
) -> AppResult<Json<SuccessResponse<TransactionPage>>> {
    let page = state.transaction_service.list(user.user_id, query).await?;
    Ok(Json(SuccessResponse::new(page)))
}

/// Fetch a transaction the caller is party to
pub async fn get_transaction(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Transaction>>> {
    let transaction = state
        .transaction_service
        .get(user.user_id, transaction_id)
        .await?;
    Ok(Json(SuccessResponse::new(transaction)))
}

/// Proxy the gateway's payment status for a transaction
pub async fn payment_status(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<PaymentStatus>>> {
    let status = state
        .transaction_service
        .payment_status(user.user_id, transaction_id)
        .await?;
    Ok(Json(SuccessResponse::new(status)))
}

/// Receive a payment notification from the gateway
pub async fn payment_notification(
    State(state): State<AppState>,
    Json(notification): Json<PaymentNotification>,
) -> AppResult<Json<SuccessResponse<Transaction>>> {
    let transaction = state
        .transaction_service
        .handle_notification(notification)
        .await?;
    Ok(Json(SuccessResponse::new(transaction)))
}
