//! User Handlers
//!
//! Registration, authentication, profile, bank accounts, withdrawals, and the
//! follow graph under `/api/user`.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header::USER_AGENT,
    http::HeaderMap,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::middleware::AuthUser,
    database::Pagination,
    models::{
        auth::TokenPair,
        user::{
            AddAccountRequest, BankAccount, ChangePasswordRequest, LoginRequest, LogoutRequest,
            PublicProfile, RefreshTokenRequest, RegisterRequest, UpdateAccountRequest,
            UpdateProfileRequest, UserProfile, WithdrawalRequest, WithdrawalResponse,
        },
    },
    utils::error::{AppError, AppResult},
};

use super::{AppState, SuccessResponse};

/// Response for login: the profile plus a fresh token pair
#[derive(serde::Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

#[derive(serde::Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(serde::Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Paginated bank account listing
#[derive(serde::Serialize)]
pub struct AccountPage {
    pub items: Vec<BankAccount>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Json<SuccessResponse<UserProfile>>> {
    let profile = state.user_service.register(request).await?;
    Ok(Json(SuccessResponse::new(profile)))
}

/// Log in with email or phone, returning a token pair
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<SuccessResponse<AuthResponse>>> {
    let row = state.user_service.login(request).await?;
    let tokens = state
        .jwt_service
        .generate_token_pair(row.id, user_agent(&headers))
        .await?;
    let user = state.user_service.get_profile(row.id).await?;

    Ok(Json(SuccessResponse::new(AuthResponse { user, tokens })))
}

/// Exchange a refresh token for a new access token
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> AppResult<Json<SuccessResponse<TokenPair>>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(format!("Invalid refresh data: {}", e)))?;

    let tokens = state
        .jwt_service
        .refresh_access_token(&request.refresh_token)
        .await?;

    Ok(Json(SuccessResponse::new(tokens)))
}

/// Log out by revoking the refresh token's session
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<LogoutRequest>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(format!("Invalid logout data: {}", e)))?;

    state
        .jwt_service
        .revoke_refresh_token(&request.refresh_token)
        .await?;

    Ok(Json(SuccessResponse::new(MessageResponse {
        message: "Logged out".to_string(),
    })))
}

/// Get the authenticated user's profile
pub async fn current_user(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<SuccessResponse<UserProfile>>> {
    let profile = state.user_service.get_profile(user.user_id).await?;
    Ok(Json(SuccessResponse::new(profile)))
}

/// Update the authenticated user's profile
pub async fn update_current_user(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> AppResult<Json<SuccessResponse<UserProfile>>> {
    let profile = state
        .user_service
        .update_profile(user.user_id, request)
        .await?;
    Ok(Json(SuccessResponse::new(profile)))
}

/// Change the authenticated user's password and revoke all sessions
pub async fn change_password(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    state
        .user_service
        .change_password(user.user_id, request)
        .await?;

    // Old tokens are invalidated alongside the old password
    state
        .jwt_service
        .revoke_all_user_sessions(user.user_id)
        .await?;

    Ok(Json(SuccessResponse::new(MessageResponse {
        message: "Password changed".to_string(),
    })))
}

/// Upload a new profile photo (multipart, field `file`)
pub async fn change_profile_photo(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    mut multipart: Multipart,
) -> AppResult<Json<SuccessResponse<UserProfile>>> {
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart data: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .ok_or_else(|| AppError::Validation("File name is required".to_string()))?
                .to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?
                .to_vec();

            upload = Some((filename, content_type, bytes));
        }
    }

    let (filename, content_type, bytes) =
        upload.ok_or_else(|| AppError::Validation("File field is required".to_string()))?;

    let profile = state
        .user_service
        .change_profile_photo(user.user_id, &filename, &content_type, bytes)
        .await?;

    Ok(Json(SuccessResponse::new(profile)))
}

/// Get another user's public profile
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<PublicProfile>>> {
    let profile = state.user_service.get_public_profile(user_id).await?;
    Ok(Json(SuccessResponse::new(profile)))
}

/// Follow another user
pub async fn follow_user(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(target_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    state
        .user_service
        .set_follow(user.user_id, target_id, true)
        .await?;

    Ok(Json(SuccessResponse::new(MessageResponse {
        message: "Followed".to_string(),
    })))
}

/// Unfollow another user
pub async fn unfollow_user(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(target_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    state
        .user_service
        .set_follow(user.user_id, target_id, false)
        .await?;

    Ok(Json(SuccessResponse::new(MessageResponse {
        message: "Unfollowed".to_string(),
    })))
}

/// Add a bank account for withdrawals
pub async fn add_account(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<AddAccountRequest>,
) -> AppResult<Json<SuccessResponse<BankAccount>>> {
    let account = state.user_service.add_account(user.user_id, request).await?;
    Ok(Json(SuccessResponse::new(account)))
}

/// List the authenticated user's bank accounts
pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<SuccessResponse<AccountPage>>> {
    let pagination = Pagination::new(query.page.unwrap_or(1), query.per_page.unwrap_or(20));
    let (items, total) = state
        .user_service
        .list_accounts(user.user_id, &pagination)
        .await?;

    Ok(Json(SuccessResponse::new(AccountPage {
        items,
        total,
        page: pagination.page,
        per_page: pagination.per_page,
        total_pages: pagination.total_pages(total),
    })))
}

/// Get one of the authenticated user's bank accounts
pub async fn get_account(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(account_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<BankAccount>>> {
    let account = state
        .user_service
        .get_account(user.user_id, account_id)
        .await?;
    Ok(Json(SuccessResponse::new(account)))
}

/// Update a bank account
pub async fn update_account(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<UpdateAccountRequest>,
) -> AppResult<Json<SuccessResponse<BankAccount>>> {
    let account = state
        .user_service
        .update_account(user.user_id, account_id, request)
        .await?;
    Ok(Json(SuccessResponse::new(account)))
}

/// Remove a bank account
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(account_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    state
        .user_service
        .delete_account(user.user_id, account_id)
        .await?;

    Ok(Json(SuccessResponse::new(MessageResponse {
        message: "Account deleted".to_string(),
    })))
}

/// Withdraw from the balance to a bank account
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<WithdrawalRequest>,
) -> AppResult<Json<SuccessResponse<WithdrawalResponse>>> {
    let withdrawal = state.user_service.withdraw(user.user_id, request).await?;
    Ok(Json(SuccessResponse::new(withdrawal)))
}
