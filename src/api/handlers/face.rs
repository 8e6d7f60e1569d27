//! Face Handlers
//!
//! Face descriptor endpoints under `/api/face`.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    api::middleware::AuthUser,
    models::face::{FaceDescriptor, MatchRequest, MatchResponse, RegisterDescriptorRequest},
    utils::error::AppResult,
};

use super::user::MessageResponse;
use super::{AppState, SuccessResponse};

/// Register a descriptor against an owned photo
pub async fn register_descriptor(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<RegisterDescriptorRequest>,
) -> AppResult<Json<SuccessResponse<FaceDescriptor>>> {
    let descriptor = state.face_service.register(user.user_id, request).await?;
    Ok(Json(SuccessResponse::new(descriptor)))
}

/// List descriptors registered for a photo
pub async fn list_descriptors(
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Vec<FaceDescriptor>>>> {
    let descriptors = state.face_service.list_for_photo(photo_id).await?;
    Ok(Json(SuccessResponse::new(descriptors)))
}

/// Delete a descriptor
pub async fn delete_descriptor(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(descriptor_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    state
        .face_service
        .delete(user.user_id, descriptor_id)
        .await?;

    Ok(Json(SuccessResponse::new(MessageResponse {
        message: "Descriptor deleted".to_string(),
    })))
}

/// Match available photos against a query descriptor
pub async fn match_faces(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> AppResult<Json<SuccessResponse<MatchResponse>>> {
    let matches = state.face_service.find_matches(request).await?;
    Ok(Json(SuccessResponse::new(matches)))
}
