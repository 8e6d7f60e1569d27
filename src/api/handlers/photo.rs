//! Photo Handlers
//!
//! Sell-photo listing endpoints under `/api/photo`. Creation is multipart:
//! metadata fields plus a `file` field with the image.

use axum::{
    extract::{Multipart, Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    api::middleware::AuthUser,
    models::photo::{CreatePhotoRequest, ListPhotosQuery, Photo, PhotoPage, UpdatePhotoRequest},
    utils::error::{AppError, AppResult},
};

use super::user::MessageResponse;
use super::{AppState, SuccessResponse};

struct PhotoUpload {
    title: Option<String>,
    description: Option<String>,
    price: Option<i64>,
    file: Option<(String, String, Vec<u8>)>,
}

async fn parse_upload(mut multipart: Multipart) -> AppResult<PhotoUpload> {
    let mut upload = PhotoUpload {
        title: None,
        description: None,
        price: None,
        file: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart data: {}", e)))?
    {
        match field.name() {
            Some("title") => {
                upload.title = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Invalid title: {}", e)))?,
                );
            }
            Some("description") => {
                upload.description = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Invalid description: {}", e)))?,
                );
            }
            Some("price") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid price: {}", e)))?;
                let price = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| AppError::Validation("Price must be an integer".to_string()))?;
                upload.price = Some(price);
            }
            Some("file") => {
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

                upload.file = Some((filename, content_type, bytes));
            }
            _ => {}
        }
    }

    Ok(upload)
}

/// Create a listing from a multipart upload
pub async fn create_photo(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    multipart: Multipart,
) -> AppResult<Json<SuccessResponse<Photo>>> {
    let upload = parse_upload(multipart).await?;

    let request = CreatePhotoRequest {
        title: upload
            .title
            .ok_or_else(|| AppError::Validation("Title field is required".to_string()))?,
        description: upload.description,
        price: upload
            .price
            .ok_or_else(|| AppError::Validation("Price field is required".to_string()))?,
    };
    let (filename, content_type, bytes) = upload
        .file
        .ok_or_else(|| AppError::Validation("File field is required".to_string()))?;

    let photo = state
        .photo_service
        .create(user.user_id, request, &filename, &content_type, bytes)
        .await?;

    Ok(Json(SuccessResponse::new(photo)))
}

/// Browse listings
pub async fn list_photos(
    State(state): State<AppState>,
    Query(query): Query<ListPhotosQuery>,
) -> AppResult<Json<SuccessResponse<PhotoPage>>> {
    let page = state.photo_service.list(query).await?;
    Ok(Json(SuccessResponse::new(page)))
}

/// Fetch a single listing
pub async fn get_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Photo>>> {
    let photo = state.photo_service.get(photo_id).await?;
    Ok(Json(SuccessResponse::new(photo)))
}

/// Update listing metadata
pub async fn update_photo(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(photo_id): Path<Uuid>,
    Json(request): Json<UpdatePhotoRequest>,
) -> AppResult<Json<SuccessResponse<Photo>>> {
    let photo = state
        .photo_service
        .update(user.user_id, photo_id, request)
        .await?;
    Ok(Json(SuccessResponse::new(photo)))
}

/// Delete a listing
pub async fn delete_photo(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(photo_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    state.photo_service.delete(user.user_id, photo_id).await?;

    Ok(Json(SuccessResponse::new(MessageResponse {
        message: "Photo deleted".to_string(),
    })))
}
