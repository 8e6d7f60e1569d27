//! Face Models
//!
//! Face descriptors attached to photos and the `/api/face` payloads.
//! Descriptors are fixed-length embeddings produced client-side; the service
//! stores them and answers similarity queries.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Fixed length of face descriptors accepted by the service
pub const DESCRIPTOR_LEN: usize = 128;

fn validate_descriptor_len(embedding: &[f32]) -> Result<(), ValidationError> {
    if embedding.len() != DESCRIPTOR_LEN {
        let mut error = ValidationError::new("descriptor_length");
        error.message = Some(Cow::Owned(format!(
            "Descriptor must have {} elements",
            DESCRIPTOR_LEN
        )));
        return Err(error);
    }
    Ok(())
}

/// Database row for a stored descriptor; the embedding is JSONB
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FaceDescriptorRow {
    pub id: Uuid,
    pub photo_id: Uuid,
    pub embedding: Json<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

/// Stored face descriptor for API responses (embedding omitted)
#[derive(Debug, Clone, Serialize)]
pub struct FaceDescriptor {
    pub id: Uuid,
    pub photo_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<FaceDescriptorRow> for FaceDescriptor {
    fn from(row: FaceDescriptorRow) -> Self {
        Self {
            id: row.id,
            photo_id: row.photo_id,
            created_at: row.created_at,
        }
    }
}

/// Request payload for registering a descriptor against an owned photo
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterDescriptorRequest {
    pub photo_id: Uuid,

    #[validate(custom = "validate_descriptor_len")]
    pub embedding: Vec<f32>,
}

/// Request payload for matching photos by face similarity
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MatchRequest {
    #[validate(custom = "validate_descriptor_len")]
    pub embedding: Vec<f32>,

    /// Minimum cosine similarity for a hit; defaults to 0.8
    pub threshold: Option<f32>,

    /// Maximum number of results; defaults to 20
    pub limit: Option<usize>,
}

/// One face match hit
#[derive(Debug, Serialize)]
pub struct FaceMatch {
    pub photo_id: Uuid,
    pub descriptor_id: Uuid,
    pub similarity: f32,
}

/// Response for a match query
#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub matches: Vec<FaceMatch>,
    pub threshold: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_descriptor_length_validated() {
        let valid = RegisterDescriptorRequest {
            photo_id: Uuid::new_v4(),
            embedding: vec![0.1; DESCRIPTOR_LEN],
        };
        assert!(valid.validate().is_ok());

        let short = RegisterDescriptorRequest {
            photo_id: Uuid::new_v4(),
            embedding: vec![0.1; DESCRIPTOR_LEN / 2],
        };
        assert!(short.validate().is_err());

        let long = RegisterDescriptorRequest {
            photo_id: Uuid::new_v4(),
            embedding: vec![0.1; DESCRIPTOR_LEN + 1],
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_match_request_length_validated() {
        let valid = MatchRequest {
            embedding: vec![0.1; DESCRIPTOR_LEN],
            threshold: None,
            limit: None,
        };
        assert!(valid.validate().is_ok());

        let short = MatchRequest {
            embedding: vec![0.1; DESCRIPTOR_LEN - 1],
            threshold: None,
            limit: None,
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_descriptor_response_omits_embedding() {
        let row = FaceDescriptorRow {
            id: Uuid::new_v4(),
            photo_id: Uuid::new_v4(),
            embedding: Json(vec![0.5; DESCRIPTOR_LEN]),
            created_at: Utc::now(),
        };

        let descriptor: FaceDescriptor = row.into();
        let value = serde_json::to_value(&descriptor).unwrap();
        assert!(value.get("embedding").is_none());
    }
}
