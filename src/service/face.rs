//! Face Service Implementation
//!
//! Stores client-computed face descriptors against listings and answers
//! similarity queries with cosine distance.

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::models::face::{
    FaceDescriptor, FaceDescriptorRow, FaceMatch, MatchRequest, MatchResponse,
    RegisterDescriptorRequest,
};
use crate::utils::error::{AppError, AppResult};

/// Default minimum cosine similarity for a match hit
pub const DEFAULT_THRESHOLD: f32 = 0.8;

/// Default cap on match results
pub const DEFAULT_MATCH_LIMIT: usize = 20;

/// Face descriptor storage and matching
#[derive(Clone)]
pub struct FaceService {
    pool: PgPool,
}

impl FaceService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a descriptor against a photo the caller owns
    pub async fn register(
        &self,
        user_id: Uuid,
        request: RegisterDescriptorRequest,
    ) -> AppResult<FaceDescriptor> {
        request
            .validate()
            .map_err(|e| AppError::Validation(format!("Invalid descriptor: {}", e)))?;

        if norm(&request.embedding) == 0.0 {
            return Err(AppError::Validation(
                "Descriptor must not be all zeros".to_string(),
            ));
        }

        let seller_id: Option<Uuid> =
            sqlx::query_scalar("SELECT seller_id FROM photos WHERE id = $1")
                .bind(request.photo_id)
                .fetch_optional(&self.pool)
                .await?;

        match seller_id {
            None => return Err(AppError::NotFound("Photo not found".to_string())),
            Some(seller_id) if seller_id != user_id => {
                return Err(AppError::Forbidden(
                    "Only the seller can tag this photo".to_string(),
                ))
            }
            Some(_) => {}
        }

        let row = sqlx::query_as::<_, FaceDescriptorRow>(
            r#"
            INSERT INTO face_descriptors (photo_id, embedding)
            VALUES ($1, $2)
            RETURNING id, photo_id, embedding, created_at
            "#,
        )
        .bind(request.photo_id)
        .bind(Json(request.embedding))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// List descriptors registered for a photo
    pub async fn list_for_photo(&self, photo_id: Uuid) -> AppResult<Vec<FaceDescriptor>> {
        let rows = sqlx::query_as::<_, FaceDescriptorRow>(
            r#"
            SELECT id, photo_id, embedding, created_at
            FROM face_descriptors
            WHERE photo_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(photo_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FaceDescriptor::from).collect())
    }

    /// Delete a descriptor; only the photo's seller may remove it
    pub async fn delete(&self, user_id: Uuid, descriptor_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM face_descriptors
            WHERE id = $1
              AND photo_id IN (SELECT id FROM photos WHERE seller_id = $2)
            "#,
        )
        .bind(descriptor_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Descriptor not found".to_string()));
        }

        Ok(())
    }

    /// Find photos whose descriptors are similar to the query embedding.
    ///
    /// Only available listings are searched; each photo appears at most once,
    /// scored by its best descriptor.
    pub async fn find_matches(&self, request: MatchRequest) -> AppResult<MatchResponse> {
        request
            .validate()
            .map_err(|e| AppError::Validation(format!("Invalid descriptor: {}", e)))?;

        let threshold = request.threshold.unwrap_or(DEFAULT_THRESHOLD);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AppError::Validation(
                "Threshold must be between 0 and 1".to_string(),
            ));
        }
        if norm(&request.embedding) == 0.0 {
            return Err(AppError::Validation(
                "Descriptor must not be all zeros".to_string(),
            ));
        }
        let limit = request.limit.unwrap_or(DEFAULT_MATCH_LIMIT).clamp(1, 100);

        let rows = sqlx::query_as::<_, FaceDescriptorRow>(
            r#"
            SELECT f.id, f.photo_id, f.embedding, f.created_at
            FROM face_descriptors f
            JOIN photos p ON p.id = f.photo_id
            WHERE p.status = 'available'
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut matches: Vec<FaceMatch> = Vec::new();
        for row in rows {
            let Some(similarity) = cosine_similarity(&request.embedding, &row.embedding.0) else {
                continue;
            };
            if similarity < threshold {
                continue;
            }

            match matches.iter().position(|hit| hit.photo_id == row.photo_id) {
                Some(index) => {
                    if similarity > matches[index].similarity {
                        matches[index].similarity = similarity;
                        matches[index].descriptor_id = row.id;
                    }
                }
                None => matches.push(FaceMatch {
                    photo_id: row.photo_id,
                    descriptor_id: row.id,
                    similarity,
                }),
            }
        }

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);

        Ok(MatchResponse { matches, threshold })
    }
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity; None when lengths differ or either vector has zero norm
fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    Some(dot / (norm_a * norm_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let v = vec![0.5f32; 128];
        let similarity = cosine_similarity(&v, &v).unwrap();
        assert!((similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_vectors() {
        let mut a = vec![0.0f32; 128];
        let mut b = vec![0.0f32; 128];
        a[0] = 1.0;
        b[1] = 1.0;

        let similarity = cosine_similarity(&a, &b).unwrap();
        assert!(similarity.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_rejects_zero_norm() {
        let zero = vec![0.0f32; 128];
        let unit = vec![1.0f32; 128];
        assert!(cosine_similarity(&zero, &unit).is_none());
    }

    #[test]
    fn test_cosine_similarity_rejects_length_mismatch() {
        let a = vec![1.0f32; 128];
        let b = vec![1.0f32; 64];
        assert!(cosine_similarity(&a, &b).is_none());
    }
}
