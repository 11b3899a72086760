use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;

use super::auth::AuthUser;
use super::types::{CreateReviewRequest, MessageResponse, ReviewDto, UpdateReviewRequest};
use super::{ApiError, AppState, validation};
use crate::db::{NewReview, ReviewChanges};
use crate::entities::reviews;

/// POST /products/{id}/reviews
/// Leave a review on a product; the rating is clamped into [1, 5]
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(product_id): Path<i32>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewDto>), ApiError> {
    let rating = payload
        .rating
        .ok_or_else(|| ApiError::validation("rating is required"))?;

    if state
        .store()
        .get_product_with_seller(product_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("Product", product_id));
    }

    let review = state
        .store()
        .create_review(NewReview {
            product_id,
            user_id: auth.user_id,
            rating,
            comment: payload.comment,
        })
        .await?;

    info!(review_id = review.id, product_id, "Created review");

    Ok((StatusCode::CREATED, Json(ReviewDto::from(review))))
}

/// GET /reviews/{id}
/// Get a single review with the reviewer's name
pub async fn get_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ReviewDto>, ApiError> {
    let (review, reviewer) = state
        .store()
        .get_review_with_reviewer(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Review", id))?;

    Ok(Json(ReviewDto::from((review, reviewer))))
}

/// PUT /reviews/{id}
/// Update a review (author only); an out-of-range rating rejects
pub async fn update_review(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<Json<ReviewDto>, ApiError> {
    let review = load_owned_review(&state, id, auth.user_id).await?;

    if let Some(rating) = payload.rating {
        validation::validate_rating(rating)?;
    }

    let updated = state
        .store()
        .update_review(
            review,
            ReviewChanges {
                rating: payload.rating,
                comment: payload.comment,
            },
        )
        .await?;

    Ok(Json(ReviewDto::from(updated)))
}

/// DELETE /reviews/{id}
/// Delete a review (author only)
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let review = load_owned_review(&state, id, auth.user_id).await?;

    state.store().delete_review(review.id).await?;

    info!(review_id = id, "Deleted review");

    Ok(Json(MessageResponse {
        message: "Review deleted".to_string(),
    }))
}

async fn load_owned_review(
    state: &AppState,
    id: i32,
    user_id: i32,
) -> Result<reviews::Model, ApiError> {
    let review = state
        .store()
        .get_review(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Review", id))?;

    if review.user_id != user_id {
        return Err(ApiError::forbidden("You do not own this review"));
    }

    Ok(review)
}
