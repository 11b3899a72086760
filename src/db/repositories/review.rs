use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::entities::{prelude::*, reviews, users};

#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: i32,
    pub user_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
}

/// Partial review update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ReviewChanges {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

pub struct ReviewRepository {
    conn: DatabaseConnection,
}

impl ReviewRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<reviews::Model>> {
        Reviews::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query review")
    }

    pub async fn get_with_reviewer(
        &self,
        id: i32,
    ) -> Result<Option<(reviews::Model, Option<users::Model>)>> {
        Reviews::find_by_id(id)
            .find_also_related(Users)
            .one(&self.conn)
            .await
            .context("Failed to query review with reviewer")
    }

    /// Insert a review. Rating is clamped to [1, 5] at write time.
    pub async fn create(&self, new_review: NewReview) -> Result<reviews::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = reviews::ActiveModel {
            product_id: Set(new_review.product_id),
            user_id: Set(new_review.user_id),
            rating: Set(new_review.rating.clamp(1, 5)),
            comment: Set(new_review.comment),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert review")
    }

    /// Apply a partial update to an already-loaded review. Range checks
    /// happen at the API layer.
    pub async fn update(
        &self,
        review: reviews::Model,
        changes: ReviewChanges,
    ) -> Result<reviews::Model> {
        let mut active: reviews::ActiveModel = review.into();

        if let Some(rating) = changes.rating {
            active.rating = Set(rating);
        }
        if let Some(comment) = changes.comment {
            active.comment = Set(Some(comment));
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        active
            .update(&self.conn)
            .await
            .context("Failed to update review")
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Reviews::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete review")?;

        Ok(result.rows_affected > 0)
    }
}
