use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};

use crate::entities::sellers;

pub struct SellerRepository {
    conn: DatabaseConnection,
}

impl SellerRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_user_id(&self, user_id: i32) -> Result<Option<sellers::Model>> {
        let seller = sellers::Entity::find()
            .filter(sellers::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query seller by user ID")?;

        Ok(seller)
    }

    /// Find the seller profile for a user, creating it on first use. The
    /// default business name is the local part of the email. Returns the
    /// profile and whether it was created by this call.
    ///
    /// Two concurrent first-time listings race on the insert; the unique
    /// index on `user_id` rejects the loser, which then re-reads the row
    /// the winner created.
    pub async fn ensure_for_user(&self, user_id: i32, email: &str) -> Result<(sellers::Model, bool)> {
        if let Some(existing) = self.get_by_user_id(user_id).await? {
            return Ok((existing, false));
        }

        let business_name = email.split('@').next().unwrap_or("seller").to_string();
        let now = chrono::Utc::now().to_rfc3339();

        let active = sellers::ActiveModel {
            user_id: Set(user_id),
            business_name: Set(business_name),
            rating: Set(0.0),
            total_sales: Set(0),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok((model, true)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                let existing = self
                    .get_by_user_id(user_id)
                    .await?
                    .context("Seller row missing after unique violation")?;
                Ok((existing, false))
            }
            Err(e) => Err(e).context("Failed to insert seller"),
        }
    }
}
