use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tracing::info;

use super::auth::AuthUser;
use super::types::{ProductSummaryDto, UpdateUserRequest, UserDto, UserProfileResponse};
use super::{ApiError, AppState};
use crate::db::UserChanges;

/// GET /users/{id}
/// Public profile; sellers also get their listings, newest first
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<UserProfileResponse>, ApiError> {
    let user = state
        .store()
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    let products = if user.is_seller {
        match state.store().get_seller_by_user_id(user.id).await? {
            Some(seller) => {
                let rows = state.store().list_seller_products(seller.id).await?;
                Some(rows.into_iter().map(ProductSummaryDto::from).collect())
            }
            None => None,
        }
    } else {
        None
    };

    Ok(Json(UserProfileResponse {
        user: UserDto::from(user),
        products,
    }))
}

/// PUT /users/{id}
/// Update your own profile; email is immutable and a new password is
/// re-hashed before storage
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserDto>, ApiError> {
    if auth.user_id != id {
        return Err(ApiError::forbidden("You can only update your own profile"));
    }

    let changes = UserChanges {
        first_name: payload.first_name,
        last_name: payload.last_name,
        phone: payload.phone,
        city: payload.city,
        region: payload.region,
        password: payload.password,
    };

    let updated = state
        .store()
        .update_user(id, changes, &state.config().security)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    info!(user_id = id, "Updated user profile");

    Ok(Json(UserDto::from(updated)))
}
