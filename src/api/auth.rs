use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::info;

use super::types::{AuthResponse, LoginRequest, RegisterRequest, UserDto};
use super::{ApiError, AppState, validation};
use crate::db::NewUser;
use crate::token::TokenOutcome;

/// Identity attached to the request by [`auth_middleware`]. Handlers behind
/// the protected router can rely on it being present.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware for protected routes. Expects
/// `Authorization: Bearer <token>` and rejects with 401 on a missing,
/// malformed, or expired token.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_bearer_token(request.headers()) else {
        return Err(ApiError::unauthorized("Missing authorization header"));
    };

    match state.tokens().verify(token) {
        TokenOutcome::Valid(claims) => {
            tracing::Span::current().record("user_id", claims.sub);
            request.extensions_mut().insert(AuthUser {
                user_id: claims.sub,
                email: claims.email,
            });
            Ok(next.run(request).await)
        }
        TokenOutcome::Expired => Err(ApiError::unauthorized("Token expired")),
        TokenOutcome::Invalid => Err(ApiError::unauthorized("Invalid token")),
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let token = headers
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .trim();

    if token.is_empty() { None } else { Some(token) }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create an account and return the sanitized user with a fresh token
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = validation::required_field(payload.email, "email")?;
    let password = validation::required_field(payload.password, "password")?;
    let first_name = validation::required_field(payload.first_name, "firstName")?;
    let last_name = validation::required_field(payload.last_name, "lastName")?;
    let phone = validation::required_field(payload.phone, "phone")?;
    let city = validation::required_field(payload.city, "city")?;
    let region = validation::required_field(payload.region, "region")?;

    if state.store().get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict("Email already registered"));
    }

    let new_user = NewUser {
        email,
        password,
        first_name,
        last_name,
        phone,
        city,
        region,
        country: state.config().marketplace.default_country.clone(),
    };

    // The insert can still lose a race with a concurrent registration; the
    // unique index reports that as `None`.
    let user = state
        .store()
        .create_user(new_user, &state.config().security)
        .await?
        .ok_or_else(|| ApiError::conflict("Email already registered"))?;

    let token = state.tokens().issue(user.id, &user.email)?;

    info!(user_id = user.id, "Registered new user");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserDto::from(user),
            token,
        }),
    ))
}

/// POST /auth/login
/// Verify credentials and return the user with a fresh token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = validation::required_field(payload.email, "email")?;
    let password = validation::required_field(payload.password, "password")?;

    let is_valid = state.store().verify_user_password(&email, &password).await?;
    if !is_valid {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let user = state
        .store()
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let token = state.tokens().issue(user.id, &user.email)?;

    Ok(Json(AuthResponse {
        user: UserDto::from(user),
        token,
    }))
}

/// GET /auth/me
/// Get the account behind the presented token (requires authentication)
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserDto>, ApiError> {
    let user = state
        .store()
        .get_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Account no longer exists"))?;

    Ok(Json(UserDto::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        let headers = headers_with_auth("Bearer abc.def.ghi");
        assert_eq!(extract_bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_extract_bearer_token_rejects_other_schemes() {
        let headers = headers_with_auth("Basic dXNlcjpwYXNz");
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn test_extract_bearer_token_rejects_empty() {
        let headers = headers_with_auth("Bearer   ");
        assert_eq!(extract_bearer_token(&headers), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }
}
