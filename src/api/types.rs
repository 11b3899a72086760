use serde::{Deserialize, Serialize};

use crate::db::{ListedProduct, ProductDetails, User};
use crate::entities::{products, reviews, sellers, users};

// ============================================================================
// Auth
// ============================================================================

/// Registration body. Required fields are `Option` so a missing field is a
/// 400 from our validation rather than a deserialization reject.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserDto,
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub is_seller: bool,
    pub is_verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            city: user.city,
            region: user.region,
            country: user.country,
            is_seller: user.is_seller,
            is_verified: user.is_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// ============================================================================
// Products
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub condition: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub condition: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub brand: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub specifications: serde_json::Map<String, serde_json::Value>,
}

/// Partial update: absent fields stay untouched, present values are written
/// verbatim.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub condition: Option<String>,
    pub brand: Option<String>,
    pub images: Option<Vec<String>>,
    pub specifications: Option<serde_json::Map<String, serde_json::Value>>,
    pub city: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: i32,
    pub seller_id: i32,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub subcategory: String,
    pub condition: String,
    pub brand: Option<String>,
    pub images: Vec<String>,
    pub specifications: serde_json::Value,
    pub city: String,
    pub region: String,
    pub country: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<products::Model> for ProductDto {
    fn from(model: products::Model) -> Self {
        let images: Vec<String> = serde_json::from_str(&model.images).unwrap_or_default();
        let specifications: serde_json::Value = serde_json::from_str(&model.specifications)
            .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()));

        Self {
            id: model.id,
            seller_id: model.seller_id,
            title: model.title,
            description: model.description,
            price: model.price,
            category: model.category,
            subcategory: model.subcategory,
            condition: model.condition,
            brand: model.brand,
            images,
            specifications,
            city: model.city,
            region: model.region,
            country: model.country,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryDto {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
}

impl From<users::Model> for UserSummaryDto {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            city: model.city,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerDto {
    pub id: i32,
    pub user_id: i32,
    pub business_name: String,
    pub rating: f64,
    pub total_sales: i32,
    pub user: Option<UserSummaryDto>,
}

impl From<(sellers::Model, Option<users::Model>)> for SellerDto {
    fn from((seller, user): (sellers::Model, Option<users::Model>)) -> Self {
        Self {
            id: seller.id,
            user_id: seller.user_id,
            business_name: seller.business_name,
            rating: seller.rating,
            total_sales: seller.total_sales,
            user: user.map(UserSummaryDto::from),
        }
    }
}

/// Listing entry: the product with its seller summary and rating
/// aggregates, raw reviews stripped.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedProductDto {
    #[serde(flatten)]
    pub product: ProductDto,
    pub seller: Option<SellerDto>,
    pub average_rating: f64,
    pub review_count: usize,
}

impl From<ListedProduct> for ListedProductDto {
    fn from(row: ListedProduct) -> Self {
        let ratings: Vec<i32> = row.reviews.iter().map(|r| r.rating).collect();
        let (average_rating, review_count) = rating_summary(&ratings);

        Self {
            product: ProductDto::from(row.product),
            seller: row.seller.map(SellerDto::from),
            average_rating,
            review_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ListedProductDto>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailsDto {
    #[serde(flatten)]
    pub product: ProductDto,
    pub seller: Option<SellerDto>,
    pub reviews: Vec<ReviewDto>,
    pub average_rating: f64,
    pub review_count: usize,
}

impl From<ProductDetails> for ProductDetailsDto {
    fn from(row: ProductDetails) -> Self {
        let ratings: Vec<i32> = row.reviews.iter().map(|(r, _)| r.rating).collect();
        let (average_rating, review_count) = rating_summary(&ratings);

        Self {
            product: ProductDto::from(row.product),
            seller: row.seller.map(SellerDto::from),
            reviews: row.reviews.into_iter().map(ReviewDto::from).collect(),
            average_rating,
            review_count,
        }
    }
}

/// Seller-page product summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummaryDto {
    pub id: i32,
    pub title: String,
    pub price: f64,
    pub images: Vec<String>,
    pub condition: String,
    pub created_at: String,
}

impl From<products::Model> for ProductSummaryDto {
    fn from(model: products::Model) -> Self {
        let images: Vec<String> = serde_json::from_str(&model.images).unwrap_or_default();
        Self {
            id: model.id,
            title: model.title,
            price: model.price,
            images,
            condition: model.condition,
            created_at: model.created_at,
        }
    }
}

// ============================================================================
// Reviews
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerDto {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    pub id: i32,
    pub product_id: i32,
    pub user_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<ReviewerDto>,
}

impl From<reviews::Model> for ReviewDto {
    fn from(model: reviews::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            user_id: model.user_id,
            rating: model.rating,
            comment: model.comment,
            created_at: model.created_at,
            updated_at: model.updated_at,
            reviewer: None,
        }
    }
}

impl From<(reviews::Model, Option<users::Model>)> for ReviewDto {
    fn from((model, user): (reviews::Model, Option<users::Model>)) -> Self {
        let mut dto = Self::from(model);
        dto.reviewer = user.map(|u| ReviewerDto {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
        });
        dto
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserProfileResponse {
    #[serde(flatten)]
    pub user: UserDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<ProductSummaryDto>>,
}

// ============================================================================
// Misc
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub uptime_seconds: u64,
}

/// Mean rating rounded to one decimal, 0.0 when there are no ratings.
pub fn rating_summary(ratings: &[i32]) -> (f64, usize) {
    let count = ratings.len();
    if count == 0 {
        return (0.0, 0);
    }

    let sum: i32 = ratings.iter().sum();
    let mean = f64::from(sum) / count as f64;
    ((mean * 10.0).round() / 10.0, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_summary_empty() {
        assert_eq!(rating_summary(&[]), (0.0, 0));
    }

    #[test]
    fn test_rating_summary_rounds_to_one_decimal() {
        // mean of 4, 5, 5 = 4.666... -> 4.7
        assert_eq!(rating_summary(&[4, 5, 5]), (4.7, 3));
        // mean of 1, 2 = 1.5
        assert_eq!(rating_summary(&[1, 2]), (1.5, 2));
        assert_eq!(rating_summary(&[3]), (3.0, 1));
    }
}
