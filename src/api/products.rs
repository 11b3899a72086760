use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;

use super::auth::AuthUser;
use super::types::{
    CreateProductRequest, ListedProductDto, MessageResponse, Pagination, ProductDetailsDto,
    ProductDto, ProductListQuery, ProductListResponse, UpdateProductRequest,
};
use super::{ApiError, AppState, validation};
use crate::db::{NewProduct, ProductChanges, ProductFilter};
use crate::entities::sellers;

/// GET /products
/// List products with optional filters, pagination and sorting
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let marketplace = &state.config().marketplace;

    let page = validation::validate_page(query.page.unwrap_or(1))?;
    let limit = validation::validate_limit(
        query.limit.unwrap_or(marketplace.default_page_size),
        marketplace.max_page_size,
    )?;
    let (sort, descending) =
        validation::parse_sort(query.sort_by.as_deref(), query.sort_order.as_deref())?;

    let filter = ProductFilter {
        category: validation::non_empty(query.category),
        subcategory: validation::non_empty(query.subcategory),
        condition: validation::non_empty(query.condition),
        city: validation::non_empty(query.city),
        min_price: query.min_price,
        max_price: query.max_price,
        search: validation::non_empty(query.search),
    };

    let result = state
        .store()
        .list_products(&filter, sort, descending, page, limit)
        .await?;

    let products = result
        .items
        .into_iter()
        .map(ListedProductDto::from)
        .collect();

    Ok(Json(ProductListResponse {
        products,
        pagination: Pagination {
            page,
            limit,
            total: result.total,
            total_pages: result.total_pages,
        },
    }))
}

/// GET /products/{id}
/// Get a single product with seller info and its reviews, newest first
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ProductDetailsDto>, ApiError> {
    let details = state
        .store()
        .get_product_detailed(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    Ok(Json(ProductDetailsDto::from(details)))
}

/// POST /products
/// Create a listing; first listing also creates the seller profile
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductDto>), ApiError> {
    let title = validation::required_field(payload.title, "title")?;
    let description = validation::required_field(payload.description, "description")?;
    let category = validation::required_field(payload.category, "category")?;
    let subcategory = validation::required_field(payload.subcategory, "subcategory")?;
    let condition = validation::required_field(payload.condition, "condition")?;
    let city = validation::required_field(payload.city, "city")?;
    let region = validation::required_field(payload.region, "region")?;
    let price = payload
        .price
        .ok_or_else(|| ApiError::validation("price is required"))
        .and_then(validation::validate_price)?;

    let seller = state
        .store()
        .ensure_seller(auth.user_id, &auth.email)
        .await?;

    let new_product = NewProduct {
        seller_id: seller.id,
        title,
        description,
        price,
        category,
        subcategory,
        condition,
        brand: payload.brand,
        images: serde_json::to_string(&payload.images)?,
        specifications: serde_json::to_string(&payload.specifications)?,
        city,
        region,
        country: state.config().marketplace.default_country.clone(),
    };

    let product = state.store().create_product(new_product).await?;

    info!(
        product_id = product.id,
        seller_id = seller.id,
        "Created product listing"
    );

    Ok((StatusCode::CREATED, Json(ProductDto::from(product))))
}

/// PUT /products/{id}
/// Partially update a listing (owner only)
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductDto>, ApiError> {
    let (product, seller) = load_owned_product(&state, id, auth.user_id).await?;

    if let Some(price) = payload.price {
        validation::validate_price(price)?;
    }

    let changes = ProductChanges {
        title: payload.title,
        description: payload.description,
        price: payload.price,
        category: payload.category,
        subcategory: payload.subcategory,
        condition: payload.condition,
        brand: payload.brand,
        images: payload
            .images
            .map(|v| serde_json::to_string(&v))
            .transpose()?,
        specifications: payload
            .specifications
            .map(|m| serde_json::to_string(&m))
            .transpose()?,
        city: payload.city,
        region: payload.region,
    };

    let updated = state.store().update_product(product, changes).await?;

    info!(product_id = id, seller_id = seller.id, "Updated product");

    Ok(Json(ProductDto::from(updated)))
}

/// DELETE /products/{id}
/// Delete a listing and its reviews (owner only)
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (product, _) = load_owned_product(&state, id, auth.user_id).await?;

    state.store().delete_product(product.id).await?;

    info!(product_id = id, "Deleted product");

    Ok(Json(MessageResponse {
        message: "Product deleted".to_string(),
    }))
}

/// Existence is checked before ownership, so a missing product is a 404
/// and somebody else's product is a 403.
async fn load_owned_product(
    state: &AppState,
    id: i32,
    user_id: i32,
) -> Result<(crate::entities::products::Model, sellers::Model), ApiError> {
    let (product, seller) = state
        .store()
        .get_product_with_seller(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    let seller =
        seller.ok_or_else(|| ApiError::internal(format!("Product {id} has no seller row")))?;

    if seller.user_id != user_id {
        return Err(ApiError::forbidden("You do not own this product"));
    }

    Ok((product, seller))
}
