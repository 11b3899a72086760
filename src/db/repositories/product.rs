use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, LoaderTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::entities::{prelude::*, products, reviews, sellers, users};

/// Whitelisted listing sort fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Price,
    Title,
}

impl SortField {
    const fn column(self) -> products::Column {
        match self {
            Self::CreatedAt => products::Column::CreatedAt,
            Self::Price => products::Column::Price,
            Self::Title => products::Column::Title,
        }
    }
}

/// Listing filters. Every field is optional; supplied ones are ANDed
/// together, with the search term expanding to an OR across title,
/// description and brand.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub condition: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
}

impl ProductFilter {
    fn condition(&self) -> Condition {
        let mut cond = Condition::all();

        if let Some(category) = &self.category {
            cond = cond.add(products::Column::Category.eq(category.as_str()));
        }
        if let Some(subcategory) = &self.subcategory {
            cond = cond.add(products::Column::Subcategory.eq(subcategory.as_str()));
        }
        if let Some(condition) = &self.condition {
            cond = cond.add(products::Column::Condition.eq(condition.as_str()));
        }
        if let Some(city) = &self.city {
            cond = cond.add(products::Column::City.eq(city.as_str()));
        }
        if let Some(min) = self.min_price {
            cond = cond.add(products::Column::Price.gte(min));
        }
        if let Some(max) = self.max_price {
            cond = cond.add(products::Column::Price.lte(max));
        }
        if let Some(term) = &self.search {
            cond = cond.add(
                Condition::any()
                    .add(ci_like(products::Column::Title, term))
                    .add(ci_like(products::Column::Description, term))
                    .add(ci_like(products::Column::Brand, term)),
            );
        }

        cond
    }
}

/// lower(col) LIKE '%lower(term)%', so matching does not depend on the
/// backend's LIKE collation.
fn ci_like(col: products::Column, term: &str) -> SimpleExpr {
    let pattern = format!("%{}%", term.to_lowercase());
    Expr::expr(Func::lower(Expr::col(col))).like(pattern)
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub seller_id: i32,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub subcategory: String,
    pub condition: String,
    pub brand: Option<String>,
    /// JSON array of image URLs.
    pub images: String,
    /// JSON object of attribute/value pairs.
    pub specifications: String,
    pub city: String,
    pub region: String,
    pub country: String,
}

/// Partial product update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub condition: Option<String>,
    pub brand: Option<String>,
    pub images: Option<String>,
    pub specifications: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
}

/// One listing row: the product, its seller (with the owning user for the
/// name summary) and the ratings used for aggregation.
#[derive(Debug, Clone)]
pub struct ListedProduct {
    pub product: products::Model,
    pub seller: Option<(sellers::Model, Option<users::Model>)>,
    pub reviews: Vec<reviews::Model>,
}

/// Single-product read: reviews carry their reviewer, newest first.
#[derive(Debug, Clone)]
pub struct ProductDetails {
    pub product: products::Model,
    pub seller: Option<(sellers::Model, Option<users::Model>)>,
    pub reviews: Vec<(reviews::Model, Option<users::Model>)>,
}

#[derive(Debug, Clone)]
pub struct ProductPage {
    pub items: Vec<ListedProduct>,
    pub total: u64,
    pub total_pages: u64,
}

pub struct ProductRepository {
    conn: DatabaseConnection,
}

impl ProductRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Count and fetch one page against the same predicate, then batch-load
    /// sellers (with users) and reviews for the page.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        sort: SortField,
        descending: bool,
        page: u64,
        limit: u64,
    ) -> Result<ProductPage> {
        let order = if descending { Order::Desc } else { Order::Asc };

        let paginator = Products::find()
            .filter(filter.condition())
            .order_by(sort.column(), order)
            .paginate(&self.conn, limit);

        let totals = paginator
            .num_items_and_pages()
            .await
            .context("Failed to count products")?;
        let products = paginator
            .fetch_page(page - 1)
            .await
            .context("Failed to fetch product page")?;

        let reviews = products
            .load_many(Reviews, &self.conn)
            .await
            .context("Failed to load reviews for product page")?;

        let seller_ids: Vec<i32> = products.iter().map(|p| p.seller_id).collect();
        let seller_map: HashMap<i32, (sellers::Model, Option<users::Model>)> = Sellers::find()
            .filter(sellers::Column::Id.is_in(seller_ids))
            .find_also_related(Users)
            .all(&self.conn)
            .await
            .context("Failed to load sellers for product page")?
            .into_iter()
            .map(|(seller, user)| (seller.id, (seller, user)))
            .collect();

        let items = products
            .into_iter()
            .zip(reviews)
            .map(|(product, reviews)| {
                let seller = seller_map.get(&product.seller_id).cloned();
                ListedProduct {
                    product,
                    seller,
                    reviews,
                }
            })
            .collect();

        Ok(ProductPage {
            items,
            total: totals.number_of_items,
            total_pages: totals.number_of_pages,
        })
    }

    pub async fn get_detailed(&self, id: i32) -> Result<Option<ProductDetails>> {
        let row = Products::find_by_id(id)
            .find_also_related(Sellers)
            .one(&self.conn)
            .await
            .context("Failed to query product")?;

        let Some((product, seller)) = row else {
            return Ok(None);
        };

        let seller = match seller {
            Some(seller) => {
                let user = Users::find_by_id(seller.user_id)
                    .one(&self.conn)
                    .await
                    .context("Failed to load seller's user")?;
                Some((seller, user))
            }
            None => None,
        };

        let reviews = Reviews::find()
            .filter(reviews::Column::ProductId.eq(id))
            .order_by_desc(reviews::Column::CreatedAt)
            .find_also_related(Users)
            .all(&self.conn)
            .await
            .context("Failed to load reviews")?;

        Ok(Some(ProductDetails {
            product,
            seller,
            reviews,
        }))
    }

    /// Ownership checks need the product and its seller in one round trip.
    pub async fn get_with_seller(
        &self,
        id: i32,
    ) -> Result<Option<(products::Model, Option<sellers::Model>)>> {
        Products::find_by_id(id)
            .find_also_related(Sellers)
            .one(&self.conn)
            .await
            .context("Failed to query product with seller")
    }

    pub async fn create(&self, new_product: NewProduct) -> Result<products::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = products::ActiveModel {
            seller_id: Set(new_product.seller_id),
            title: Set(new_product.title),
            description: Set(new_product.description),
            price: Set(new_product.price),
            category: Set(new_product.category),
            subcategory: Set(new_product.subcategory),
            condition: Set(new_product.condition),
            brand: Set(new_product.brand),
            images: Set(new_product.images),
            specifications: Set(new_product.specifications),
            city: Set(new_product.city),
            region: Set(new_product.region),
            country: Set(new_product.country),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert product")
    }

    /// Apply a partial update to an already-loaded product.
    pub async fn update(
        &self,
        product: products::Model,
        changes: ProductChanges,
    ) -> Result<products::Model> {
        let mut active: products::ActiveModel = product.into();

        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(category) = changes.category {
            active.category = Set(category);
        }
        if let Some(subcategory) = changes.subcategory {
            active.subcategory = Set(subcategory);
        }
        if let Some(condition) = changes.condition {
            active.condition = Set(condition);
        }
        if let Some(brand) = changes.brand {
            active.brand = Set(Some(brand));
        }
        if let Some(images) = changes.images {
            active.images = Set(images);
        }
        if let Some(specifications) = changes.specifications {
            active.specifications = Set(specifications);
        }
        if let Some(city) = changes.city {
            active.city = Set(city);
        }
        if let Some(region) = changes.region {
            active.region = Set(region);
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        active
            .update(&self.conn)
            .await
            .context("Failed to update product")
    }

    /// Delete a product and its reviews atomically.
    pub async fn delete_cascading(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        reviews::Entity::delete_many()
            .filter(reviews::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;

        let result = Products::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn list_by_seller(&self, seller_id: i32) -> Result<Vec<products::Model>> {
        Products::find()
            .filter(products::Column::SellerId.eq(seller_id))
            .order_by_desc(products::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list seller products")
    }
}
