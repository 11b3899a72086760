use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{products, reviews, sellers, users};

pub mod migrator;
pub mod repositories;

pub use repositories::product::{
    ListedProduct, NewProduct, ProductChanges, ProductDetails, ProductFilter, ProductPage,
    SortField,
};
pub use repositories::review::{NewReview, ReviewChanges};
pub use repositories::user::{NewUser, User, UserChanges};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn seller_repo(&self) -> repositories::seller::SellerRepository {
        repositories::seller::SellerRepository::new(self.conn.clone())
    }

    fn product_repo(&self) -> repositories::product::ProductRepository {
        repositories::product::ProductRepository::new(self.conn.clone())
    }

    fn review_repo(&self) -> repositories::review::ReviewRepository {
        repositories::review::ReviewRepository::new(self.conn.clone())
    }

    // ---- users ----

    /// Returns `None` when the email is already registered.
    pub async fn create_user(
        &self,
        new_user: NewUser,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo().create(new_user, security).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn update_user(
        &self,
        id: i32,
        changes: UserChanges,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo().update(id, changes, security).await
    }

    // ---- sellers ----

    /// Find-or-create the seller profile for a user; flips the user's
    /// seller flag the first time.
    pub async fn ensure_seller(&self, user_id: i32, email: &str) -> Result<sellers::Model> {
        let (seller, created) = self.seller_repo().ensure_for_user(user_id, email).await?;
        if created {
            self.user_repo().mark_as_seller(user_id).await?;
            info!(user_id, seller_id = seller.id, "Created seller profile");
        }
        Ok(seller)
    }

    pub async fn get_seller_by_user_id(&self, user_id: i32) -> Result<Option<sellers::Model>> {
        self.seller_repo().get_by_user_id(user_id).await
    }

    // ---- products ----

    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        sort: SortField,
        descending: bool,
        page: u64,
        limit: u64,
    ) -> Result<ProductPage> {
        self.product_repo()
            .list(filter, sort, descending, page, limit)
            .await
    }

    pub async fn get_product_detailed(&self, id: i32) -> Result<Option<ProductDetails>> {
        self.product_repo().get_detailed(id).await
    }

    pub async fn get_product_with_seller(
        &self,
        id: i32,
    ) -> Result<Option<(products::Model, Option<sellers::Model>)>> {
        self.product_repo().get_with_seller(id).await
    }

    pub async fn create_product(&self, new_product: NewProduct) -> Result<products::Model> {
        self.product_repo().create(new_product).await
    }

    pub async fn update_product(
        &self,
        product: products::Model,
        changes: ProductChanges,
    ) -> Result<products::Model> {
        self.product_repo().update(product, changes).await
    }

    pub async fn delete_product(&self, id: i32) -> Result<bool> {
        self.product_repo().delete_cascading(id).await
    }

    pub async fn list_seller_products(&self, seller_id: i32) -> Result<Vec<products::Model>> {
        self.product_repo().list_by_seller(seller_id).await
    }

    // ---- reviews ----

    pub async fn get_review(&self, id: i32) -> Result<Option<reviews::Model>> {
        self.review_repo().get(id).await
    }

    pub async fn get_review_with_reviewer(
        &self,
        id: i32,
    ) -> Result<Option<(reviews::Model, Option<users::Model>)>> {
        self.review_repo().get_with_reviewer(id).await
    }

    pub async fn create_review(&self, new_review: NewReview) -> Result<reviews::Model> {
        self.review_repo().create(new_review).await
    }

    pub async fn update_review(
        &self,
        review: reviews::Model,
        changes: ReviewChanges,
    ) -> Result<reviews::Model> {
        self.review_repo().update(review, changes).await
    }

    pub async fn delete_review(&self, id: i32) -> Result<bool> {
        self.review_repo().delete(id).await
    }
}
