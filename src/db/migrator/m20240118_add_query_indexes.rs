use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Listing sorts on created_at by default; category is the most
        // selective common filter.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_products_created_at")
                    .table(Products::Table)
                    .col(Products::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_products_category")
                    .table(Products::Table)
                    .col(Products::Category)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_products_seller_id")
                    .table(Products::Table)
                    .col(Products::SellerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_reviews_product_id")
                    .table(Reviews::Table)
                    .col(Reviews::ProductId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_reviews_user_id")
                    .table(Reviews::Table)
                    .col(Reviews::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_reviews_user_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_reviews_product_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_products_seller_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_products_category").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_products_created_at").to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Products {
    Table,
    SellerId,
    Category,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Reviews {
    Table,
    ProductId,
    UserId,
}
