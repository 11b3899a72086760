use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub seller_id: i32,

    pub title: String,

    pub description: String,

    pub price: f64,

    pub category: String,

    pub subcategory: String,

    /// Free-form condition label ("new", "used", ...).
    pub condition: String,

    pub brand: Option<String>,

    /// JSON array of image URLs.
    pub images: String,

    /// JSON object of free-form attribute/value pairs.
    pub specifications: String,

    pub city: String,

    pub region: String,

    pub country: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sellers::Entity",
        from = "Column::SellerId",
        to = "super::sellers::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Sellers,
    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,
}

impl Related<super::sellers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sellers.def()
    }
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
