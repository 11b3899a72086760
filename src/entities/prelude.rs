pub use super::products::Entity as Products;
pub use super::reviews::Entity as Reviews;
pub use super::sellers::Entity as Sellers;
pub use super::users::Entity as Users;
