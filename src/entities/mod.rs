pub mod prelude;

pub mod products;
pub mod reviews;
pub mod sellers;
pub mod users;
