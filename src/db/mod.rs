pub mod catalog;
pub mod postgres;
pub mod users;

pub use catalog::{CatalogRepository, PgCatalogRepository};
pub use postgres::create_pool;
pub use users::{PgUserRepository, UserRepository};
