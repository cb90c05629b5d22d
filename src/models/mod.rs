pub mod product;
pub mod recommendation;
pub mod user;

pub use product::{Product, ProductId};
pub use recommendation::{FieldMap, RawRecommendation, ORACLE_FIELDS};
pub use user::User;
