use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog identifier; recommended ids are normalized into this space
pub type ProductId = i64;

/// A catalog listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: Option<String>,
    /// Price in whole currency units
    pub price: i32,
    pub city: Option<String>,
    pub preview_image_id: Option<i64>,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}
