use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{Product, ProductId},
};

const PRODUCT_COLUMNS: &str =
    "id, title, description, price, city, preview_image_id, user_id, created_at";

/// Read access to the product catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn find_all(&self) -> AppResult<Vec<Product>>;

    /// Exact title match
    async fn find_by_title(&self, title: &str) -> AppResult<Vec<Product>>;

    async fn find_by_id(&self, id: ProductId) -> AppResult<Option<Product>>;

    /// Products for the given ids, in no particular order. Unknown ids are skipped.
    async fn find_all_by_id(&self, ids: &[ProductId]) -> AppResult<Vec<Product>>;

    async fn count(&self) -> AppResult<i64>;
}

/// Postgres-backed catalog
#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn find_all(&self) -> AppResult<Vec<Product>> {
        let query = format!("SELECT {} FROM products ORDER BY id", PRODUCT_COLUMNS);
        let products = sqlx::query_as::<_, Product>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn find_by_title(&self, title: &str) -> AppResult<Vec<Product>> {
        let query = format!(
            "SELECT {} FROM products WHERE title = $1 ORDER BY id",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&query)
            .bind(title)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn find_by_id(&self, id: ProductId) -> AppResult<Option<Product>> {
        let query = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn find_all_by_id(&self, ids: &[ProductId]) -> AppResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT {} FROM products WHERE id = ANY($1)",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&query)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn count(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
