use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    db::CatalogRepository,
    error::{AppError, AppResult},
    models::{Product, ProductId, User},
    services::{normalizer::IdNormalizer, recommendation_client::RecommendationClient},
};

/// How a listing request for an authenticated user is served
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductsPlan {
    /// Nothing can be shown
    Empty,
    /// Exact title search, the recommendation service is not consulted
    TitleSearch(String),
    /// Ask the recommendation service and normalize against this catalog size
    Recommend { catalog_size: i64 },
}

impl ProductsPlan {
    /// Rules are checked in order; the first match wins:
    /// 1. empty catalog → `Empty`
    /// 2. non-empty query → `TitleSearch`
    /// 3. otherwise → `Recommend`
    pub fn decide(query: Option<&str>, catalog_size: i64) -> Self {
        if catalog_size <= 0 {
            return ProductsPlan::Empty;
        }
        match query {
            Some(q) if !q.is_empty() => ProductsPlan::TitleSearch(q.to_string()),
            _ => ProductsPlan::Recommend { catalog_size },
        }
    }
}

/// Serves product listings, choosing between title search and recommendations
pub struct ProductService {
    catalog: Arc<dyn CatalogRepository>,
    recommender: Arc<dyn RecommendationClient>,
    normalizer: IdNormalizer,
}

impl ProductService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        recommender: Arc<dyn RecommendationClient>,
        normalizer: IdNormalizer,
    ) -> Self {
        Self {
            catalog,
            recommender,
            normalizer,
        }
    }

    /// Products for a user, either matching `query` or recommended
    ///
    /// Anonymous users and empty catalogs get an empty list. Recommendation
    /// service failures are returned as errors so the caller can pick a fallback.
    pub async fn get_products(
        &self,
        query: Option<&str>,
        user: Option<&User>,
    ) -> AppResult<Vec<Product>> {
        let Some(user) = user else {
            tracing::debug!("No authenticated user, returning no products");
            return Ok(Vec::new());
        };

        let catalog_size = self.count_products().await?;
        tracing::debug!(catalog_size, user_id = user.id, "Resolving product listing");

        match ProductsPlan::decide(query, catalog_size) {
            ProductsPlan::Empty => Ok(Vec::new()),
            ProductsPlan::TitleSearch(title) => self.catalog.find_by_title(&title).await,
            ProductsPlan::Recommend { catalog_size } => {
                self.recommended_for(user, catalog_size).await
            }
        }
    }

    async fn recommended_for(&self, user: &User, catalog_size: i64) -> AppResult<Vec<Product>> {
        let raw = self.recommender.fetch(user.id).await.map_err(|e| {
            tracing::warn!(
                error = %e,
                user_id = user.id,
                client = self.recommender.name(),
                "Recommendation fetch failed"
            );
            e
        })?;

        if raw.is_empty() {
            tracing::info!(user_id = user.id, "No recommendations available");
            return Ok(Vec::new());
        }

        let ids = self.normalizer.normalize(&raw, catalog_size);
        let products = self.resolve_in_order(&ids).await?;

        tracing::info!(
            user_id = user.id,
            catalog_size,
            raw = raw.len(),
            normalized = ids.len(),
            resolved = products.len(),
            "Recommended products resolved"
        );

        Ok(products)
    }

    /// Loads products for `ids`, keeping the order of `ids` and skipping missing ones
    async fn resolve_in_order(&self, ids: &[ProductId]) -> AppResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_id: HashMap<ProductId, Product> = self
            .catalog
            .find_all_by_id(ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let products: Vec<Product> = ids.iter().filter_map(|id| by_id.remove(id)).collect();

        if products.len() < ids.len() {
            tracing::debug!(
                requested = ids.len(),
                found = products.len(),
                "Dropped stale recommended ids"
            );
        }

        Ok(products)
    }

    /// Title search when `title` is given, otherwise every product
    pub async fn list_products(&self, title: Option<&str>) -> AppResult<Vec<Product>> {
        match title {
            Some(title) => self.catalog.find_by_title(title).await,
            None => self.catalog.find_all().await,
        }
    }

    pub async fn get_product(&self, id: ProductId) -> AppResult<Product> {
        self.catalog
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product with id = {} is not found", id)))
    }

    pub async fn count_products(&self) -> AppResult<i64> {
        self.catalog.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::catalog::MockCatalogRepository,
        error::NetworkErrorKind,
        models::RawRecommendation,
        services::recommendation_client::MockRecommendationClient,
    };
    use chrono::DateTime;

    fn product(id: ProductId) -> Product {
        Product {
            id,
            title: format!("Tool {}", id),
            description: None,
            price: 100,
            city: None,
            preview_image_id: None,
            user_id: None,
            created_at: DateTime::from_timestamp(0, 0).unwrap(),
        }
    }

    fn user() -> User {
        User {
            id: 11,
            email: "renter@example.com".to_string(),
            name: None,
        }
    }

    fn service(catalog: MockCatalogRepository, client: MockRecommendationClient) -> ProductService {
        ProductService::new(Arc::new(catalog), Arc::new(client), IdNormalizer::default())
    }

    fn quiet_client() -> MockRecommendationClient {
        let mut client = MockRecommendationClient::new();
        client.expect_name().return_const("mock");
        client
    }

    #[test]
    fn test_plan_empty_catalog_wins() {
        assert_eq!(ProductsPlan::decide(Some("hammer"), 0), ProductsPlan::Empty);
        assert_eq!(ProductsPlan::decide(None, -3), ProductsPlan::Empty);
    }

    #[test]
    fn test_plan_title_search() {
        assert_eq!(
            ProductsPlan::decide(Some("hammer"), 5),
            ProductsPlan::TitleSearch("hammer".to_string())
        );
    }

    #[test]
    fn test_plan_recommend_on_missing_or_empty_query() {
        assert_eq!(
            ProductsPlan::decide(None, 5),
            ProductsPlan::Recommend { catalog_size: 5 }
        );
        assert_eq!(
            ProductsPlan::decide(Some(""), 5),
            ProductsPlan::Recommend { catalog_size: 5 }
        );
    }

    #[tokio::test]
    async fn test_no_user_returns_empty_without_calls() {
        let mut catalog = MockCatalogRepository::new();
        catalog.expect_count().never();
        let mut client = quiet_client();
        client.expect_fetch().never();

        let products = service(catalog, client).get_products(None, None).await.unwrap();
        assert!(products.is_empty());
    }

    #[tokio::test]
    async fn test_empty_catalog_returns_empty() {
        let mut catalog = MockCatalogRepository::new();
        catalog.expect_count().times(1).returning(|| Ok(0));
        let mut client = quiet_client();
        client.expect_fetch().never();

        let products = service(catalog, client)
            .get_products(None, Some(&user()))
            .await
            .unwrap();
        assert!(products.is_empty());
    }

    #[tokio::test]
    async fn test_query_bypasses_recommendations() {
        let mut catalog = MockCatalogRepository::new();
        catalog.expect_count().returning(|| Ok(40));
        catalog
            .expect_find_by_title()
            .withf(|title| title.to_string() == "hammer")
            .times(1)
            .returning(|_| Ok(vec![product(3)]));
        let mut client = quiet_client();
        client.expect_fetch().times(0);

        let products = tokio_test::assert_ok!(
            service(catalog, client)
                .get_products(Some("hammer"), Some(&user()))
                .await
        );
        assert_eq!(products, vec![product(3)]);
    }

    #[tokio::test]
    async fn test_recommendations_resolved_in_normalized_order() {
        let mut catalog = MockCatalogRepository::new();
        catalog.expect_count().returning(|| Ok(5));
        catalog
            .expect_find_all_by_id()
            .withf(|ids| ids.to_vec() == vec![1, 2, 4])
            .times(1)
            // Repository order is arbitrary
            .returning(|_| Ok(vec![product(4), product(1), product(2)]));

        let mut client = quiet_client();
        client
            .expect_fetch()
            .withf(|user_id| *user_id == 11)
            .times(1)
            // 3->4, 5->1, 6->2, 8->4
            .returning(|_| {
                Ok(vec![
                    RawRecommendation::new(3, 0.9),
                    RawRecommendation::new(5, 0.8),
                    RawRecommendation::new(6, 0.7),
                    RawRecommendation::new(8, 0.6),
                ])
            });

        let products = service(catalog, client)
            .get_products(None, Some(&user()))
            .await
            .unwrap();
        let ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
    }

    #[tokio::test]
    async fn test_stale_ids_are_dropped() {
        let mut catalog = MockCatalogRepository::new();
        catalog.expect_count().returning(|| Ok(300));
        catalog
            .expect_find_all_by_id()
            .returning(|_| Ok(vec![product(120)]));

        let mut client = quiet_client();
        client.expect_fetch().returning(|_| {
            Ok(vec![
                RawRecommendation::new(120, 1.0),
                RawRecommendation::new(15, 0.5),
            ])
        });

        let products = service(catalog, client)
            .get_products(Some(""), Some(&user()))
            .await
            .unwrap();
        assert_eq!(products, vec![product(120)]);
    }

    #[tokio::test]
    async fn test_empty_recommendations_skip_lookup() {
        let mut catalog = MockCatalogRepository::new();
        catalog.expect_count().returning(|| Ok(50));
        catalog.expect_find_all_by_id().never();

        let mut client = quiet_client();
        client.expect_fetch().returning(|_| Ok(Vec::new()));

        let products = service(catalog, client)
            .get_products(None, Some(&user()))
            .await
            .unwrap();
        assert!(products.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_propagates_as_network_error() {
        let mut catalog = MockCatalogRepository::new();
        catalog.expect_count().returning(|| Ok(50));
        catalog.expect_find_all_by_id().never();

        let mut client = quiet_client();
        client
            .expect_fetch()
            .times(1)
            .returning(|_| Err(AppError::network(NetworkErrorKind::Timeout, "timed out")));

        let result = service(catalog, client)
            .get_products(None, Some(&user()))
            .await;
        assert!(matches!(
            result,
            Err(AppError::Network {
                kind: NetworkErrorKind::Timeout,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_decode_error_propagates() {
        let mut catalog = MockCatalogRepository::new();
        catalog.expect_count().returning(|| Ok(50));

        let mut client = quiet_client();
        client
            .expect_fetch()
            .returning(|_| Err(AppError::Decode("field `id` is not a valid integer".to_string())));

        let err = tokio_test::assert_err!(
            service(catalog, client)
                .get_products(None, Some(&user()))
                .await
        );
        assert!(err.is_recoverable());
        assert!(matches!(err, AppError::Decode(_)));
    }

    #[tokio::test]
    async fn test_list_products_without_title_lists_all() {
        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_find_all()
            .times(1)
            .returning(|| Ok(vec![product(1), product(2)]));
        catalog.expect_find_by_title().never();

        let products = service(catalog, quiet_client())
            .list_products(None)
            .await
            .unwrap();
        assert_eq!(products.len(), 2);
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let mut catalog = MockCatalogRepository::new();
        catalog.expect_find_by_id().returning(|_| Ok(None));

        let result = service(catalog, quiet_client()).get_product(99).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
