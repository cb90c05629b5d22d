use std::sync::Arc;

use catalog_recs::{
    config::Config,
    db::{self, PgCatalogRepository, PgUserRepository},
    routes::{create_router, AppState},
    services::{HttpRecommendationClient, IdNormalizer, ProductService},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("catalog_recs=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::postgres::run_migrations(&pool).await?;

    let recommender =
        HttpRecommendationClient::new(&config.recommend_api_url, config.recommend_timeout())?;
    let normalizer = IdNormalizer::new(config.recommend_result_cap, config.recommend_id_range);

    let products = ProductService::new(
        Arc::new(PgCatalogRepository::new(pool.clone())),
        Arc::new(recommender),
        normalizer,
    );

    let state = Arc::new(AppState {
        products: Arc::new(products),
        users: Arc::new(PgUserRepository::new(pool)),
        fallback_to_listing: config.recommend_fallback_to_listing,
    });

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        address = %address,
        result_cap = config.recommend_result_cap,
        id_range = config.recommend_id_range,
        timeout_secs = config.recommend_timeout_secs,
        "Server running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
