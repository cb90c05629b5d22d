use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{Product, ProductId, User},
    routes::AppState,
};

/// Identity of the caller, set by the upstream authentication layer
pub const USER_EMAIL_HEADER: &str = "x-user-email";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    title: Option<String>,
}

/// Handler for the product listing endpoint
///
/// With a title, searches the catalog. Without one, returns recommendations
/// for the caller.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let user = current_user(&state, &headers).await?;
    let title = params.title.as_deref();

    tracing::info!(
        request_id = %request_id,
        authenticated = user.is_some(),
        title = ?title,
        "Processing product listing request"
    );

    match state.products.get_products(title, user.as_ref()).await {
        Ok(products) => Ok(Json(products)),
        Err(e) if e.is_recoverable() && state.fallback_to_listing => {
            tracing::warn!(
                request_id = %request_id,
                error = %e,
                "Recommendations unavailable, serving plain listing"
            );
            let products = state.products.list_products(None).await?;
            Ok(Json(products))
        }
        Err(e) => Err(e),
    }
}

/// Handler for a single product
pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProductId>,
) -> AppResult<Json<Product>> {
    let product = state.products.get_product(id).await?;
    Ok(Json(product))
}

async fn current_user(state: &AppState, headers: &HeaderMap) -> AppResult<Option<User>> {
    let email = headers
        .get(USER_EMAIL_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match email {
        Some(email) => state.users.find_by_email(email).await,
        None => Ok(None),
    }
}
