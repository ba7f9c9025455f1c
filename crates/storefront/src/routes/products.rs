//! Catalog routes.

use axum::extract::State;
use serde::Deserialize;

use nevyra_core::api::CategorySummary;
use nevyra_core::catalog::DEFAULT_PAGE_SIZE;
use nevyra_core::{CatalogQuery, CategoryFilter, Page, Product, ProductId, SortOrder};

use super::{ApiResult, ok};
use crate::db::products::ProductRepository;
use crate::error::AppError;
use crate::extract::{ApiPath, ApiQuery};
use crate::state::AppState;

/// Largest page the listing serves.
const MAX_PAGE_SIZE: usize = 100;

/// Query string of the paginated listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub sort: Option<SortOrder>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// GET /api/products/all
pub async fn all(State(state): State<AppState>) -> ApiResult<Vec<Product>> {
    Ok(ok(ProductRepository::new(state.db()).list().await))
}

/// GET /api/products?page&limit
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Page<Product>> {
    let products = ProductRepository::new(state.db()).list().await;
    let query = CatalogQuery {
        category: params
            .category
            .as_deref()
            .map(|c| c.parse().unwrap_or_default())
            .unwrap_or_default(),
        sort: params.sort.unwrap_or_default(),
        page: params.page.unwrap_or(1),
        per_page: params
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE),
        ..CatalogQuery::default()
    };
    Ok(ok(query.apply(&products)))
}

/// GET /api/products/search?q=
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> ApiResult<Vec<Product>> {
    Ok(ok(ProductRepository::new(state.db()).search(&params.q).await))
}

/// GET /api/products/category/{category}
pub async fn by_category(
    State(state): State<AppState>,
    ApiPath(category): ApiPath<String>,
) -> ApiResult<Vec<Product>> {
    let filter: CategoryFilter = category.parse().unwrap_or_default();
    Ok(ok(ProductRepository::new(state.db()).by_category(&filter).await))
}

/// GET /api/products/{id}
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Product> {
    ProductRepository::new(state.db())
        .get(&ProductId::new(id))
        .await
        .map(ok)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// GET /api/categories
pub async fn categories(State(state): State<AppState>) -> ApiResult<Vec<CategorySummary>> {
    Ok(ok(ProductRepository::new(state.db()).categories().await))
}
