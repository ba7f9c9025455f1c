//! Product catalog with a TTL cache.
//!
//! The backend serves the whole catalog from `/products/all`; filtering,
//! sorting and paging happen in memory with [`CatalogQuery`]. Single
//! products and category counts are cached separately under the same TTL.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use nevyra_core::api::CategorySummary;
use nevyra_core::order::UNKNOWN_PRODUCT_TITLE;
use nevyra_core::{CartEntry, CatalogQuery, OrderLine, Page, Product, ProductId};

use crate::api::CommerceApi;
use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    AllProducts,
    Product(ProductId),
    Categories,
}

#[derive(Debug, Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
    Categories(Arc<Vec<CategorySummary>>),
}

/// Read-only catalog access. Cheap to clone.
#[derive(Clone)]
pub struct Catalog {
    api: Arc<dyn CommerceApi>,
    cache: Cache<CacheKey, CacheValue>,
}

impl Catalog {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1000).time_to_live(ttl).build();
        Self { api, cache }
    }

    /// Every product.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the catalog cannot be fetched.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>> {
        if let Some(CacheValue::Products(products)) = self.cache.get(&CacheKey::AllProducts).await {
            debug!("Cache hit for catalog");
            return Ok(products);
        }

        let products = Arc::new(
            self.api
                .products()
                .await
                .map_err(|e| ClientError::from_api(e, "Failed to load products"))?,
        );
        debug!(count = products.len(), "catalog fetched");
        self.cache
            .insert(CacheKey::AllProducts, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// Filter, sort and page the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the catalog cannot be fetched.
    pub async fn query(&self, query: &CatalogQuery) -> Result<Page<Product>> {
        let products = self.products().await?;
        Ok(query.apply(&products))
    }

    /// One product by id. Served from the full list when it is cached.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` (404) for an unknown id.
    pub async fn product(&self, id: &ProductId) -> Result<Product> {
        if let Some(CacheValue::Products(products)) = self.cache.get(&CacheKey::AllProducts).await
            && let Some(product) = products.iter().find(|p| &p.id == id)
        {
            return Ok(product.clone());
        }
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            return Ok(*product);
        }

        let product = self
            .api
            .product(id)
            .await
            .map_err(|e| ClientError::from_api(e, "Failed to load product"))?;
        self.cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Server-side text search. Not cached.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the search request fails.
    pub async fn search(&self, text: &str) -> Result<Vec<Product>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        self.api
            .search_products(text)
            .await
            .map_err(|e| ClientError::from_api(e, "Search failed"))
    }

    /// Distinct categories with product counts.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    pub async fn categories(&self) -> Result<Arc<Vec<CategorySummary>>> {
        if let Some(CacheValue::Categories(categories)) = self.cache.get(&CacheKey::Categories).await
        {
            return Ok(categories);
        }
        let categories = Arc::new(
            self.api
                .categories()
                .await
                .map_err(|e| ClientError::from_api(e, "Failed to load categories"))?,
        );
        self.cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// Join cart entries with catalog prices. Products missing from the
    /// catalog are priced at zero under a placeholder title.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the catalog cannot be fetched.
    pub async fn price_lines(&self, entries: &[CartEntry]) -> Result<Vec<OrderLine>> {
        let products = self.products().await?;
        Ok(entries
            .iter()
            .map(|entry| {
                let product = products.iter().find(|p| p.id == entry.product_id);
                if product.is_none() {
                    tracing::warn!(product_id = %entry.product_id, "cart item not in catalog");
                }
                OrderLine {
                    product_id: entry.product_id.clone(),
                    title: product.map_or_else(
                        || UNKNOWN_PRODUCT_TITLE.to_string(),
                        |p| p.title.clone(),
                    ),
                    unit_price: product.map_or(Decimal::ZERO, |p| p.price),
                    quantity: entry.quantity,
                }
            })
            .collect())
    }

    /// Drop everything cached.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nevyra_core::{CategoryFilter, SortOrder};

    use super::*;
    use crate::testing::{FakeApi, product};

    fn catalog(api: &Arc<FakeApi>) -> Catalog {
        Catalog::new(api.clone(), Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_products_are_cached() {
        let api = FakeApi::with_products(vec![product("p1", 100, "medical")]);
        let catalog = catalog(&api);

        catalog.products().await.unwrap();
        catalog.products().await.unwrap();
        assert_eq!(FakeApi::calls(&api.product_calls), 1);

        catalog.invalidate();
        catalog.products().await.unwrap();
        assert_eq!(FakeApi::calls(&api.product_calls), 2);
    }

    #[tokio::test]
    async fn test_query_filters_and_sorts() {
        let api = FakeApi::with_products(vec![
            product("a", 300, "fashion"),
            product("b", 100, "beauty"),
            product("c", 200, "groceries"),
        ]);
        let catalog = catalog(&api);

        let page = catalog
            .query(&CatalogQuery {
                category: CategoryFilter::FashionBeauty,
                sort: SortOrder::PriceLow,
                ..CatalogQuery::default()
            })
            .await
            .unwrap();

        let ids: Vec<&str> = page.items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(page.total_items, 2);
    }

    #[tokio::test]
    async fn test_price_lines_unknown_product() {
        let api = FakeApi::with_products(vec![product("p1", 100, "medical")]);
        let catalog = catalog(&api);

        let lines = catalog
            .price_lines(&[CartEntry::new("p1", 2), CartEntry::new("gone", 1)])
            .await
            .unwrap();

        assert_eq!(lines[0].line_total(), Decimal::from(200));
        assert_eq!(lines[1].title, UNKNOWN_PRODUCT_TITLE);
        assert_eq!(lines[1].unit_price, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_product_lookup_uses_cached_list() {
        let api = FakeApi::with_products(vec![product("p1", 100, "medical")]);
        let catalog = catalog(&api);
        catalog.products().await.unwrap();

        let found = catalog.product(&ProductId::new("p1")).await.unwrap();
        assert_eq!(found.price, Decimal::from(100));

        let err = catalog.product(&ProductId::new("zzz")).await.unwrap_err();
        assert_eq!(err.to_string(), "Product not found");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_one_message() {
        let api = FakeApi::new();
        api.state.lock().fail_products = true;
        let err = catalog(&api).products().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to load products");
    }

    #[tokio::test]
    async fn test_blank_search_sends_nothing() {
        let api = FakeApi::with_products(vec![product("p1", 100, "medical")]);
        assert!(catalog(&api).search("   ").await.unwrap().is_empty());
        assert_eq!(catalog(&api).search("product").await.unwrap().len(), 1);
    }
}
