//! Catalog repository.

use std::collections::BTreeMap;

use nevyra_core::api::CategorySummary;
use nevyra_core::{CategoryFilter, Product, ProductId};

use super::Database;

pub struct ProductRepository<'a> {
    db: &'a Database,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Vec<Product> {
        self.db.read().await.products.clone()
    }

    pub async fn get(&self, id: &ProductId) -> Option<Product> {
        self.db
            .read()
            .await
            .products
            .iter()
            .find(|p| &p.id == id)
            .cloned()
    }

    /// Products whose title, description or category contains `query`.
    /// A blank query matches nothing.
    pub async fn search(&self, query: &str) -> Vec<Product> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        self.db
            .read()
            .await
            .products
            .iter()
            .filter(|p| p.matches_text(query))
            .cloned()
            .collect()
    }

    pub async fn by_category(&self, filter: &CategoryFilter) -> Vec<Product> {
        self.db
            .read()
            .await
            .products
            .iter()
            .filter(|p| filter.matches(&p.category))
            .cloned()
            .collect()
    }

    /// Distinct categories with product counts, by name.
    pub async fn categories(&self) -> Vec<CategorySummary> {
        let collections = self.db.read().await;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for product in &collections.products {
            *counts.entry(product.category.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(name, product_count)| CategorySummary {
                name: name.to_string(),
                product_count,
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::seed;

    #[tokio::test]
    async fn test_categories_are_counted() {
        let db = Database::with_products(seed::demo_catalog());
        let categories = ProductRepository::new(&db).categories().await;
        let total: usize = categories.iter().map(|c| c.product_count).sum();
        assert_eq!(total, seed::demo_catalog().len());
        assert!(categories.windows(2).all(|w| w[0].name < w[1].name));
    }

    #[tokio::test]
    async fn test_blank_search_is_empty() {
        let db = Database::with_products(seed::demo_catalog());
        assert!(ProductRepository::new(&db).search("  ").await.is_empty());
    }

    #[tokio::test]
    async fn test_category_aliases() {
        let db = Database::with_products(seed::demo_catalog());
        let products = ProductRepository::new(&db)
            .by_category(&CategoryFilter::FashionBeauty)
            .await;
        assert!(!products.is_empty());
        assert!(
            products
                .iter()
                .all(|p| CategoryFilter::FashionBeauty.matches(&p.category))
        );
    }
}
