//! Products and in-memory catalog queries.
//!
//! The whole catalog is small enough to fetch once; filtering, sorting and
//! pagination happen on the fetched list.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Default page size for product listings.
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default)]
    pub is_new: bool,
}

const fn default_in_stock() -> bool {
    true
}

impl Product {
    /// Case-insensitive match on title, description or category.
    #[must_use]
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self.category.to_lowercase().contains(&needle)
    }
}

/// Storefront category groups. Several raw product categories can fall
/// under one group.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Medical,
    Groceries,
    FashionBeauty,
    Devices,
    Electrical,
    Automotive,
    Sports,
    HomeInterior,
    /// Any other category, matched case-insensitively.
    Named(String),
}

impl CategoryFilter {
    /// Whether a product's raw category belongs to this group.
    #[must_use]
    pub fn matches(&self, category: &str) -> bool {
        let cat = category.trim().to_lowercase();
        match self {
            Self::All => true,
            Self::Medical => cat == "medical",
            Self::Groceries => cat == "groceries",
            Self::FashionBeauty => matches!(cat.as_str(), "fashion" | "beauty" | "fashion & beauty"),
            Self::Devices => cat == "devices",
            Self::Electrical => cat == "electrical",
            Self::Automotive => cat == "automotive",
            Self::Sports => cat == "sports",
            Self::HomeInterior => matches!(cat.as_str(), "interior" | "home interior"),
            Self::Named(name) => cat == name.trim().to_lowercase(),
        }
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::All => "All Categories",
            Self::Medical => "Medical & Pharmacy",
            Self::Groceries => "Groceries",
            Self::FashionBeauty => "Fashion & Beauty",
            Self::Devices => "Devices",
            Self::Electrical => "Electrical",
            Self::Automotive => "Automotive",
            Self::Sports => "Sports",
            Self::HomeInterior => "Home Interior",
            Self::Named(name) => name,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        Ok(match key.as_str() {
            "" | "all" => Self::All,
            "medical" => Self::Medical,
            "groceries" => Self::Groceries,
            "fashionbeauty" => Self::FashionBeauty,
            "devices" => Self::Devices,
            "electrical" => Self::Electrical,
            "automotive" => Self::Automotive,
            "sports" => Self::Sports,
            "homeinterior" => Self::HomeInterior,
            _ => Self::Named(s.trim().to_owned()),
        })
    }
}

/// Listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Popular,
    PriceLow,
    PriceHigh,
    Rating,
    Newest,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "popular" => Ok(Self::Popular),
            "price-low" => Ok(Self::PriceLow),
            "price-high" => Ok(Self::PriceHigh),
            "rating" => Ok(Self::Rating),
            "newest" => Ok(Self::Newest),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Popular => "popular",
            Self::PriceLow => "price-low",
            Self::PriceHigh => "price-high",
            Self::Rating => "rating",
            Self::Newest => "newest",
        })
    }
}

/// Filter, sort and page selection over the catalog.
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    pub category: CategoryFilter,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_rating: f32,
    pub in_stock_only: bool,
    pub sort: SortOrder,
    /// 1-based page number.
    pub page: usize,
    pub per_page: usize,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            category: CategoryFilter::All,
            search: None,
            min_price: None,
            max_price: None,
            min_rating: 0.0,
            in_stock_only: false,
            sort: SortOrder::Popular,
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CatalogQuery {
    /// Whether one product passes every filter.
    #[must_use]
    pub fn accepts(&self, product: &Product) -> bool {
        self.category.matches(&product.category)
            && self
                .search
                .as_deref()
                .is_none_or(|needle| product.matches_text(needle))
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
            && product.rating >= self.min_rating
            && (!self.in_stock_only || product.in_stock)
    }

    /// Filter, sort (stable) and slice out the requested page.
    #[must_use]
    pub fn apply(&self, products: &[Product]) -> Page<Product> {
        let mut matched: Vec<Product> = products
            .iter()
            .filter(|p| self.accepts(p))
            .cloned()
            .collect();

        matched.sort_by(|a, b| compare(self.sort, a, b));

        Page::slice(matched, self.page, self.per_page)
    }
}

fn compare(sort: SortOrder, a: &Product, b: &Product) -> Ordering {
    match sort {
        SortOrder::PriceLow => a.price.cmp(&b.price),
        SortOrder::PriceHigh => b.price.cmp(&a.price),
        SortOrder::Newest => b.is_new.cmp(&a.is_new),
        SortOrder::Popular => b.popularity.cmp(&a.popularity),
        SortOrder::Rating => b.rating.total_cmp(&a.rating),
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Cut page `page` (1-based, clamped to at least 1) out of `all`.
    #[must_use]
    pub fn slice(all: Vec<T>, page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let page = page.max(1);
        let total_items = all.len();
        let total_pages = total_items.div_ceil(per_page);
        let items = all
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();

        Self {
            items,
            page,
            per_page,
            total_items,
            total_pages,
        }
    }
}
