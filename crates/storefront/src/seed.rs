//! Demo catalog loaded at startup.

use rust_decimal::Decimal;

use nevyra_core::{Product, ProductId};

/// (id, title, category, price, rating, popularity, in stock, new)
type Row = (&'static str, &'static str, &'static str, i64, f32, u32, bool, bool);

const ROWS: &[Row] = &[
    ("p1", "iPhone 15 Pro Max", "Devices", 1199, 4.8, 980, true, true),
    ("p2", "Samsung Galaxy S24 Ultra", "Devices", 1099, 4.7, 870, true, true),
    ("p3", "Sony WH-1000XM5", "Devices", 399, 4.6, 760, true, false),
    ("p4", "Apple MacBook Pro 16\"", "Devices", 2499, 4.9, 540, true, false),
    ("p5", "Logitech MX Master 3S", "Devices", 99, 4.5, 430, false, false),
    ("p6", "Digital Thermometer", "Medical", 12, 4.2, 310, true, false),
    ("p7", "First Aid Kit", "Medical", 25, 4.4, 280, true, false),
    ("p8", "Organic Basmati Rice 5kg", "Groceries", 18, 4.3, 650, true, false),
    ("p9", "Cold Pressed Olive Oil", "Groceries", 14, 4.1, 390, true, true),
    ("p10", "Linen Summer Shirt", "Fashion", 45, 4.0, 520, true, true),
    ("p11", "Vitamin C Face Serum", "Beauty", 29, 4.5, 610, true, false),
    ("p12", "LED Smart Bulb 4-Pack", "Electrical", 35, 4.3, 450, true, false),
    ("p13", "Cordless Drill Driver", "Electrical", 89, 4.6, 220, true, false),
    ("p14", "Dash Camera 4K", "Automotive", 129, 4.2, 180, true, true),
    ("p15", "Yoga Mat Pro", "Sports", 39, 4.7, 720, true, false),
    ("p16", "Ceramic Table Lamp", "Interior", 59, 4.1, 160, true, false),
];

/// The products a fresh backend serves.
#[must_use]
pub fn demo_catalog() -> Vec<Product> {
    ROWS.iter()
        .map(
            |&(id, title, category, price, rating, popularity, in_stock, is_new)| Product {
                id: ProductId::new(id),
                title: title.to_string(),
                description: format!("{title} from the Nevyra {category} range."),
                price: Decimal::from(price),
                category: category.to_string(),
                image: Some(format!("/images/products/{id}.jpg")),
                rating,
                popularity,
                in_stock,
                is_new,
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let catalog = demo_catalog();
        let ids: HashSet<_> = catalog.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn test_prices_are_positive() {
        assert!(demo_catalog().iter().all(|p| p.price > Decimal::ZERO));
    }
}
