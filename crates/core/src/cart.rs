//! Cart entries and the pure cart operations.
//!
//! ## Invariants
//! - Entries are unique by `product_id` (adding the same product increases quantity)
//! - Quantity is always > 0 (setting it to 0 or below removes the entry)
//! - Insertion order is preserved
//!
//! The client cart store persists a [`Cart`]; the backend receives the same
//! entries as order items.

use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// One product and how many of it the shopper wants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartEntry {
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// An ordered, duplicate-free list of cart entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a cart from loosely-typed pairs, enforcing the invariants.
    ///
    /// Non-positive quantities are dropped and repeated product ids are
    /// merged into the first occurrence.
    pub fn normalized<I, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, i64)>,
        P: Into<ProductId>,
    {
        let mut cart = Self::new();
        for (product_id, quantity) in pairs {
            if let Ok(quantity) = u32::try_from(quantity)
                && quantity > 0
            {
                cart.add(product_id, quantity);
            }
        }
        cart
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    /// Consume the cart, returning its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<CartEntry> {
        self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Sum of all quantities (the navigation badge count).
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.quantity)).sum()
    }

    /// Quantity of one product, if present.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| &e.product_id == product_id)
            .map(|e| e.quantity)
    }

    /// Add `quantity` of a product, incrementing an existing entry.
    ///
    /// Adding zero is a no-op. Returns whether the cart changed.
    pub fn add(&mut self, product_id: impl Into<ProductId>, quantity: u32) -> bool {
        if quantity == 0 {
            return false;
        }
        let product_id = product_id.into();
        if let Some(entry) = self.entries.iter_mut().find(|e| e.product_id == product_id) {
            entry.quantity = entry.quantity.saturating_add(quantity);
        } else {
            self.entries.push(CartEntry {
                product_id,
                quantity,
            });
        }
        true
    }

    /// Remove a product. Returns whether it was present.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.product_id != product_id);
        self.entries.len() != before
    }

    /// Set the quantity of a product already in the cart.
    ///
    /// A quantity of zero or below is exactly [`Cart::remove`]. Unknown
    /// products are left alone. Returns whether the cart changed.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) -> bool {
        let Ok(quantity) = u32::try_from(quantity) else {
            return if quantity <= 0 {
                self.remove(product_id)
            } else {
                self.set_existing(product_id, u32::MAX)
            };
        };
        if quantity == 0 {
            return self.remove(product_id);
        }
        self.set_existing(product_id, quantity)
    }

    fn set_existing(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        match self.entries.iter_mut().find(|e| &e.product_id == product_id) {
            Some(entry) if entry.quantity != quantity => {
                entry.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl FromIterator<CartEntry> for Cart {
    fn from_iter<T: IntoIterator<Item = CartEntry>>(iter: T) -> Self {
        Self::normalized(
            iter.into_iter()
                .map(|e| (e.product_id, i64::from(e.quantity))),
        )
    }
}

impl From<Cart> for Vec<CartEntry> {
    fn from(cart: Cart) -> Self {
        cart.entries
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ProductId {
        ProductId::new(s)
    }

    fn assert_invariants(cart: &Cart) {
        let mut seen = std::collections::HashSet::new();
        for entry in cart.entries() {
            assert!(entry.quantity > 0, "non-positive quantity in {cart:?}");
            assert!(seen.insert(entry.product_id.clone()), "duplicate in {cart:?}");
        }
    }

    #[test]
    fn test_add_new_and_existing() {
        let mut cart = Cart::new();
        assert!(cart.add("p1", 1));
        assert!(cart.add("p2", 3));
        assert!(cart.add("p1", 2));

        assert_eq!(
            cart.entries(),
            &[CartEntry::new("p1", 3), CartEntry::new("p2", 3)]
        );
        assert_eq!(cart.total_quantity(), 6);
    }

    #[test]
    fn test_add_zero_is_noop() {
        let mut cart = Cart::new();
        assert!(!cart.add("p1", 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_zero_equals_remove() {
        let mut a = Cart::new();
        a.add("p1", 2);
        a.add("p2", 1);
        let mut b = a.clone();

        a.update_quantity(&pid("p1"), 0);
        b.remove(&pid("p1"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_update_quantity_negative_removes() {
        let mut cart = Cart::new();
        cart.add("p1", 2);
        assert!(cart.update_quantity(&pid("p1"), -4));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_unknown_is_noop() {
        let mut cart = Cart::new();
        cart.add("p1", 2);
        assert!(!cart.update_quantity(&pid("p9"), 5));
        assert_eq!(cart.entries(), &[CartEntry::new("p1", 2)]);
    }

    #[test]
    fn test_update_quantity_in_place_keeps_order() {
        let mut cart = Cart::new();
        cart.add("p1", 1);
        cart.add("p2", 1);
        cart.update_quantity(&pid("p1"), 7);
        assert_eq!(cart.entries()[0], CartEntry::new("p1", 7));
        assert_eq!(cart.entries()[1], CartEntry::new("p2", 1));
    }

    #[test]
    fn test_normalized_drops_and_merges() {
        let cart = Cart::normalized([("p1", 2), ("p2", 0), ("p1", 1), ("p3", -1)]);
        assert_eq!(cart.entries(), &[CartEntry::new("p1", 3)]);
    }

    #[test]
    fn test_invariants_hold_over_mixed_sequence() {
        let mut cart = Cart::new();
        let ops: [(&str, i64); 12] = [
            ("a", 1),
            ("b", 2),
            ("a", 0),
            ("c", -2),
            ("b", 5),
            ("a", 3),
            ("c", 1),
            ("b", -1),
            ("c", 4),
            ("a", 2),
            ("d", 0),
            ("c", 0),
        ];
        for (i, (id, qty)) in ops.into_iter().enumerate() {
            match i % 3 {
                0 => {
                    cart.add(id, u32::try_from(qty.max(0)).unwrap());
                }
                1 => {
                    cart.update_quantity(&pid(id), qty);
                }
                _ => {
                    cart.remove(&pid(id));
                }
            }
            assert_invariants(&cart);
        }
    }

    #[test]
    fn test_wire_format() {
        let mut cart = Cart::new();
        cart.add("p1", 2);
        let json = serde_json::to_string(&cart).unwrap();
        assert_eq!(json, r#"[{"productId":"p1","quantity":2}]"#);
    }
}
