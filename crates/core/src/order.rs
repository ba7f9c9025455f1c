//! Order line items and totals.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::{CurrencyCode, Money, ProductId};

/// Flat shipping charge for any non-empty order, in whole currency units.
pub const FLAT_SHIPPING: Decimal = Decimal::from_parts(15, 0, 0, false, 0);

/// Sales tax rate (8%).
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Share of the total shown as a coupon discount (10%).
pub const COUPON_DISCOUNT_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Title shown for cart entries the catalog no longer knows.
pub const UNKNOWN_PRODUCT_TITLE: &str = "Unknown Product";

/// A priced line: a cart entry joined with its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderLine {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Subtotal, shipping, tax and grand total for a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub currency: CurrencyCode,
}

impl OrderTotals {
    /// Price a set of lines.
    ///
    /// Tax is 8% of the subtotal rounded half away from zero to whole units.
    /// Shipping is flat and only charged when there is something to ship.
    #[must_use]
    pub fn compute(lines: &[OrderLine], currency: CurrencyCode) -> Self {
        let subtotal: Decimal = lines.iter().map(OrderLine::line_total).sum();
        let shipping = if lines.iter().any(|l| l.quantity > 0) {
            FLAT_SHIPPING
        } else {
            Decimal::ZERO
        };
        let tax = (subtotal * TAX_RATE)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
            currency,
        }
    }

    /// Discount displayed for an applied coupon: 10% of the total, rounded
    /// half away from zero to whole units.
    ///
    /// Display only. The gateway amount and the backend total stay at
    /// [`total`](Self::total).
    #[must_use]
    pub fn coupon_discount(&self) -> Decimal {
        (self.total * COUPON_DISCOUNT_RATE)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Grand total as [`Money`].
    #[must_use]
    pub const fn total_money(&self) -> Money {
        Money::new(self.total, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, price: i64, quantity: u32) -> OrderLine {
        OrderLine {
            product_id: ProductId::new(id),
            title: id.to_uppercase(),
            unit_price: Decimal::from(price),
            quantity,
        }
    }

    #[test]
    fn test_two_of_one_hundred() {
        let totals = OrderTotals::compute(&[line("p1", 100, 2)], CurrencyCode::INR);
        assert_eq!(totals.subtotal, Decimal::from(200));
        assert_eq!(totals.shipping, Decimal::from(15));
        assert_eq!(totals.tax, Decimal::from(16));
        assert_eq!(totals.total, Decimal::from(231));
    }

    #[test]
    fn test_tax_rounds_half_away_from_zero() {
        // 8% of 25 = 2.00, of 31.25 = 2.50 -> 3
        let totals = OrderTotals::compute(
            &[OrderLine {
                unit_price: Decimal::new(3125, 2),
                ..line("p2", 0, 1)
            }],
            CurrencyCode::INR,
        );
        assert_eq!(totals.tax, Decimal::from(3));
    }

    #[test]
    fn test_empty_order_has_no_shipping() {
        let totals = OrderTotals::compute(&[], CurrencyCode::INR);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_coupon_discount_rounds_to_whole_units() {
        let totals = OrderTotals::compute(&[line("p1", 100, 2)], CurrencyCode::INR);
        // 10% of 231 = 23.1
        assert_eq!(totals.coupon_discount(), Decimal::from(23));

        let totals = OrderTotals::compute(&[line("p1", 95, 5)], CurrencyCode::INR);
        // 475 + 15 + 38 = 528 -> 52.8
        assert_eq!(totals.total, Decimal::from(528));
        assert_eq!(totals.coupon_discount(), Decimal::from(53));
    }

    #[test]
    fn test_constants() {
        assert_eq!(FLAT_SHIPPING, Decimal::from(15));
        assert_eq!(TAX_RATE, Decimal::new(8, 2));
    }
}
