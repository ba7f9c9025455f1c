//! Admin listings and dashboard figures.
//!
//! Pure functions over the stored orders, users and catalog. Cancelled
//! orders are listed but never count towards revenue.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Weekday};
use rust_decimal::{Decimal, RoundingStrategy};

use nevyra_core::api::{
    AdminOrderRow, AnalyticsReport, CategoryShare, CustomerSummary, MonthlyRevenue, WeekdayOrders,
};
use nevyra_core::{Product, ProductId, UserId};

use crate::models::{StoredOrder, User};

/// Category for order lines whose product left the catalog.
const UNCATEGORISED: &str = "Other";

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// One table row per order, in the order given.
#[must_use]
pub fn order_rows(orders: &[StoredOrder], users: &[User]) -> Vec<AdminOrderRow> {
    let emails: HashMap<UserId, &str> = users.iter().map(|u| (u.id, u.email.as_str())).collect();

    orders
        .iter()
        .map(|order| {
            let record = &order.record;
            AdminOrderRow {
                id: record.id,
                customer_email: emails
                    .get(&order.user_id)
                    .map_or_else(String::new, |e| (*e).to_string()),
                customer_name: record.shipping.full_name().trim().to_string(),
                item_count: record.item_count(),
                total: record.totals.total,
                payment_method: record.payment.method,
                status: record.status,
                created_at: record.created_at,
            }
        })
        .collect()
}

/// Every user with their order count and revenue-counting spend.
#[must_use]
pub fn customer_summaries(users: &[User], orders: &[StoredOrder]) -> Vec<CustomerSummary> {
    users
        .iter()
        .map(|user| {
            let placed: Vec<&StoredOrder> =
                orders.iter().filter(|o| o.user_id == user.id).collect();
            CustomerSummary {
                id: user.id,
                email: user.email.as_str().to_string(),
                name: user.name.clone(),
                order_count: placed.len(),
                total_spent: placed
                    .iter()
                    .filter(|o| o.record.status.counts_as_revenue())
                    .map(|o| o.record.totals.total)
                    .sum(),
                joined_at: user.created_at,
            }
        })
        .collect()
}

/// Dashboard figures.
#[must_use]
pub fn analytics(orders: &[StoredOrder], products: &[Product]) -> AnalyticsReport {
    let revenue_orders: Vec<&StoredOrder> = orders
        .iter()
        .filter(|o| o.record.status.counts_as_revenue())
        .collect();

    let total_revenue: Decimal = revenue_orders.iter().map(|o| o.record.totals.total).sum();
    let average_order_value = if revenue_orders.is_empty() {
        Decimal::ZERO
    } else {
        round_cents(total_revenue / Decimal::from(revenue_orders.len()))
    };

    let mut customers: Vec<UserId> = orders.iter().map(|o| o.user_id).collect();
    customers.sort_unstable_by_key(|id| id.as_uuid());
    customers.dedup();

    AnalyticsReport {
        total_revenue,
        order_count: orders.len(),
        customer_count: customers.len(),
        average_order_value,
        revenue_by_month: revenue_by_month(&revenue_orders),
        orders_by_weekday: orders_by_weekday(orders),
        category_share: category_share(&revenue_orders, products),
    }
}

fn revenue_by_month(orders: &[&StoredOrder]) -> Vec<MonthlyRevenue> {
    let mut months: BTreeMap<String, Decimal> = BTreeMap::new();
    for order in orders {
        let month = order.record.created_at.format("%Y-%m").to_string();
        *months.entry(month).or_default() += order.record.totals.total;
    }
    months
        .into_iter()
        .map(|(month, revenue)| MonthlyRevenue { month, revenue })
        .collect()
}

fn orders_by_weekday(orders: &[StoredOrder]) -> Vec<WeekdayOrders> {
    WEEK.iter()
        .map(|day| WeekdayOrders {
            day: day.to_string(),
            orders: orders
                .iter()
                .filter(|o| o.record.created_at.weekday() == *day)
                .count(),
        })
        .collect()
}

/// Line revenue per product category, largest first.
fn category_share(orders: &[&StoredOrder], products: &[Product]) -> Vec<CategoryShare> {
    let categories: HashMap<&ProductId, &str> = products
        .iter()
        .map(|p| (&p.id, p.category.as_str()))
        .collect();

    let mut revenue: BTreeMap<&str, Decimal> = BTreeMap::new();
    for line in orders.iter().flat_map(|o| &o.record.lines) {
        let category = categories
            .get(&line.product_id)
            .copied()
            .unwrap_or(UNCATEGORISED);
        *revenue.entry(category).or_default() += line.line_total();
    }

    let total: Decimal = revenue.values().copied().sum();
    let mut shares: Vec<CategoryShare> = revenue
        .into_iter()
        .map(|(category, revenue)| CategoryShare {
            category: category.to_string(),
            revenue,
            share: if total.is_zero() {
                Decimal::ZERO
            } else {
                round_cents(revenue * Decimal::ONE_HUNDRED / total)
            },
        })
        .collect();
    shares.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.category.cmp(&b.category)));
    shares
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::{TimeZone, Utc};

    use nevyra_core::api::{OrderRecord, PaymentDetails};
    use nevyra_core::{
        AddressInput, CurrencyCode, Email, OrderId, OrderLine, OrderStatus, OrderTotals,
        PaymentMethod,
    };

    use super::*;

    fn product(id: &str, category: &str) -> Product {
        Product {
            id: ProductId::new(id),
            title: id.to_uppercase(),
            description: String::new(),
            price: Decimal::from(100),
            category: category.to_string(),
            image: None,
            rating: 4.0,
            popularity: 0,
            in_stock: true,
            is_new: false,
        }
    }

    fn user(email: &str) -> User {
        User {
            id: UserId::generate(),
            email: Email::parse(email).unwrap(),
            password_hash: String::new(),
            name: None,
            phone: None,
            created_at: Utc::now(),
        }
    }

    /// An order of `quantity` x `product_id` at 100, placed on 2026-03-`day`.
    fn order(user: &User, product_id: &str, quantity: u32, day: u32, status: OrderStatus) -> StoredOrder {
        let lines = vec![OrderLine {
            product_id: ProductId::new(product_id),
            title: product_id.to_uppercase(),
            unit_price: Decimal::from(100),
            quantity,
        }];
        StoredOrder {
            user_id: user.id,
            record: OrderRecord {
                id: OrderId::generate(),
                status,
                payment: PaymentDetails {
                    method: PaymentMethod::Cod,
                    coupon: None,
                    reference: None,
                },
                shipping: AddressInput {
                    first_name: "Asha".into(),
                    last_name: "Rao".into(),
                    ..AddressInput::default()
                },
                totals: OrderTotals::compute(&lines, CurrencyCode::INR),
                lines,
                created_at: Utc.with_ymd_and_hms(2026, 3, day, 10, 0, 0).unwrap(),
            },
        }
    }

    #[test]
    fn test_empty_report() {
        let report = analytics(&[], &[]);
        assert_eq!(report.total_revenue, Decimal::ZERO);
        assert_eq!(report.average_order_value, Decimal::ZERO);
        assert_eq!(report.orders_by_weekday.len(), 7);
        assert_eq!(report.orders_by_weekday[0].day, "Mon");
        assert!(report.category_share.is_empty());
    }

    #[test]
    fn test_cancelled_orders_do_not_count_as_revenue() {
        let asha = user("asha@example.com");
        let orders = vec![
            // 100 + 15 + 8 = 123
            order(&asha, "p1", 1, 2, OrderStatus::Pending),
            // 200 + 15 + 16 = 231
            order(&asha, "p2", 2, 3, OrderStatus::Confirmed),
            order(&asha, "p1", 5, 4, OrderStatus::Cancelled),
        ];
        let products = [product("p1", "Devices"), product("p2", "Sports")];

        let report = analytics(&orders, &products);
        assert_eq!(report.order_count, 3);
        assert_eq!(report.customer_count, 1);
        assert_eq!(report.total_revenue, Decimal::from(354));
        assert_eq!(report.average_order_value, Decimal::from(177));
        assert_eq!(report.revenue_by_month.len(), 1);
        assert_eq!(report.revenue_by_month[0].month, "2026-03");
    }

    #[test]
    fn test_weekday_buckets() {
        let asha = user("asha@example.com");
        // 2026-03-02 is a Monday, 2026-03-08 a Sunday.
        let orders = vec![
            order(&asha, "p1", 1, 2, OrderStatus::Pending),
            order(&asha, "p1", 1, 8, OrderStatus::Cancelled),
        ];
        let report = analytics(&orders, &[]);
        assert_eq!(report.orders_by_weekday[0].orders, 1);
        assert_eq!(report.orders_by_weekday[6].day, "Sun");
        assert_eq!(report.orders_by_weekday[6].orders, 1);
    }

    #[test]
    fn test_category_share() {
        let asha = user("asha@example.com");
        let orders = vec![
            order(&asha, "p1", 3, 2, OrderStatus::Pending),
            order(&asha, "gone", 1, 2, OrderStatus::Pending),
        ];
        let products = [product("p1", "Devices")];

        let shares = analytics(&orders, &products).category_share;
        assert_eq!(shares[0].category, "Devices");
        assert_eq!(shares[0].share, Decimal::from(75));
        assert_eq!(shares[1].category, UNCATEGORISED);
        assert_eq!(shares[1].share, Decimal::from(25));
    }

    #[test]
    fn test_customer_summaries() {
        let asha = user("asha@example.com");
        let ravi = user("ravi@example.com");
        let orders = vec![
            order(&asha, "p1", 1, 2, OrderStatus::Pending),
            order(&asha, "p1", 1, 3, OrderStatus::Cancelled),
        ];

        let summaries = customer_summaries(&[asha, ravi], &orders);
        assert_eq!(summaries[0].order_count, 2);
        assert_eq!(summaries[0].total_spent, Decimal::from(123));
        assert_eq!(summaries[1].order_count, 0);
        assert_eq!(summaries[1].total_spent, Decimal::ZERO);
    }

    #[test]
    fn test_order_rows() {
        let asha = user("asha@example.com");
        let orders = vec![order(&asha, "p1", 2, 2, OrderStatus::Pending)];
        let rows = order_rows(&orders, std::slice::from_ref(&asha));
        assert_eq!(rows[0].customer_email, "asha@example.com");
        assert_eq!(rows[0].customer_name, "Asha Rao");
        assert_eq!(rows[0].item_count, 2);
        assert_eq!(rows[0].total, Decimal::from(231));
    }
}
