//! Admin listings.
//!
//! # Usage
//!
//! ```bash
//! nevyra admin orders
//! nevyra admin customers
//! nevyra admin products
//! nevyra admin analytics
//! ```
//!
//! The signed-in account must be listed in the backend's
//! `NEVYRA_ADMIN_EMAILS`; other accounts get "Admin access required".

use nevyra_client::{NevyraClient, Result};
use nevyra_core::Money;

use super::say;
use crate::AdminAction;

pub async fn run(client: &NevyraClient, action: AdminAction) -> Result<()> {
    let admin = client.admin();
    let currency = client.config().currency;

    match action {
        AdminAction::Orders => {
            for row in admin.orders().await? {
                say(format!(
                    "{}  {}  {:<28} {:<20} {:>3}  {:>12}  {:<8} {}",
                    row.id,
                    row.created_at.format("%Y-%m-%d"),
                    row.customer_email,
                    row.customer_name,
                    row.item_count,
                    Money::new(row.total, currency).to_string(),
                    row.payment_method.to_string(),
                    row.status
                ));
            }
        }
        AdminAction::Customers => {
            for customer in admin.customers().await? {
                say(format!(
                    "{:<28} {:<20} {:>3} orders  {:>12}  joined {}",
                    customer.email,
                    customer.name.as_deref().unwrap_or("-"),
                    customer.order_count,
                    Money::new(customer.total_spent, currency).to_string(),
                    customer.joined_at.format("%Y-%m-%d")
                ));
            }
        }
        AdminAction::Products => {
            for product in admin.products().await? {
                say(format!(
                    "{:<6} {:<32} {:<12} {:>10}  {}",
                    product.id.as_str(),
                    product.title,
                    product.category,
                    Money::new(product.price, currency).to_string(),
                    if product.in_stock { "in stock" } else { "out of stock" }
                ));
            }
        }
        AdminAction::Analytics => {
            let report = admin.analytics().await?;
            say(format!("Revenue:             {}", Money::new(report.total_revenue, currency)));
            say(format!("Orders:              {}", report.order_count));
            say(format!("Customers:           {}", report.customer_count));
            say(format!(
                "Average order value: {}",
                Money::new(report.average_order_value, currency)
            ));

            say("Revenue by month:");
            for month in &report.revenue_by_month {
                say(format!("  {}  {}", month.month, Money::new(month.revenue, currency)));
            }
            say("Orders by weekday:");
            for day in &report.orders_by_weekday {
                say(format!("  {}  {}", day.day, day.orders));
            }
            say("Category share:");
            for share in &report.category_share {
                say(format!(
                    "  {:<12} {:>6}%  {}",
                    share.category,
                    share.share.to_string(),
                    Money::new(share.revenue, currency)
                ));
            }
        }
    }
    Ok(())
}
