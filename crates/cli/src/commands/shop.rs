//! Catalog, cart and wishlist commands.

use clap::Args;
use rust_decimal::Decimal;

use nevyra_client::{ClientError, NevyraClient, Result};
use nevyra_core::{
    CatalogQuery, CategoryFilter, Money, OrderTotals, Product, ProductId, SortOrder,
};

use super::say;
use crate::{CartAction, WishlistAction};

/// Filters for `products list`.
#[derive(Args)]
pub struct ListArgs {
    /// Category name or alias (`devices`, `fashion-beauty`, ...)
    #[arg(short, long)]
    category: Option<String>,
    /// Text the title, description or category must contain
    #[arg(short, long)]
    search: Option<String>,
    #[arg(long)]
    min_price: Option<Decimal>,
    #[arg(long)]
    max_price: Option<Decimal>,
    #[arg(long, default_value_t = 0.0)]
    min_rating: f32,
    #[arg(long)]
    in_stock: bool,
    /// `popular`, `price-low`, `price-high`, `rating` or `newest`
    #[arg(long, default_value_t = SortOrder::Popular)]
    sort: SortOrder,
    #[arg(short, long, default_value_t = 1)]
    page: usize,
}

impl ListArgs {
    fn to_query(&self) -> CatalogQuery {
        CatalogQuery {
            category: self
                .category
                .as_deref()
                .map(|c| c.parse::<CategoryFilter>().unwrap_or_default())
                .unwrap_or_default(),
            search: self.search.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.min_rating,
            in_stock_only: self.in_stock,
            sort: self.sort,
            page: self.page,
            ..CatalogQuery::default()
        }
    }
}

pub async fn list(client: &NevyraClient, args: &ListArgs) -> Result<()> {
    let page = client.catalog().query(&args.to_query()).await?;
    for product in &page.items {
        print_row(client, product);
    }
    say(format!(
        "Page {} of {} ({} products)",
        page.page,
        page.total_pages.max(1),
        page.total_items
    ));
    Ok(())
}

pub async fn search(client: &NevyraClient, query: &str) -> Result<()> {
    let results = client.catalog().search(query).await?;
    if results.is_empty() {
        say(format!("No products match \"{}\"", query.trim()));
    }
    for product in &results {
        print_row(client, product);
    }
    Ok(())
}

pub async fn show(client: &NevyraClient, id: &ProductId) -> Result<()> {
    let product = client.catalog().product(id).await?;
    let currency = client.config().currency;
    say(format!("{} ({})", product.title, product.id));
    say(format!("  {}", product.description));
    say(format!("  Category: {}", product.category));
    say(format!("  Price:    {}", Money::new(product.price, currency)));
    say(format!("  Rating:   {:.1}", product.rating));
    say(format!(
        "  Stock:    {}",
        if product.in_stock { "in stock" } else { "out of stock" }
    ));
    if client.wishlist().contains(&product.id) {
        say("  On your wishlist");
    }
    Ok(())
}

pub async fn categories(client: &NevyraClient) -> Result<()> {
    for category in client.catalog().categories().await?.iter() {
        say(format!("{:<16} {}", category.name, category.product_count));
    }
    Ok(())
}

/// Apply a cart change, then print the priced cart.
pub async fn cart(client: &NevyraClient, action: CartAction) -> Result<()> {
    let cart = client.cart();
    match action {
        CartAction::Show => {}
        CartAction::Add { id, quantity } => {
            cart.add(id, quantity).map_err(ClientError::from)?;
        }
        CartAction::Set { id, quantity } => {
            cart.update_quantity(&id, quantity).map_err(ClientError::from)?;
        }
        CartAction::Remove { id } => {
            cart.remove(&id).map_err(ClientError::from)?;
        }
        CartAction::Clear => {
            cart.clear().map_err(ClientError::from)?;
        }
    }

    let entries = cart.entries();
    if entries.is_empty() {
        say("Your cart is empty");
        return Ok(());
    }

    let currency = client.config().currency;
    let lines = client.catalog().price_lines(&entries).await?;
    for line in &lines {
        say(format!(
            "{:<6} {:<32} x{:<3} {}",
            line.product_id.as_str(),
            line.title,
            line.quantity,
            Money::new(line.line_total(), currency)
        ));
    }
    let totals = OrderTotals::compute(&lines, currency);
    say(format!("Subtotal: {}", Money::new(totals.subtotal, currency)));
    say(format!("Shipping: {}", Money::new(totals.shipping, currency)));
    say(format!("Tax:      {}", Money::new(totals.tax, currency)));
    say(format!("Total:    {}", totals.total_money()));
    Ok(())
}

pub async fn wishlist(client: &NevyraClient, action: WishlistAction) -> Result<()> {
    let wishlist = client.wishlist();
    match action {
        WishlistAction::Show => {}
        WishlistAction::Add { id } => {
            wishlist.add(id).map_err(ClientError::from)?;
        }
        WishlistAction::Remove { id } => {
            wishlist.remove(&id).map_err(ClientError::from)?;
        }
        WishlistAction::Toggle { id } => {
            let added = wishlist.toggle(&id).map_err(ClientError::from)?;
            say(if added {
                format!("Added {id} to your wishlist")
            } else {
                format!("Removed {id} from your wishlist")
            });
        }
    }

    let ids = wishlist.get();
    if ids.is_empty() {
        say("Your wishlist is empty");
        return Ok(());
    }
    let products = client.catalog().products().await?;
    for id in &ids {
        match products.iter().find(|p| &p.id == id) {
            Some(product) => print_row(client, product),
            None => say(format!("{:<6} (no longer available)", id.as_str())),
        }
    }
    Ok(())
}

fn print_row(client: &NevyraClient, product: &Product) {
    let flags = match (product.in_stock, product.is_new) {
        (false, _) => " [out of stock]",
        (true, true) => " [new]",
        (true, false) => "",
    };
    say(format!(
        "{:<6} {:<32} {:>10}  {:.1}*{flags}",
        product.id.as_str(),
        product.title,
        Money::new(product.price, client.config().currency).to_string(),
        product.rating
    ));
}
