//! Address book, checkout and order history commands.

use nevyra_client::checkout::{CheckoutSession, OrderConfirmation};
use nevyra_client::{ClientError, NevyraClient, Result};
use nevyra_core::api::OrderRecord;
use nevyra_core::{Address, Money, PaymentMethod, PaymentState};

use super::say;
use crate::{AddressAction, CheckoutArgs, OrderAction};

pub async fn address(client: &NevyraClient, action: AddressAction) -> Result<()> {
    let manager = client.addresses();
    let book = match action {
        AddressAction::List => manager.list().await?,
        AddressAction::Add(args) => manager.add(&args.into()).await?,
        AddressAction::Update { id, address } => manager.update(id, &address.into()).await?,
        AddressAction::Delete { id } => manager.delete(id).await?,
        AddressAction::Default { id } => manager.set_default(id).await?,
    };
    print_addresses(&book);
    Ok(())
}

fn print_addresses(book: &[Address]) {
    if book.is_empty() {
        say("No saved addresses. Add one with `nevyra address add`.");
    }
    for address in book {
        let marker = if address.is_default { "*" } else { " " };
        say(format!("{marker} {}  {}", address.id, address.summary()));
    }
}

/// Run checkout end to end: address, summary, payment, order.
pub async fn checkout(client: &NevyraClient, args: CheckoutArgs) -> Result<()> {
    let mut session = client.checkout();

    if session.load_addresses().await?.is_empty() {
        return Err(ClientError::MissingAddress);
    }
    if let Some(id) = args.address {
        session.select_address(id)?;
    }
    session.continue_to_summary()?;
    if let Some(address) = session.selected_address() {
        say(format!("Shipping to {}", address.summary()));
    }

    if let Some(code) = &args.coupon {
        let applied = session.payment_mut().apply_coupon(code)?;
        say(format!("Coupon {applied} applied"));
    }

    let summary = session.summary().await?;
    let currency = summary.totals.currency;
    for line in &summary.lines {
        say(format!(
            "  {} x{}  {}",
            line.title,
            line.quantity,
            Money::new(line.line_total(), currency)
        ));
    }
    say(format!("Subtotal: {}", Money::new(summary.totals.subtotal, currency)));
    say(format!("Shipping: {}", Money::new(summary.totals.shipping, currency)));
    say(format!("Tax:      {}", Money::new(summary.totals.tax, currency)));
    if summary.coupon.is_some() {
        say(format!(
            "Coupon discount: -{}",
            Money::new(summary.coupon_discount, currency)
        ));
    }
    say(format!("Total:    {}", summary.display_total()));
    session.continue_to_payment()?;
    session.payment_mut().select_method(args.method);

    let confirmation = match args.method {
        PaymentMethod::Cod => session.place_order().await?,
        PaymentMethod::Gateway => pay_through_gateway(&mut session).await?,
    };
    print_confirmation(&confirmation);
    Ok(())
}

/// Follow the gateway payment, dismissing it on Ctrl+C before it is
/// confirmed.
async fn pay_through_gateway(session: &mut CheckoutSession) -> Result<OrderConfirmation> {
    let payment = session.start_gateway_payment().await?;
    let mut progress = payment.subscribe();
    say("Waiting for the payment gateway (Ctrl+C to cancel)...");

    loop {
        let state = *progress.borrow_and_update();
        tracing::debug!(%state, "payment progress");
        if state.is_terminal() || state == PaymentState::Verified {
            break;
        }
        tokio::select! {
            changed = progress.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                if payment.dismiss() {
                    say("Payment cancelled");
                } else {
                    say("Payment is already being verified");
                }
            }
        }
    }

    let receipt = payment.outcome().await.into_result()?;
    say(format!("Payment {} verified", receipt.payment_id));
    session.complete_gateway_payment(&receipt).await
}

fn print_confirmation(confirmation: &OrderConfirmation) {
    say(format!("Order placed: {}", confirmation.order_id));
    say(format!("  Status: {}", confirmation.status));
    say(format!("  Total:  {}", confirmation.total));
    if let Some(reference) = &confirmation.payment_reference {
        say(format!("  Payment reference: {reference}"));
    }
}

pub async fn orders(client: &NevyraClient, action: OrderAction) -> Result<()> {
    let history = client.orders();
    match action {
        OrderAction::List => {
            let orders = history.list().await?;
            if orders.is_empty() {
                say("No orders yet");
            }
            for order in &orders {
                say(format!(
                    "{}  {}  {:<10} {:>3} items  {}",
                    order.id,
                    order.created_at.format("%Y-%m-%d"),
                    order.status.to_string(),
                    order.item_count(),
                    order.totals.total_money()
                ));
            }
        }
        OrderAction::Show { id } => print_order(&history.get(id).await?),
        OrderAction::Cancel { id } => {
            let order = history.cancel(id).await?;
            say(format!("Order {} cancelled", order.id));
        }
    }
    Ok(())
}

fn print_order(order: &OrderRecord) {
    let currency = order.totals.currency;
    say(format!("Order {}", order.id));
    say(format!("  Placed:   {}", order.created_at.format("%Y-%m-%d %H:%M")));
    say(format!("  Status:   {}", order.status));
    say(format!("  Payment:  {}", order.payment.method));
    if let Some(coupon) = &order.payment.coupon {
        say(format!("  Coupon:   {coupon}"));
    }
    say(format!("  Ship to:  {}", order.shipping.full_name()));
    for line in &order.lines {
        say(format!(
            "    {} x{}  {}",
            line.title,
            line.quantity,
            Money::new(line.line_total(), currency)
        ));
    }
    say(format!("  Subtotal: {}", Money::new(order.totals.subtotal, currency)));
    say(format!("  Shipping: {}", Money::new(order.totals.shipping, currency)));
    say(format!("  Tax:      {}", Money::new(order.totals.tax, currency)));
    say(format!("  Total:    {}", order.totals.total_money()));
}
