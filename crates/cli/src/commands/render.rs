//! Plain-text rendering of client state.

use std::io::{self, Write};

use feedstore_client::{CartBuilder, Order, Product};
use feedstore_core::round_money;
use rust_decimal::Decimal;

use super::parse::USAGE;

const CURRENCY: &str = "zł";

fn money(amount: Decimal) -> String {
    format!("{:.2} {CURRENCY}", round_money(amount))
}

fn total(amount: Option<Decimal>) -> String {
    amount.map_or_else(|| "(too large)".to_string(), money)
}

/// One line per product: handle, name, SKU, unit price, availability.
pub fn products<W: Write>(out: &mut W, products: &[&Product]) -> io::Result<()> {
    if products.is_empty() {
        return writeln!(out, "No products.");
    }
    for product in products {
        writeln!(
            out,
            "#{:<4} {:<32} {:<12} {:>12}/{:<6} {}",
            product.id,
            product.name,
            product.sku,
            money(product.unit_price.amount()),
            product.unit,
            product.availability,
        )?;
    }
    Ok(())
}

/// Orders, newest last as the backend returned them.
pub fn orders<W: Write>(out: &mut W, orders: &[&Order]) -> io::Result<()> {
    if orders.is_empty() {
        return writeln!(out, "No orders.");
    }
    for order in orders {
        writeln!(
            out,
            "{:<20} {:<12} {:>14}  {}",
            order.order_number,
            order.date,
            money(order.total),
            order.status,
        )?;
        if !order.products_summary.is_empty() {
            writeln!(out, "    {}", order.products_summary)?;
        }
    }
    Ok(())
}

pub fn cart<W: Write>(out: &mut W, cart: &CartBuilder, delivery_address: &str) -> io::Result<()> {
    if cart.is_empty() {
        writeln!(out, "Cart is empty.")?;
    } else {
        for line in cart.lines() {
            let product = line.product();
            writeln!(
                out,
                "#{:<4} {:<32} {} x {} = {}",
                product.id,
                product.name,
                money(product.unit_price.amount()),
                line.quantity(),
                total(line.line_total()),
            )?;
        }
        writeln!(
            out,
            "{} item(s), total {}",
            cart.item_count(),
            total(cart.total())
        )?;
    }
    let address = if delivery_address.is_empty() {
        "(not set)"
    } else {
        delivery_address
    };
    writeln!(out, "Delivery address: {address}")
}

pub fn help<W: Write>(out: &mut W) -> io::Result<()> {
    for (usage, description) in USAGE {
        writeln!(out, "  {usage:<28} {description}")?;
    }
    Ok(())
}
