//! JSON record to domain model conversions.
//!
//! The backend is a spreadsheet behind webhooks: column names vary between
//! deployments, numbers arrive as strings, and cells may be blank. Every
//! field is therefore read from the first of several keys holding a
//! non-blank value, falling back to a literal default.

use core::str::FromStr;

use feedstore_core::{Availability, OrderSeq, OrderStatus, Price, ProductId, STATUS_IN_PROGRESS};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::warn;

use super::OrderReceipt;
use crate::models::{Order, Product, User};

type Record = Map<String, Value>;

// =============================================================================
// Field keys, in lookup order
// =============================================================================

const PRODUCT_NAME: &[&str] = &["Nazwa produktu", "Nazwa", "name"];
const PRODUCT_SKU: &[&str] = &["Kod SKU", "SKU", "sku"];
const PRODUCT_PRICE: &[&str] = &["Cena za jednostke", "Cena", "price"];
const PRODUCT_AVAILABILITY: &[&str] = &["Dostepność", "Dostepnosc", "availability"];
const PRODUCT_UNIT: &[&str] = &["Jednostka", "unit"];

const ORDER_DATE: &[&str] = &["Data", "date"];
const ORDER_NUMBER: &[&str] = &["Numer_zamowienia", "orderNumber"];
const ORDER_CUSTOMER: &[&str] = &["Imie_Nazwisko", "customerName"];
const ORDER_EMAIL: &[&str] = &["Email", "email"];
const ORDER_PHONE: &[&str] = &["Telefon", "phone"];
const ORDER_ADDRESS: &[&str] = &["Adres_dostawy", "address"];
const ORDER_PRODUCTS: &[&str] = &["Produkty", "productsSummary"];
const ORDER_TOTAL: &[&str] = &["Suma", "total"];
const ORDER_STATUS: &[&str] = &["Status", "status"];

const USER_EMAIL: &[&str] = &["email"];
const USER_NAME: &[&str] = &["nazwa", "name"];
const USER_PHONE: &[&str] = &["telefon", "phone"];
const USER_ADDRESS: &[&str] = &["adres", "address"];

const RECEIPT_NUMBER: &[&str] = &["numer", "orderNumber"];

const DEFAULT_UNIT: &str = "szt";

// =============================================================================
// Collections
// =============================================================================

/// Convert catalog rows, numbering products from 1.
///
/// Rows that are not JSON objects are skipped and do not consume a number.
pub fn convert_products(rows: Vec<Value>) -> Vec<Product> {
    object_rows(rows, "product")
        .zip(1_u32..)
        .map(|(record, seq)| convert_product(ProductId::new(seq), &record))
        .collect()
}

/// Convert order history rows, numbering orders from 1.
pub fn convert_orders(rows: Vec<Value>) -> Vec<Order> {
    object_rows(rows, "order")
        .zip(1_u32..)
        .map(|(record, seq)| convert_order(OrderSeq::new(seq), &record))
        .collect()
}

fn object_rows(rows: Vec<Value>, kind: &'static str) -> impl Iterator<Item = Record> {
    rows.into_iter().filter_map(move |row| match row {
        Value::Object(record) => Some(record),
        other => {
            warn!(kind, row = %other, "Skipping non-object row");
            None
        }
    })
}

// =============================================================================
// Rows
// =============================================================================

fn convert_product(id: ProductId, record: &Record) -> Product {
    // `false` counts as blank for every other field but is meaningful here
    let explicitly_unavailable = PRODUCT_AVAILABILITY
        .iter()
        .any(|key| record.get(*key) == Some(&Value::Bool(false)));
    let availability = match pick(record, PRODUCT_AVAILABILITY) {
        _ if explicitly_unavailable => Availability::Unavailable,
        None | Some(Value::Bool(_)) => Availability::Available,
        Some(value) => Availability::from_label(&value_text(value)),
    };

    Product {
        id,
        name: text(record, PRODUCT_NAME),
        sku: text(record, PRODUCT_SKU),
        unit_price: price(record, PRODUCT_PRICE),
        availability,
        unit: pick(record, PRODUCT_UNIT).map_or_else(|| DEFAULT_UNIT.to_string(), value_text),
    }
}

fn convert_order(seq: OrderSeq, record: &Record) -> Order {
    let status = pick(record, ORDER_STATUS)
        .map_or_else(|| STATUS_IN_PROGRESS.to_string(), value_text);

    Order {
        seq,
        date: text(record, ORDER_DATE),
        order_number: text(record, ORDER_NUMBER),
        customer_name: text(record, ORDER_CUSTOMER),
        email: text(record, ORDER_EMAIL),
        phone: text(record, ORDER_PHONE),
        delivery_address: text(record, ORDER_ADDRESS),
        products_summary: text(record, ORDER_PRODUCTS),
        total: pick(record, ORDER_TOTAL)
            .and_then(decimal_value)
            .unwrap_or(Decimal::ZERO),
        status: OrderStatus::from_label(&status),
    }
}

/// Convert the `user` object of a login response.
///
/// Returns `None` unless `value` is an object. A missing email falls back to
/// the one the customer logged in with.
pub fn convert_user(value: &Value, login_email: &str) -> Option<User> {
    let record = value.as_object()?;
    let email = pick(record, USER_EMAIL).map_or_else(|| login_email.to_string(), value_text);

    Some(User {
        email,
        display_name: text(record, USER_NAME),
        phone: text(record, USER_PHONE),
        delivery_address: text(record, USER_ADDRESS),
    })
}

/// Read the order number from a submission acknowledgement.
pub fn convert_receipt(envelope: &Record) -> OrderReceipt {
    OrderReceipt {
        order_number: pick(envelope, RECEIPT_NUMBER).map(value_text),
    }
}

// =============================================================================
// Field helpers
// =============================================================================

/// First value under `keys` that is not blank.
///
/// Blank means null, `false`, an empty (or whitespace) string, or zero.
fn pick<'a>(record: &'a Record, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !is_blank(value))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::String(s) => s.trim().is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() < f64::EPSILON),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn text(record: &Record, keys: &[&str]) -> String {
    pick(record, keys).map(value_text).unwrap_or_default()
}

fn price(record: &Record, keys: &[&str]) -> Price {
    let Some(amount) = pick(record, keys).and_then(decimal_value) else {
        return Price::ZERO;
    };
    Price::new(amount).unwrap_or_else(|err| {
        warn!(%err, "Clamping negative product price to zero");
        Price::ZERO
    })
}

/// Read a decimal from a JSON number or a loosely formatted string.
fn decimal_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal_text(&n.to_string()),
        Value::String(s) => parse_decimal_text(s),
        _ => None,
    }
}

/// Parse the leading number of `raw`.
///
/// Accepts a decimal comma and ignores a trailing unit, so `"12,50 zł"` reads
/// as 12.50. A value whose remainder still holds digits (`"1e30"`,
/// `"1.234,56"`) cannot be read exactly and yields `None`.
fn parse_decimal_text(raw: &str) -> Option<Decimal> {
    let normalized = raw.trim().replace(',', ".");
    if let Ok(d) = Decimal::from_str(&normalized) {
        return Some(d);
    }
    if let Ok(d) = Decimal::from_scientific(&normalized) {
        return Some(d);
    }

    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in normalized.char_indices() {
        let accepted = match c {
            '-' | '+' => i == 0,
            '.' if !seen_dot => {
                seen_dot = true;
                true
            }
            c => c.is_ascii_digit(),
        };
        if !accepted {
            break;
        }
        end = i + c.len_utf8();
    }

    let (Some(prefix), Some(rest)) = (normalized.get(..end), normalized.get(end..)) else {
        return None;
    };
    if rest.chars().any(|c| c.is_ascii_digit()) {
        warn!(value = raw, "Ignoring number that cannot be represented exactly");
        return None;
    }

    let parsed = Decimal::from_str(prefix.trim_end_matches('.')).ok();
    if parsed.is_none() {
        warn!(value = raw, "Ignoring unreadable number");
    }
    parsed
}
