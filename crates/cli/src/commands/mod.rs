//! Interactive commands.
//!
//! Each input line is parsed into a [`Command`] and run against the shared
//! [`Storefront`]. Failures are reported to the customer and never end the
//! session.

mod parse;
mod render;

pub use parse::parse_line;

use std::io::{self, Write};

use feedstore_client::{RemoteGateway, Storefront};
use parse::Command;

/// What the loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run one command and write its outcome to `out`.
///
/// # Errors
///
/// Only fails when writing to `out` fails.
pub async fn execute<G, W>(
    storefront: &Storefront<G>,
    command: Command,
    out: &mut W,
) -> io::Result<Flow>
where
    G: RemoteGateway,
    W: Write,
{
    match command {
        Command::Login { email, password } => match storefront.login(&email, &password).await {
            Ok(user) => {
                set_sentry_user(Some(&user.email));
                let (products, orders) =
                    storefront.view(|state| (state.catalog().len(), state.history().len()));
                let name = if user.display_name.is_empty() {
                    &user.email
                } else {
                    &user.display_name
                };
                writeln!(out, "Welcome, {name}.")?;
                writeln!(out, "{products} product(s) in the catalog, {orders} past order(s).")?;
                let catalog_error =
                    storefront.view(|state| state.catalog().last_error().map(String::from));
                if let Some(err) = catalog_error {
                    writeln!(out, "Warning: could not load the catalog ({err}).")?;
                }
            }
            Err(err) => writeln!(out, "Login failed: {err}")?,
        },
        Command::Logout => {
            storefront.logout();
            set_sentry_user(None);
            writeln!(out, "Logged out.")?;
        }
        Command::Products { term } => {
            storefront.view(|state| render::products(out, &state.catalog().search(&term)))?;
        }
        Command::Orders { term } => {
            storefront.view(|state| render::orders(out, &state.history().search(&term)))?;
        }
        Command::Add(id) => match storefront.add_to_cart(id) {
            Some(quantity) => writeln!(out, "Product #{id} in cart: {quantity}.")?,
            None => writeln!(out, "No product #{id} in the catalog.")?,
        },
        Command::Remove(id) => {
            if storefront.remove_from_cart(id) {
                writeln!(out, "Removed product #{id}.")?;
            } else {
                writeln!(out, "Product #{id} is not in the cart.")?;
            }
        }
        Command::Quantity { id, delta } => match storefront.change_quantity(id, delta) {
            Some(quantity) => writeln!(out, "Product #{id} in cart: {quantity}.")?,
            None => writeln!(out, "Product #{id} is not in the cart.")?,
        },
        Command::Cart => {
            storefront.view(|state| {
                render::cart(out, state.cart(), state.checkout().delivery_address())
            })?;
        }
        Command::Address(address) => {
            storefront.set_delivery_address(address);
            writeln!(out, "Delivery address updated.")?;
        }
        Command::Submit => match storefront.submit().await {
            Ok(receipt) => match receipt.order_number {
                Some(number) => writeln!(out, "Order placed, number {number}.")?,
                None => writeln!(out, "Order placed.")?,
            },
            Err(err) => writeln!(out, "{err}")?,
        },
        Command::Cancel => match storefront.cancel_order() {
            Ok(()) => writeln!(out, "Order cancelled.")?,
            Err(err) => writeln!(out, "{err}")?,
        },
        Command::Refresh => {
            if storefront.view(|state| state.session().is_logged_in()) {
                tokio::join!(storefront.refresh_catalog(), storefront.refresh_history());
                writeln!(out, "Refreshed.")?;
            } else {
                writeln!(out, "Log in first.")?;
            }
        }
        Command::Help => render::help(out)?,
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn set_sentry_user(email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(email.map(|email| sentry::User {
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}
