//! Turning an input line into a [`Command`].

use core::str::FromStr;

use feedstore_core::ProductId;
use secrecy::SecretString;
use thiserror::Error;

/// One thing the customer asked for.
#[derive(Debug)]
pub enum Command {
    Login { email: String, password: SecretString },
    Logout,
    Products { term: String },
    Orders { term: String },
    Add(ProductId),
    Remove(ProductId),
    Quantity { id: ProductId, delta: i64 },
    Cart,
    Address(String),
    Submit,
    Cancel,
    Refresh,
    Help,
    Quit,
}

/// Errors that can occur when parsing an input line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command '{0}', type 'help' for a list")]
    UnknownCommand(String),

    #[error("Missing {argument}, usage: {usage}")]
    MissingArgument {
        argument: &'static str,
        usage: &'static str,
    },

    #[error("Invalid {argument} '{value}'")]
    InvalidNumber {
        argument: &'static str,
        value: String,
    },
}

/// Usage lines shown by `help`.
pub const USAGE: &[(&str, &str)] = &[
    ("login <email> <password>", "log in"),
    ("logout", "log out and forget the session"),
    ("products [term]", "list catalog products, filtered by name or SKU"),
    ("orders [term]", "list past orders, filtered by number or status"),
    ("add <product-id>", "add one unit of a product to the cart"),
    ("remove <product-id>", "remove a product from the cart"),
    ("qty <product-id> <delta>", "change a cart quantity, e.g. qty 3 -1"),
    ("cart", "show the cart, total and delivery address"),
    ("address <text>", "set the delivery address for this order"),
    ("submit", "place the order"),
    ("cancel", "empty the cart and restore the default address"),
    ("refresh", "re-fetch the catalog and order history"),
    ("help", "show this list"),
    ("quit", "exit"),
];

/// Parse one input line.
///
/// Returns `Ok(None)` for a blank line.
///
/// # Errors
///
/// Returns `ParseError` for an unknown command or bad arguments.
pub fn parse_line(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(word, rest)| (word, rest.trim()));

    let command = match word.to_ascii_lowercase().as_str() {
        "" => return Ok(None),
        "login" => {
            let (email, password) = rest
                .split_once(char::is_whitespace)
                .map(|(email, password)| (email, password.trim()))
                .filter(|(_, password)| !password.is_empty())
                .ok_or(ParseError::MissingArgument {
                    argument: "email or password",
                    usage: "login <email> <password>",
                })?;
            Command::Login {
                email: email.to_string(),
                password: SecretString::from(password.to_string()),
            }
        }
        "logout" => Command::Logout,
        "products" | "p" => Command::Products {
            term: rest.to_string(),
        },
        "orders" | "o" => Command::Orders {
            term: rest.to_string(),
        },
        "add" => Command::Add(product_id(rest, "add <product-id>")?),
        "remove" | "rm" => Command::Remove(product_id(rest, "remove <product-id>")?),
        "qty" => {
            let usage = "qty <product-id> <delta>";
            let (id, delta) = rest
                .split_once(char::is_whitespace)
                .ok_or(ParseError::MissingArgument {
                    argument: "delta",
                    usage,
                })?;
            Command::Quantity {
                id: product_id(id, usage)?,
                delta: number(delta.trim(), "delta")?,
            }
        }
        "cart" => Command::Cart,
        "address" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument {
                    argument: "address",
                    usage: "address <text>",
                });
            }
            Command::Address(rest.to_string())
        }
        "submit" => Command::Submit,
        "cancel" => Command::Cancel,
        "refresh" => Command::Refresh,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

fn product_id(raw: &str, usage: &'static str) -> Result<ProductId, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::MissingArgument {
            argument: "product id",
            usage,
        });
    }
    number(raw, "product id")
}

fn number<T: FromStr>(raw: &str, argument: &'static str) -> Result<T, ParseError> {
    raw.trim()
        .trim_start_matches('#')
        .parse()
        .map_err(|_| ParseError::InvalidNumber {
            argument,
            value: raw.to_string(),
        })
}
