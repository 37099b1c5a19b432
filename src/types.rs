//! Re-exported types from external crates, plus the small enums shared by the REST and
//! WebSocket layers.
//!
//! The re-exports exist so users don't need to add these dependencies to their `Cargo.toml`.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Date and time types for timestamps in API responses.
pub use chrono::{DateTime, Utc};
/// Arbitrary precision decimal type for prices, quantities, and amounts.
pub use rust_decimal::Decimal;
/// Macro for creating [`Decimal`] literals at compile time.
///
/// # Example
/// ```
/// use exchange_client_sdk::types::dec;
/// let price = dec!(50000.5);
/// ```
pub use rust_decimal_macros::dec;
/// Identifier type used for orders, withdrawals, and invoices.
pub use uuid::Uuid;

/// Order side.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    #[serde(alias = "BUY")]
    Buy,
    #[serde(alias = "SELL")]
    Sell,
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderType {
    Limit,
    Market,
}

/// Lifecycle status of an order as reported by the exchange.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
    Expired,
    /// A status this version of the SDK does not know about
    #[serde(other)]
    Unknown,
}

/// Individual price level in an orderbook.
///
/// Accepts both `["50000.5", "1.2"]` and `{"price": "50000.5", "quantity": "1.2"}`.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "RawPriceLevel")]
pub struct PriceLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPriceLevel {
    Pair(Decimal, Decimal),
    Object {
        price: Decimal,
        #[serde(alias = "size")]
        quantity: Decimal,
    },
}

impl From<RawPriceLevel> for PriceLevel {
    fn from(raw: RawPriceLevel) -> Self {
        match raw {
            RawPriceLevel::Pair(price, quantity) | RawPriceLevel::Object { price, quantity } => {
                Self { price, quantity }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn price_level_should_accept_pairs_and_objects() {
        let levels: Vec<PriceLevel> = serde_json::from_value(json!([
            ["50000.5", "1.25"],
            { "price": "50001", "quantity": "0.5" },
            { "price": "50002", "size": "2" }
        ]))
        .unwrap();

        assert_eq!(
            levels[0],
            PriceLevel {
                price: dec!(50000.5),
                quantity: dec!(1.25)
            }
        );
        assert_eq!(levels[1].quantity, dec!(0.5));
        assert_eq!(levels[2].quantity, dec!(2));
    }

    #[test]
    fn side_should_accept_upper_case() {
        let side: Side = serde_json::from_value(json!("BUY")).unwrap();

        assert_eq!(side, Side::Buy);
        assert_eq!(side.to_string(), "buy");
        assert_eq!(
            serde_json::from_value::<OrderStatus>(json!("suspended")).unwrap(),
            OrderStatus::Unknown
        );
    }
}
