#![allow(
    clippy::module_name_repetitions,
    reason = "Response types mirror the endpoint they come from"
)]

use serde::Deserialize;
use serde_with::serde_as;

use crate::error::Error;
use crate::rest::types::{InvoiceStatus, WithdrawalStatus};
use crate::serde_helpers::StringFromAny;
use crate::types::{DateTime, Decimal, OrderStatus, OrderType, PriceLevel, Side, Utc};
use crate::units;

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Market {
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub price_precision: Option<u32>,
    #[serde(default)]
    pub quantity_precision: Option<u32>,
    #[serde(default)]
    pub min_quantity: Option<Decimal>,
    #[serde(default)]
    pub tick_size: Option<Decimal>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Orderbook {
    pub symbol: String,
    /// Best bid first
    #[serde(default)]
    pub bids: Vec<PriceLevel>,
    /// Best ask first
    #[serde(default)]
    pub asks: Vec<PriceLevel>,
    #[serde(default)]
    pub sequence: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[non_exhaustive]
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Trade {
    #[serde_as(as = "StringFromAny")]
    pub id: String,
    pub symbol: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub side: Side,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub last_price: Decimal,
    #[serde(default)]
    pub bid: Option<Decimal>,
    #[serde(default)]
    pub ask: Option<Decimal>,
    #[serde(default)]
    pub high_24h: Option<Decimal>,
    #[serde(default)]
    pub low_24h: Option<Decimal>,
    #[serde(default)]
    pub volume_24h: Option<Decimal>,
    #[serde(default)]
    pub change_24h: Option<Decimal>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[non_exhaustive]
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Order {
    #[serde_as(as = "StringFromAny")]
    pub id: String,
    #[serde(default)]
    pub client_order_id: Option<String>,
    pub symbol: String,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub status: OrderStatus,
    #[serde(default)]
    pub price: Option<Decimal>,
    pub quantity: Decimal,
    #[serde(default)]
    pub filled_quantity: Decimal,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[non_exhaustive]
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CancelOrdersResponse {
    /// Ids of the orders that were cancelled
    #[serde_as(as = "Vec<StringFromAny>")]
    #[serde(default)]
    pub cancelled: Vec<String>,
}

/// Wallet balance of one asset.
///
/// The API reports amounts as integers in the asset's base units; both the raw strings and
/// the converted [`Decimal`]s are exposed.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawBalance")]
pub struct Balance {
    pub asset: String,
    pub decimals: u32,
    pub available_raw: String,
    pub locked_raw: String,
    pub available: Decimal,
    pub locked: Decimal,
}

impl Balance {
    /// `available + locked`
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.available + self.locked
    }
}

#[serde_as]
#[derive(Deserialize)]
struct RawBalance {
    asset: String,
    decimals: u32,
    #[serde_as(as = "StringFromAny")]
    available: String,
    #[serde_as(as = "Option<StringFromAny>")]
    #[serde(default)]
    locked: Option<String>,
}

impl TryFrom<RawBalance> for Balance {
    type Error = Error;

    fn try_from(raw: RawBalance) -> Result<Self, Self::Error> {
        let locked_raw = raw.locked.unwrap_or_else(|| "0".to_owned());

        Ok(Self {
            available: units::to_decimal(&raw.available, raw.decimals)?,
            locked: units::to_decimal(&locked_raw, raw.decimals)?,
            asset: raw.asset,
            decimals: raw.decimals,
            available_raw: raw.available,
            locked_raw,
        })
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawWithdrawal")]
pub struct Withdrawal {
    pub id: String,
    pub asset: String,
    pub decimals: u32,
    pub amount_raw: String,
    pub amount: Decimal,
    pub fee_raw: Option<String>,
    pub fee: Option<Decimal>,
    pub address: String,
    pub network: Option<String>,
    pub status: WithdrawalStatus,
    pub tx_hash: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[serde_as]
#[derive(Deserialize)]
struct RawWithdrawal {
    #[serde_as(as = "StringFromAny")]
    id: String,
    asset: String,
    decimals: u32,
    #[serde_as(as = "StringFromAny")]
    amount: String,
    #[serde_as(as = "Option<StringFromAny>")]
    #[serde(default)]
    fee: Option<String>,
    address: String,
    #[serde(default)]
    network: Option<String>,
    status: WithdrawalStatus,
    #[serde(default)]
    tx_hash: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawWithdrawal> for Withdrawal {
    type Error = Error;

    fn try_from(raw: RawWithdrawal) -> Result<Self, Self::Error> {
        let fee = raw
            .fee
            .as_deref()
            .map(|fee| units::to_decimal(fee, raw.decimals))
            .transpose()?;

        Ok(Self {
            amount: units::to_decimal(&raw.amount, raw.decimals)?,
            fee,
            id: raw.id,
            asset: raw.asset,
            decimals: raw.decimals,
            amount_raw: raw.amount,
            fee_raw: raw.fee,
            address: raw.address,
            network: raw.network,
            status: raw.status,
            tx_hash: raw.tx_hash,
            created_at: raw.created_at,
        })
    }
}

/// A payment request, settled when `amount` of `asset` reaches `payment_address`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawInvoice")]
pub struct Invoice {
    pub id: String,
    pub asset: String,
    pub decimals: u32,
    pub amount_raw: String,
    pub amount: Decimal,
    pub status: InvoiceStatus,
    pub description: Option<String>,
    pub payment_address: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

#[serde_as]
#[derive(Deserialize)]
struct RawInvoice {
    #[serde_as(as = "StringFromAny")]
    id: String,
    asset: String,
    decimals: u32,
    #[serde_as(as = "StringFromAny")]
    amount: String,
    status: InvoiceStatus,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    payment_address: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawInvoice> for Invoice {
    type Error = Error;

    fn try_from(raw: RawInvoice) -> Result<Self, Self::Error> {
        Ok(Self {
            amount: units::to_decimal(&raw.amount, raw.decimals)?,
            id: raw.id,
            asset: raw.asset,
            decimals: raw.decimals,
            amount_raw: raw.amount,
            status: raw.status,
            description: raw.description,
            payment_address: raw.payment_address,
            expires_at: raw.expires_at,
            created_at: raw.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    #[test]
    fn balance_should_expose_raw_and_decimal_amounts() {
        let balance: Balance = serde_json::from_value(json!({
            "asset": "USDT",
            "decimals": 6,
            "available": "1500000",
            "locked": 250_000
        }))
        .unwrap();

        assert_eq!(balance.available_raw, "1500000");
        assert_eq!(balance.available, dec!(1.5));
        assert_eq!(balance.locked_raw, "250000");
        assert_eq!(balance.locked, dec!(0.25));
        assert_eq!(balance.total(), dec!(1.75));
    }

    #[test]
    fn balance_with_malformed_amount_should_fail() {
        let result = serde_json::from_value::<Balance>(json!({
            "asset": "USDT",
            "decimals": 6,
            "available": "1.5"
        }));

        assert!(result.is_err());
    }

    #[test]
    fn withdrawal_should_convert_amount_and_fee() {
        let withdrawal: Withdrawal = serde_json::from_value(json!({
            "id": 77,
            "asset": "BTC",
            "decimals": 8,
            "amount": "12345678",
            "fee": "1000",
            "address": "bc1qexample",
            "status": "processing",
            "created_at": "2024-05-01T12:00:00Z"
        }))
        .unwrap();

        assert_eq!(withdrawal.id, "77");
        assert_eq!(withdrawal.amount, dec!(0.12345678));
        assert_eq!(withdrawal.fee, Some(dec!(0.00001)));
        assert_eq!(withdrawal.status, WithdrawalStatus::Processing);
        assert!(withdrawal.created_at.is_some());
    }

    #[test]
    fn invoice_should_tolerate_unknown_status() {
        let invoice: Invoice = serde_json::from_value(json!({
            "id": "inv-1",
            "asset": "USDC",
            "decimals": 6,
            "amount": "25000000",
            "status": "refunded"
        }))
        .unwrap();

        assert_eq!(invoice.amount, dec!(25));
        assert_eq!(invoice.status, InvoiceStatus::Unknown);
        assert_eq!(invoice.payment_address, None);
    }

    #[test]
    fn order_should_default_filled_quantity() {
        let order: Order = serde_json::from_value(json!({
            "id": "ord-9",
            "symbol": "BTC-USDT",
            "side": "buy",
            "type": "limit",
            "status": "open",
            "price": "50000",
            "quantity": "0.1"
        }))
        .unwrap();

        assert_eq!(order.filled_quantity, Decimal::ZERO);
        assert_eq!(order.order_type, OrderType::Limit);
    }
}
