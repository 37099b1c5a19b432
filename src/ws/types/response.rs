use serde::Deserialize;
use serde_json::Value;
use serde_with::serde_as;

use crate::serde_helpers::StringFromAny;
use crate::types::{Decimal, OrderStatus, OrderType, PriceLevel, Side};

/// Top-level WebSocket frame received from the server.
///
/// Liveness replies carry only a `type`; every other frame is a channel envelope whose `data`
/// is kept as raw JSON until it reaches the subscription that owns it.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InboundMessage {
    Data(DataMessage),
    Control(ControlMessage),
}

/// Channel envelope: `{"channel": …, "event": …, "data": …, "timestamp": …}`.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize)]
pub struct DataMessage {
    /// Wire name of the channel, e.g. `orderbook` or `user.orders`
    pub channel: String,
    #[serde(default)]
    pub event: Option<String>,
    pub data: Value,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl DataMessage {
    /// `channel:symbol` when the payload carries a symbol, the bare channel otherwise.
    #[must_use]
    pub fn routing_key(&self) -> String {
        match self.data.get("symbol").and_then(Value::as_str) {
            Some(symbol) => format!("{}:{symbol}", self.channel),
            None => self.channel.clone(),
        }
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    /// Reply to a client `ping`
    Pong,
    /// Acknowledgements and notices that carry no channel data
    #[serde(other)]
    Other,
}

/// Orderbook snapshot or update for one symbol.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize)]
pub struct OrderbookUpdate {
    pub symbol: String,
    /// Bid levels, best first
    #[serde(default)]
    pub bids: Vec<PriceLevel>,
    /// Ask levels, best first
    #[serde(default)]
    pub asks: Vec<PriceLevel>,
    #[serde(default)]
    pub sequence: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A public trade print.
#[non_exhaustive]
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct TradeUpdate {
    #[serde_as(as = "StringFromAny")]
    pub id: String,
    pub symbol: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub side: Side,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize)]
pub struct TickerUpdate {
    pub symbol: String,
    pub last_price: Decimal,
    #[serde(default)]
    pub bid: Option<Decimal>,
    #[serde(default)]
    pub ask: Option<Decimal>,
    #[serde(default)]
    pub volume_24h: Option<Decimal>,
    #[serde(default)]
    pub change_24h: Option<Decimal>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Snapshot of one of the account's orders after a state change.
#[non_exhaustive]
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct OrderUpdate {
    #[serde_as(as = "StringFromAny")]
    pub id: String,
    pub symbol: String,
    pub side: Side,
    #[serde(rename = "type", default)]
    pub order_type: Option<OrderType>,
    pub status: OrderStatus,
    #[serde(default)]
    pub price: Option<Decimal>,
    pub quantity: Decimal,
    #[serde(default)]
    pub filled_quantity: Option<Decimal>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceUpdate {
    pub asset: String,
    pub available: Decimal,
    #[serde(default)]
    pub locked: Decimal,
    #[serde(default)]
    pub timestamp: Option<String>,
}
