use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Stream categories exposed by the exchange.
///
/// Market-data channels (`orderbook`, `trades`, `ticker`) are scoped to a symbol; user channels
/// (`user.orders`, `user.balances`) are scoped to the authenticated account and take none.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "orderbook")]
    #[strum(serialize = "orderbook")]
    Orderbook,
    #[serde(rename = "trades")]
    #[strum(serialize = "trades")]
    Trades,
    #[serde(rename = "ticker")]
    #[strum(serialize = "ticker")]
    Ticker,
    #[serde(rename = "user.orders")]
    #[strum(serialize = "user.orders")]
    UserOrders,
    #[serde(rename = "user.balances")]
    #[strum(serialize = "user.balances")]
    UserBalances,
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    Subscribe,
    Unsubscribe,
}

/// Subscription request message sent to the WebSocket server.
#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
pub struct SubscriptionRequest {
    pub action: Action,
    pub channel: Channel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl SubscriptionRequest {
    #[must_use]
    pub fn subscribe(channel: Channel, symbol: Option<String>) -> Self {
        Self {
            action: Action::Subscribe,
            channel,
            symbol,
        }
    }

    #[must_use]
    pub fn unsubscribe(channel: Channel, symbol: Option<String>) -> Self {
        Self {
            action: Action::Unsubscribe,
            channel,
            symbol,
        }
    }
}

/// Liveness frames sent by the client, e.g. `{"type":"ping"}`.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Heartbeat {
    Ping,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn subscribe_should_omit_missing_symbol() {
        let request = SubscriptionRequest::subscribe(Channel::UserOrders, None);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "action": "subscribe", "channel": "user.orders" })
        );
    }

    #[test]
    fn unsubscribe_should_carry_symbol() {
        let request = SubscriptionRequest::unsubscribe(Channel::Orderbook, Some("BTC-USDT".into()));

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "action": "unsubscribe", "channel": "orderbook", "symbol": "BTC-USDT" })
        );
    }

    #[test]
    fn ping_should_serialize_as_type_tag() {
        assert_eq!(serde_json::to_string(&Heartbeat::Ping).unwrap(), r#"{"type":"ping"}"#);
    }

    #[test]
    fn channel_display_should_match_wire_name() {
        assert_eq!(Channel::UserBalances.to_string(), "user.balances");
        assert_eq!(Channel::Ticker.to_string(), "ticker");
    }
}
