use std::fmt;
use std::sync::{Arc, Weak};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use url::Url;

use super::config::Config;
use super::connection::{ConnectionManager, ConnectionState};
use super::error::WsError;
use super::registry::{Callback, Subscription};
use super::types::request::Channel;
use super::types::response::{
    BalanceUpdate, OrderUpdate, OrderbookUpdate, TickerUpdate, TradeUpdate,
};
use crate::Result;
use crate::auth::Credentials;
use crate::error::Error;

/// Streaming client for the exchange's WebSocket API.
///
/// Subscriptions are registered synchronously and survive reconnects: the client replays every
/// registered subscription whenever a fresh transport opens, so callers subscribe once and keep
/// receiving data across network failures.
///
/// Callbacks run on a dedicated dispatcher task, in the order frames arrive on the socket.
///
/// # Examples
///
/// ```rust, no_run
/// use exchange_client_sdk::ws::{Client, Config};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = Client::new("wss://stream.exchange.example/ws", Config::default())?;
///     client.on_error(|error| eprintln!("stream error: {error}"));
///     client.connect().await?;
///
///     let ticker = client.ticker("BTC-USDT", |update| {
///         println!("{} last={}", update.symbol, update.last_price);
///     });
///
///     tokio::time::sleep(std::time::Duration::from_secs(10)).await;
///     ticker.unsubscribe();
///     client.disconnect();
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ConnectionManager>,
}

impl Client {
    /// Creates an unauthenticated client. Only market-data channels will be served.
    pub fn new(endpoint: &str, config: Config) -> Result<Self> {
        Ok(Self::from_url(parse_endpoint(endpoint)?, config))
    }

    /// Creates a client that authenticates through the endpoint's query string.
    ///
    /// Exactly one of `api_key` or `token` is appended, the API key taking precedence.
    pub fn with_credentials(endpoint: &str, credentials: &Credentials, config: Config) -> Result<Self> {
        let mut url = parse_endpoint(endpoint)?;
        credentials.apply_to_url(&mut url);

        Ok(Self::from_url(url, config))
    }

    fn from_url(url: Url, config: Config) -> Self {
        Self {
            inner: Arc::new(ConnectionManager::new(url, config)),
        }
    }

    /// Opens the connection and waits until it is ready.
    ///
    /// A no-op while already connected or connecting. This is the only operation that returns
    /// transport errors directly; everything afterwards goes to [`Client::on_error`].
    pub async fn connect(&self) -> Result<()> {
        self.inner.connect().await
    }

    /// Closes the connection, cancels reconnection, and drops every subscription.
    pub fn disconnect(&self) {
        self.inner.disconnect();
    }

    /// Registers the handler for errors that happen outside of any caller's call: transport
    /// failures, undecodable frames, and reconnection failures.
    ///
    /// Replaces any previously registered handler. Without one, errors are logged when the
    /// `tracing` feature is enabled and dropped otherwise.
    pub fn on_error<F>(&self, handler: F)
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.inner.errors().set(Arc::new(handler));
    }

    /// Subscribes `callback` to the raw `data` payloads of `channel`, optionally scoped to
    /// `symbol`.
    ///
    /// Registering the same channel and symbol again replaces the previous callback. If the
    /// connection is open the subscribe message is sent immediately, otherwise on the next
    /// successful [`Client::connect`] or reconnection.
    pub fn subscribe<F>(&self, channel: Channel, symbol: Option<&str>, callback: F) -> Unsubscribe
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.register(channel, symbol, Arc::new(callback))
    }

    /// Orderbook snapshots and updates for `symbol`.
    pub fn orderbook<F>(&self, symbol: &str, callback: F) -> Unsubscribe
    where
        F: Fn(OrderbookUpdate) + Send + Sync + 'static,
    {
        self.register(Channel::Orderbook, Some(symbol), self.typed(callback))
    }

    /// Public trades for `symbol`.
    pub fn trades<F>(&self, symbol: &str, callback: F) -> Unsubscribe
    where
        F: Fn(TradeUpdate) + Send + Sync + 'static,
    {
        self.register(Channel::Trades, Some(symbol), self.typed(callback))
    }

    /// Ticker snapshots for `symbol`.
    pub fn ticker<F>(&self, symbol: &str, callback: F) -> Unsubscribe
    where
        F: Fn(TickerUpdate) + Send + Sync + 'static,
    {
        self.register(Channel::Ticker, Some(symbol), self.typed(callback))
    }

    /// Order updates for the authenticated account.
    pub fn user_orders<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(OrderUpdate) + Send + Sync + 'static,
    {
        self.register(Channel::UserOrders, None, self.typed(callback))
    }

    /// Balance updates for the authenticated account.
    pub fn user_balances<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(BalanceUpdate) + Send + Sync + 'static,
    {
        self.register(Channel::UserBalances, None, self.typed(callback))
    }

    /// Get the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    /// Subscribe to connection state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_receiver()
    }

    /// Number of registered subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.subscription_count()
    }

    fn register(&self, channel: Channel, symbol: Option<&str>, callback: Callback) -> Unsubscribe {
        let symbol = symbol.map(ToOwned::to_owned);
        let key = self.inner.register(Subscription {
            channel,
            symbol: symbol.clone(),
            callback,
        });

        Unsubscribe {
            connection: Arc::downgrade(&self.inner),
            key,
            channel,
            symbol,
        }
    }

    /// Wraps `callback` so it receives decoded payloads; decode failures go to the error handler.
    fn typed<T, F>(&self, callback: F) -> Callback
    where
        T: DeserializeOwned,
        F: Fn(T) + Send + Sync + 'static,
    {
        let errors = Arc::clone(self.inner.errors());
        Arc::new(move |value: Value| match serde_json::from_value::<T>(value) {
            Ok(payload) => callback(payload),
            Err(e) => errors.report(WsError::MessageParse(e).into()),
        })
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("connection", &self.inner)
            .finish()
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        scheme => Err(Error::validation(format!(
            "WebSocket endpoint must use ws:// or wss://, got {scheme}://"
        ))),
    }
}

/// Handle returned by every subscribe call.
///
/// Dropping the handle leaves the subscription active; call [`Unsubscribe::unsubscribe`] to
/// remove it.
#[derive(Clone)]
pub struct Unsubscribe {
    connection: Weak<ConnectionManager>,
    key: String,
    channel: Channel,
    symbol: Option<String>,
}

impl Unsubscribe {
    /// Removes the subscription and, when connected, sends a single unsubscribe message.
    ///
    /// Later calls are no-ops.
    pub fn unsubscribe(&self) {
        if let Some(connection) = self.connection.upgrade() {
            connection.deregister(&self.key, self.channel, self.symbol.clone());
        }
    }

    /// The registry key, `channel` or `channel:symbol`.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
