//! Streams orderbook and ticker updates for two symbols.
//!
//! ```sh
//! RUST_LOG=info,exchange_client_sdk=debug cargo run --example websocket_market --features tracing
//! ```

use std::time::Duration;

use exchange_client_sdk::ws::{Client, Config};
use tracing::{debug, error, info};

const DEFAULT_WS_URL: &str = "wss://stream.exchange.example/ws";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let endpoint = std::env::var("EXCHANGE_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.to_owned());
    let client = Client::new(&endpoint, Config::default())?;
    client.on_error(|e| error!(endpoint = "websocket", error = %e));

    for symbol in ["BTC-USDT", "ETH-USDT"] {
        client.orderbook(symbol, |book| {
            info!(
                endpoint = "orderbook",
                symbol = %book.symbol,
                bids = book.bids.len(),
                asks = book.asks.len(),
                best_bid = ?book.bids.first().map(|level| level.price),
                best_ask = ?book.asks.first().map(|level| level.price)
            );
        });
        client.ticker(symbol, |ticker| {
            debug!(endpoint = "ticker", symbol = %ticker.symbol, last_price = %ticker.last_price);
        });
    }

    client.connect().await?;
    info!(subscriptions = client.subscription_count(), "connected");

    let mut states = client.state_receiver();
    let watch_states = async {
        while states.changed().await.is_ok() {
            info!(state = ?*states.borrow(), "connection state changed");
        }
    };

    tokio::select! {
        () = watch_states => {}
        () = tokio::time::sleep(Duration::from_secs(60)) => {}
    }

    client.disconnect();
    Ok(())
}
