//! Streams the account's order and balance updates.
//!
//! Requires `EXCHANGE_API_KEY` or `EXCHANGE_ACCESS_TOKEN`.
//!
//! ```sh
//! EXCHANGE_API_KEY=... RUST_LOG=info cargo run --example websocket_user --features tracing
//! ```

use std::time::Duration;

use exchange_client_sdk::auth::Credentials;
use exchange_client_sdk::ws::{Client, Config, ReconnectConfig};
use exchange_client_sdk::{ACCESS_TOKEN_VAR, API_KEY_VAR};
use tracing::{error, info};

const DEFAULT_WS_URL: &str = "wss://stream.exchange.example/ws";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let Some(credentials) = Credentials::from_env() else {
        anyhow::bail!("set {API_KEY_VAR} or {ACCESS_TOKEN_VAR}");
    };
    let endpoint = std::env::var("EXCHANGE_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.to_owned());

    let config = Config::default()
        .with_heartbeat_interval(Duration::from_secs(15))
        .with_reconnect(ReconnectConfig::default().with_max_attempts(None));
    let client = Client::with_credentials(&endpoint, &credentials, config)?;
    client.on_error(|e| error!(endpoint = "websocket", error = %e));

    let orders = client.user_orders(|order| {
        info!(
            endpoint = "user.orders",
            id = %order.id,
            symbol = %order.symbol,
            side = %order.side,
            status = %order.status,
            filled = ?order.filled_quantity
        );
    });
    let balances = client.user_balances(|balance| {
        info!(
            endpoint = "user.balances",
            asset = %balance.asset,
            available = %balance.available,
            locked = %balance.locked
        );
    });

    client.connect().await?;
    info!("listening for account updates for five minutes");
    tokio::time::sleep(Duration::from_secs(300)).await;

    orders.unsubscribe();
    balances.unsubscribe();
    client.disconnect();
    Ok(())
}
