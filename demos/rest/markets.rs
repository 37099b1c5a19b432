//! Lists markets and prints public market data for one symbol.
//!
//! Run with tracing enabled:
//! ```sh
//! RUST_LOG=info,hyper_util=off,hyper=off,reqwest=off,h2=off,rustls=off cargo run --example markets --features tracing
//! ```
//!
//! Point it at another deployment with `EXCHANGE_REST_URL`, and pick the symbol with `SYMBOL`.

use exchange_client_sdk::rest::types::request::{OrderbookRequest, TradesRequest};
use exchange_client_sdk::rest::{Client, Config};
use tracing::{error, info};

const DEFAULT_REST_URL: &str = "https://api.exchange.example/v1";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let host = std::env::var("EXCHANGE_REST_URL").unwrap_or_else(|_| DEFAULT_REST_URL.to_owned());
    let symbol = std::env::var("SYMBOL").unwrap_or_else(|_| "BTC-USDT".to_owned());
    let client = Client::new(&host, Config::default())?;

    match client.markets().await {
        Ok(markets) => {
            info!(endpoint = "markets", count = markets.len());
            for market in &markets {
                info!(
                    endpoint = "markets",
                    symbol = %market.symbol,
                    base = %market.base_asset,
                    quote = %market.quote_asset
                );
            }
        }
        Err(e) => error!(endpoint = "markets", error = %e),
    }

    match client.ticker(&symbol).await {
        Ok(ticker) => info!(
            endpoint = "ticker",
            symbol = %ticker.symbol,
            last_price = %ticker.last_price,
            volume_24h = ?ticker.volume_24h
        ),
        Err(e) => error!(endpoint = "ticker", error = %e),
    }

    let request = OrderbookRequest::builder()
        .symbol(symbol.clone())
        .depth(5)
        .build();
    match client.orderbook(&request).await {
        Ok(book) => {
            for bid in &book.bids {
                info!(endpoint = "orderbook", side = "bid", price = %bid.price, quantity = %bid.quantity);
            }
            for ask in &book.asks {
                info!(endpoint = "orderbook", side = "ask", price = %ask.price, quantity = %ask.quantity);
            }
        }
        Err(e) => error!(endpoint = "orderbook", error = %e),
    }

    let request = TradesRequest::builder().symbol(symbol).limit(10).build();
    match client.trades(&request).await {
        Ok(trades) => {
            for trade in trades {
                info!(
                    endpoint = "trades",
                    id = %trade.id,
                    side = %trade.side,
                    price = %trade.price,
                    quantity = %trade.quantity
                );
            }
        }
        Err(e) => error!(endpoint = "trades", error = %e),
    }

    Ok(())
}
