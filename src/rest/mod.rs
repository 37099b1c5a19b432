//! Request/response client for the exchange's REST API.
//!
//! **Feature flag:** `rest` (enabled by default)
//!
//! A [`Client`] starts [`Unauthenticated`](crate::auth::state::Unauthenticated) and can only
//! reach market data. [`Client::authenticate`] elevates it with [`Credentials`](crate::auth::Credentials)
//! so trading, wallet, and invoice endpoints become available.
//!
//! ## Public Endpoints
//!
//! | Endpoint | Description |
//! |----------|-------------|
//! | `GET /markets` | All listed markets |
//! | `GET /markets/{symbol}` | Single market details |
//! | `GET /markets/{symbol}/orderbook` | Orderbook depth |
//! | `GET /markets/{symbol}/trades` | Recent public trades |
//! | `GET /markets/{symbol}/ticker` | 24h ticker |
//!
//! ## Authenticated Endpoints
//!
//! | Endpoint | Description |
//! |----------|-------------|
//! | `POST /orders` | Place an order |
//! | `DELETE /orders/{id}` | Cancel an order |
//! | `DELETE /orders` | Cancel every open order, optionally for one symbol |
//! | `GET /orders/{id}` | Single order |
//! | `GET /orders` | Orders, filtered by symbol and status |
//! | `GET /wallet/balances` | Balances per asset |
//! | `POST /wallet/withdrawals` | Request a withdrawal |
//! | `GET /wallet/withdrawals/{id}` | Withdrawal status |
//! | `POST /invoices` | Create an invoice |
//! | `GET /invoices/{id}` | Single invoice |
//! | `GET /invoices` | Invoices, filtered by status |
//! | `GET /invoices/{id}/qr` | Invoice QR code image |
//!
//! # Example
//!
//! ```rust, no_run
//! use exchange_client_sdk::rest::{Client, Config};
//! use exchange_client_sdk::rest::types::request::OrderbookRequest;
//!
//! # async fn example() -> exchange_client_sdk::Result<()> {
//! let client = Client::new("https://api.exchange.example/v1", Config::default())?;
//!
//! let request = OrderbookRequest::builder().symbol("BTC-USDT").depth(20).build();
//! let book = client.orderbook(&request).await?;
//! println!("best bid: {:?}", book.bids.first());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod types;

pub use client::{Client, Config};
