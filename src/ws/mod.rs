//! Real-time streaming over the exchange's WebSocket API.
//!
//! **Feature flag:** `ws` (enabled by default)
//!
//! # Architecture
//!
//! - [`Client`]: Public entry point; registers subscriptions and owns the connection
//! - [`ConnectionManager`]: Transport lifecycle with heartbeat and reconnection
//! - `registry`: Desired subscriptions keyed by `channel` or `channel:symbol`, replayed on every
//!   fresh connection
//! - `router`: Decodes inbound frames and hands each payload to the owning subscription
//!
//! # Example
//!
//! ```rust, no_run
//! use exchange_client_sdk::auth::Credentials;
//! use exchange_client_sdk::ws::{Client, Config};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let credentials = Credentials::api_key("my-api-key");
//! let client = Client::with_credentials("wss://stream.exchange.example/ws", &credentials, Config::default())?;
//! client.connect().await?;
//!
//! let orders = client.user_orders(|order| println!("{} is {}", order.id, order.status));
//! # orders.unsubscribe();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub(crate) mod registry;
pub(crate) mod router;
pub mod types;

pub use client::{Client, Unsubscribe};
pub use config::{Config, ReconnectConfig};
pub use connection::{ConnectionManager, ConnectionState};
#[expect(
    clippy::module_name_repetitions,
    reason = "WsError includes module name for clarity when used outside this module"
)]
pub use error::WsError;
pub use error::ErrorHandler;
pub use registry::{Callback, key};
pub use types::request::Channel;
