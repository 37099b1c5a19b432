//! Authenticated REST walkthrough: balances, a limit order, and an invoice.
//!
//! Requires `EXCHANGE_API_KEY` or `EXCHANGE_ACCESS_TOKEN`.
//!
//! ```sh
//! EXCHANGE_API_KEY=... RUST_LOG=info cargo run --example trading --features tracing
//! ```

use exchange_client_sdk::auth::Credentials;
use exchange_client_sdk::error::Kind;
use exchange_client_sdk::rest::types::request::{
    CreateInvoiceRequest, CreateOrderRequest, OrdersRequest,
};
use exchange_client_sdk::rest::{Client, Config};
use exchange_client_sdk::types::{OrderStatus, OrderType, Side, Uuid, dec};
use exchange_client_sdk::{ACCESS_TOKEN_VAR, API_KEY_VAR};
use tracing::{error, info, warn};

const DEFAULT_REST_URL: &str = "https://api.exchange.example/v1";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let Some(credentials) = Credentials::from_env() else {
        anyhow::bail!("set {API_KEY_VAR} or {ACCESS_TOKEN_VAR}");
    };
    let host = std::env::var("EXCHANGE_REST_URL").unwrap_or_else(|_| DEFAULT_REST_URL.to_owned());
    let client = Client::new(&host, Config::default())?.authenticate(credentials)?;

    for balance in client.balances().await? {
        info!(
            endpoint = "balances",
            asset = %balance.asset,
            available = %balance.available,
            locked = %balance.locked
        );
    }

    let order = CreateOrderRequest::builder()
        .symbol("BTC-USDT")
        .side(Side::Buy)
        .order_type(OrderType::Limit)
        .quantity(dec!(0.001))
        .price(dec!(20000))
        .client_order_id(Uuid::now_v7().to_string())
        .build();
    match client.create_order(&order).await {
        Ok(order) => {
            info!(endpoint = "create_order", id = %order.id, status = %order.status);

            let cancelled = client.cancel_order(&order.id).await?;
            info!(endpoint = "cancel_order", id = %cancelled.id, status = %cancelled.status);
        }
        Err(e) if e.kind() == Kind::InsufficientFunds => {
            warn!(endpoint = "create_order", error = %e, "not enough balance for demo order");
        }
        Err(e) => error!(endpoint = "create_order", error = %e),
    }

    let open = client
        .orders(&OrdersRequest::builder().status(OrderStatus::Open).build())
        .await?;
    info!(endpoint = "orders", open = open.len());

    let invoice = CreateInvoiceRequest::builder()
        .asset("USDC")
        .amount(dec!(12.5))
        .decimals(6)
        .description("demo invoice")
        .expires_in(900)
        .build();
    match client.create_invoice(&invoice).await {
        Ok(invoice) => {
            info!(
                endpoint = "create_invoice",
                id = %invoice.id,
                amount = %invoice.amount,
                raw = %invoice.amount_raw,
                status = %invoice.status
            );

            let qr = client.invoice_qr_code(&invoice.id).await?;
            info!(endpoint = "invoice_qr_code", bytes = qr.len());
        }
        Err(e) => error!(endpoint = "create_invoice", error = %e),
    }

    Ok(())
}
