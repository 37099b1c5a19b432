use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client as ReqwestClient, Method, Request};
use serde::Serialize;
use url::Url;

use crate::auth::Credentials;
use crate::auth::state::{Authenticated, State, Unauthenticated};
use crate::error::{Error, Synchronization};
use crate::rest::types::request::{
    CreateInvoiceRequest, CreateOrderRequest, InvoicesRequest, OrderbookRequest, OrdersRequest,
    TradesRequest, WithdrawalRequest,
};
use crate::rest::types::response::{
    Balance, CancelOrdersResponse, Invoice, Market, Order, Orderbook, Ticker, Trade, Withdrawal,
};
use crate::{Result, ToQueryParams as _};

const DEFAULT_USER_AGENT: &str = concat!("exchange-client-sdk/", env!("CARGO_PKG_VERSION"));

/// Configuration for [`Client`]
#[derive(Clone, Debug, Default, Builder)]
pub struct Config {
    /// Total time allowed for each request, from connecting until the body is read. Unbounded
    /// when unset.
    timeout: Option<Duration>,
    /// Overrides the `User-Agent` header sent with every request.
    #[builder(into)]
    user_agent: Option<String>,
}

/// Client for the exchange REST API.
///
/// A [`Client`] is either [`Unauthenticated`] or [`Authenticated`]; trading, wallet and
/// invoice methods only exist on the latter. Cloning is cheap and clones share one connection
/// pool.
///
/// ```rust,no_run
/// use exchange_client_sdk::auth::Credentials;
/// use exchange_client_sdk::rest::{Client, Config};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = Client::new("https://api.exchange.example/v1", Config::default())?
///         .authenticate(Credentials::api_key("my-api-key"))?;
///
///     for balance in client.balances().await? {
///         println!("{}: {}", balance.asset, balance.available);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Client<S: State = Unauthenticated> {
    inner: Arc<ClientInner<S>>,
}

#[derive(Debug)]
struct ClientInner<S: State> {
    config: Config,
    /// The current [`State`] of this client
    state: S,
    /// Base [`Url`] every endpoint path is appended to, always ending in `/`.
    host: Url,
    client: ReqwestClient,
}

impl Client<Unauthenticated> {
    /// Creates an unauthenticated client against `host`, e.g. `https://api.exchange.example/v1`.
    pub fn new(host: &str, config: Config) -> Result<Client<Unauthenticated>> {
        let mut headers = HeaderMap::new();

        let user_agent = match config.user_agent.as_deref() {
            Some(user_agent) => HeaderValue::from_str(user_agent)?,
            None => HeaderValue::from_static(DEFAULT_USER_AGENT),
        };
        headers.insert(USER_AGENT, user_agent);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let mut builder = ReqwestClient::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                state: Unauthenticated,
                host: parse_host(host)?,
                client,
            }),
        })
    }

    /// Elevates this client with `credentials`, unlocking the private endpoints.
    ///
    /// Fails with [`Kind::Synchronization`](crate::error::Kind::Synchronization) if other
    /// clones of this client are still alive.
    pub fn authenticate(self, credentials: Credentials) -> Result<Client<Authenticated>> {
        if credentials.method().is_none() {
            return Err(Error::validation(
                "Credentials must carry an API key or an access token",
            ));
        }

        let inner = Arc::into_inner(self.inner).ok_or(Synchronization)?;

        Ok(Client {
            inner: Arc::new(ClientInner {
                config: inner.config,
                state: Authenticated { credentials },
                host: inner.host,
                client: inner.client,
            }),
        })
    }
}

impl<S: State> Client<S> {
    /// Returns the base URL requests are made against.
    #[must_use]
    pub fn host(&self) -> &Url {
        &self.inner.host
    }

    pub async fn markets(&self) -> Result<Vec<Market>> {
        let request = self.get("markets")?;

        crate::request(&self.inner.client, request, None).await
    }

    pub async fn market(&self, symbol: &str) -> Result<Market> {
        let request = self.get(&format!("markets/{symbol}"))?;

        crate::request(&self.inner.client, request, None).await
    }

    /// Orderbook depth for `request.symbol`, best levels first.
    pub async fn orderbook(&self, request: &OrderbookRequest) -> Result<Orderbook> {
        let request = self.get(&format!(
            "markets/{}/orderbook{}",
            request.symbol,
            request.query_params(None)
        ))?;

        crate::request(&self.inner.client, request, None).await
    }

    /// Most recent public trades for `request.symbol`, newest first.
    pub async fn trades(&self, request: &TradesRequest) -> Result<Vec<Trade>> {
        let request = self.get(&format!(
            "markets/{}/trades{}",
            request.symbol,
            request.query_params(None)
        ))?;

        crate::request(&self.inner.client, request, None).await
    }

    pub async fn ticker(&self, symbol: &str) -> Result<Ticker> {
        let request = self.get(&format!("markets/{symbol}/ticker"))?;

        crate::request(&self.inner.client, request, None).await
    }

    fn get(&self, path: &str) -> Result<Request> {
        self.build(Method::GET, path, None::<&()>)
    }

    fn build<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Request> {
        let mut builder = self
            .inner
            .client
            .request(method, format!("{}{path}", self.inner.host));
        if let Some(body) = body {
            builder = builder.json(body);
        }

        Ok(builder.build()?)
    }
}

impl Client<Authenticated> {
    /// Demotes this client back to [`Unauthenticated`], dropping its credentials.
    pub fn deauthenticate(self) -> Result<Client<Unauthenticated>> {
        let inner = Arc::into_inner(self.inner).ok_or(Synchronization)?;

        Ok(Client {
            inner: Arc::new(ClientInner {
                config: inner.config,
                state: Unauthenticated,
                host: inner.host,
                client: inner.client,
            }),
        })
    }

    /// Places a new order.
    ///
    /// # Errors
    ///
    /// Returns a [`Kind::Validation`](crate::error::Kind::Validation) error without contacting
    /// the API when the order is malformed, e.g. a limit order without a price.
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order> {
        request.validate()?;
        let request = self.build(Method::POST, "orders", Some(request))?;

        self.send(request).await
    }

    pub async fn cancel_order(&self, id: &str) -> Result<Order> {
        let request = self.build(Method::DELETE, &format!("orders/{id}"), None::<&()>)?;

        self.send(request).await
    }

    /// Cancels every open order, or only those on `symbol`.
    pub async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<CancelOrdersResponse> {
        #[derive(Serialize)]
        struct Filter<'sym> {
            #[serde(skip_serializing_if = "Option::is_none")]
            symbol: Option<&'sym str>,
        }

        let query = Filter { symbol }.query_params(None);
        let request = self.build(Method::DELETE, &format!("orders{query}"), None::<&()>)?;

        self.send(request).await
    }

    pub async fn order(&self, id: &str) -> Result<Order> {
        let request = self.get(&format!("orders/{id}"))?;

        self.send(request).await
    }

    pub async fn orders(&self, request: &OrdersRequest) -> Result<Vec<Order>> {
        let request = self.get(&format!("orders{}", request.query_params(None)))?;

        self.send(request).await
    }

    pub async fn balances(&self) -> Result<Vec<Balance>> {
        let request = self.get("wallet/balances")?;

        self.send(request).await
    }

    /// Requests a withdrawal. The amount is converted to base units before it is sent.
    pub async fn withdraw(&self, request: &WithdrawalRequest) -> Result<Withdrawal> {
        let body = request.body()?;
        let request = self.build(Method::POST, "wallet/withdrawals", Some(&body))?;

        self.send(request).await
    }

    pub async fn withdrawal(&self, id: &str) -> Result<Withdrawal> {
        let request = self.get(&format!("wallet/withdrawals/{id}"))?;

        self.send(request).await
    }

    /// Creates an invoice. The amount is converted to base units before it is sent.
    pub async fn create_invoice(&self, request: &CreateInvoiceRequest) -> Result<Invoice> {
        let body = request.body()?;
        let request = self.build(Method::POST, "invoices", Some(&body))?;

        self.send(request).await
    }

    pub async fn invoice(&self, id: &str) -> Result<Invoice> {
        let request = self.get(&format!("invoices/{id}"))?;

        self.send(request).await
    }

    pub async fn invoices(&self, request: &InvoicesRequest) -> Result<Vec<Invoice>> {
        let request = self.get(&format!("invoices{}", request.query_params(None)))?;

        self.send(request).await
    }

    /// The invoice's payment QR code as raw image bytes.
    pub async fn invoice_qr_code(&self, id: &str) -> Result<Vec<u8>> {
        let request = self.get(&format!("invoices/{id}/qr"))?;
        let headers = self.inner.state.credentials.headers()?;

        crate::request_bytes(&self.inner.client, request, Some(headers)).await
    }

    async fn send<Response: serde::de::DeserializeOwned>(
        &self,
        request: Request,
    ) -> Result<Response> {
        let headers = self.inner.state.credentials.headers()?;

        crate::request(&self.inner.client, request, Some(headers)).await
    }
}

fn parse_host(host: &str) -> Result<Url> {
    let mut url = Url::parse(host)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::validation(format!(
            "REST host must use http:// or https://, got {scheme}://"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Kind;

    #[test]
    fn host_should_gain_trailing_slash() {
        let client = Client::new("https://api.exchange.example/v1", Config::default()).unwrap();
        assert_eq!(client.host().as_str(), "https://api.exchange.example/v1/");

        let client = Client::new("http://127.0.0.1:8080", Config::default()).unwrap();
        assert_eq!(client.host().as_str(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn host_should_require_http_scheme() {
        let err = Client::new("wss://api.exchange.example", Config::default()).unwrap_err();

        assert_eq!(err.kind(), Kind::Validation);
    }

    #[test]
    fn authenticate_should_require_credentials() {
        let client = Client::new("https://api.exchange.example", Config::default()).unwrap();

        let err = client.authenticate(Credentials::default()).unwrap_err();
        assert_eq!(err.kind(), Kind::Validation);
    }

    #[test]
    fn authenticate_should_fail_while_clones_are_alive() {
        let client = Client::new("https://api.exchange.example", Config::default()).unwrap();
        let _clone = client.clone();

        let err = client.authenticate(Credentials::api_key("key")).unwrap_err();
        assert_eq!(err.kind(), Kind::Synchronization);
    }

    #[test]
    fn config_should_apply_user_agent() {
        let config = Config::builder()
            .user_agent("my-bot/1.0")
            .timeout(Duration::from_secs(5))
            .build();

        let client = Client::new("https://api.exchange.example", config)
            .unwrap()
            .authenticate(Credentials::bearer("token"))
            .unwrap()
            .deauthenticate()
            .unwrap();
        assert_eq!(client.inner.config.user_agent.as_deref(), Some("my-bot/1.0"));
    }
}
