#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod auth;
pub mod error;
#[cfg(feature = "rest")]
pub mod rest;
pub(crate) mod serde_helpers;
pub mod types;
pub mod units;
#[cfg(feature = "ws")]
pub mod ws;

use std::fmt::Write as _;
#[cfg(feature = "rest")]
use std::time::Duration;

#[cfg(feature = "rest")]
use reqwest::{Method, Request, StatusCode, header::HeaderMap, header::RETRY_AFTER};
use serde::Serialize;
#[cfg(feature = "rest")]
use serde::de::DeserializeOwned;

use crate::error::Error;
#[cfg(feature = "rest")]
use crate::error::{InsufficientFunds, Kind, RateLimited, Status, Validation};

pub type Result<T> = std::result::Result<T, Error>;

/// Environment variable read by [`auth::Credentials::from_env`] for the API key.
pub const API_KEY_VAR: &str = "EXCHANGE_API_KEY";

/// Environment variable read by [`auth::Credentials::from_env`] for the bearer token.
pub const ACCESS_TOKEN_VAR: &str = "EXCHANGE_ACCESS_TOKEN";

/// Error `code` the API uses when an account cannot cover an operation.
#[cfg(feature = "rest")]
const INSUFFICIENT_FUNDS_CODE: &str = "insufficient_funds";

/// Trait for converting request types to URL query parameters.
///
/// This trait is automatically implemented for all types that implement [`Serialize`].
/// It uses [`serde_html_form`] to serialize the struct fields into a query string.
/// Arrays are serialized as repeated keys (`key=val1&key=val2`).
pub trait ToQueryParams: Serialize {
    /// Converts the request to a URL query string.
    ///
    /// Returns an empty string if no parameters are set, otherwise returns
    /// a string starting with `?` followed by URL-encoded key-value pairs.
    /// An optional cursor is appended as `cursor=…`.
    fn query_params(&self, cursor: Option<&str>) -> String {
        let mut params = serde_html_form::to_string(self)
            .inspect_err(|e| {
                #[cfg(feature = "tracing")]
                tracing::error!("Unable to convert to URL-encoded string {e:?}");
                #[cfg(not(feature = "tracing"))]
                let _: &serde_html_form::ser::Error = e;
            })
            .unwrap_or_default();

        if let Some(cursor) = cursor {
            if !params.is_empty() {
                params.push('&');
            }
            let _ = write!(params, "cursor={cursor}");
        }

        if params.is_empty() {
            String::new()
        } else {
            format!("?{params}")
        }
    }
}

impl<T: Serialize> ToQueryParams for T {}

#[cfg(feature = "rest")]
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        level = "debug",
        skip(client, request, headers),
        fields(
            method = %request.method(),
            path = request.url().path(),
            status_code
        )
    )
)]
async fn request<Response: DeserializeOwned>(
    client: &reqwest::Client,
    request: Request,
    headers: Option<HeaderMap>,
) -> Result<Response> {
    let method = request.method().clone();
    let path = request.url().path().to_owned();

    let response = execute(client, request, headers).await?;

    let json_value = response.json::<serde_json::Value>().await?;
    let response_data: Option<Response> = serde_helpers::deserialize_with_warnings(json_value)?;

    if let Some(response) = response_data {
        Ok(response)
    } else {
        #[cfg(feature = "tracing")]
        tracing::warn!(method = %method, path = %path, "API resource not found");
        Err(Error::status(
            StatusCode::NOT_FOUND,
            method,
            path,
            "Unable to find requested resource",
        ))
    }
}

/// Like [`request`], but returns the raw response body (e.g. images).
#[cfg(feature = "rest")]
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        level = "debug",
        skip(client, request, headers),
        fields(
            method = %request.method(),
            path = request.url().path(),
            status_code
        )
    )
)]
async fn request_bytes(
    client: &reqwest::Client,
    request: Request,
    headers: Option<HeaderMap>,
) -> Result<Vec<u8>> {
    let response = execute(client, request, headers).await?;

    Ok(response.bytes().await?.to_vec())
}

/// Sends `request` with `headers` merged on top, and maps non-2xx responses to errors.
#[cfg(feature = "rest")]
async fn execute(
    client: &reqwest::Client,
    mut request: Request,
    headers: Option<HeaderMap>,
) -> Result<reqwest::Response> {
    let method = request.method().clone();
    let path = request.url().path().to_owned();

    if let Some(h) = headers {
        request.headers_mut().extend(h);
    }

    let response = client.execute(request).await?;
    let status_code = response.status();

    #[cfg(feature = "tracing")]
    tracing::Span::current().record("status_code", status_code.as_u16());

    if status_code.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let message = response.text().await.unwrap_or_default();

    #[cfg(feature = "tracing")]
    tracing::warn!(
        status = %status_code,
        method = %method,
        path = %path,
        message = %message,
        "API request failed"
    );

    Err(status_error(status_code, method, path, message, retry_after))
}

/// Body shape the API uses for errors. Every field is optional since gateways in front of
/// the API may answer with plain text.
#[cfg(feature = "rest")]
#[derive(Debug, Default, serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
    code: Option<String>,
    details: Option<serde_json::Value>,
}

/// Maps a non-2xx response onto the most specific [`Kind`].
#[cfg(feature = "rest")]
fn status_error(
    status_code: StatusCode,
    method: Method,
    path: String,
    body: String,
    retry_after: Option<Duration>,
) -> Error {
    let ErrorBody {
        message,
        code,
        details,
    } = serde_json::from_str(&body).unwrap_or_default();
    let message = message.unwrap_or(body);

    if code.as_deref() == Some(INSUFFICIENT_FUNDS_CODE)
        || status_code == StatusCode::PAYMENT_REQUIRED
    {
        return InsufficientFunds { message }.into();
    }

    match status_code {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::status_with_kind(
            Kind::Authentication,
            Status {
                status_code,
                method,
                path,
                message,
            },
        ),
        StatusCode::TOO_MANY_REQUESTS => RateLimited {
            retry_after,
            message,
        }
        .into(),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Validation {
            reason: message,
            details,
        }
        .into(),
        _ => Error::status(status_code, method, path, message),
    }
}
