use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

/// HTTP method type, re-exported for use with error inspection.
pub use reqwest::Method;
/// HTTP status code type, re-exported for use with error inspection.
pub use reqwest::StatusCode;
use reqwest::header;

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Error related to a non-successful HTTP call that has no more specific kind
    Status,
    /// The API rejected the supplied credentials (HTTP 401/403)
    Authentication,
    /// The API is throttling this client (HTTP 429)
    RateLimit,
    /// Error related to invalid input, either caught locally or rejected by the API
    Validation,
    /// The account does not hold enough funds for the requested operation
    InsufficientFunds,
    /// The HTTP request timed out
    Timeout,
    /// The HTTP request could not reach the API
    Network,
    /// Another clone of the client is alive while it is being promoted or demoted
    Synchronization,
    /// Internal error from dependencies
    Internal,
    /// Error related to WebSocket connections
    WebSocket,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    backtrace: Backtrace,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            backtrace: Backtrace::capture(),
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let e = self.source.as_deref()?;
        e.downcast_ref::<E>()
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Validation {
            reason: message.into(),
            details: None,
        }
        .into()
    }

    pub fn status<S: Into<String>>(
        status_code: StatusCode,
        method: Method,
        path: String,
        message: S,
    ) -> Self {
        Status {
            status_code,
            method,
            path,
            message: message.into(),
        }
        .into()
    }

    /// Wraps a [`Status`] under a more specific [`Kind`] derived from the response.
    pub(crate) fn status_with_kind(kind: Kind, status: Status) -> Self {
        Error::with_source(kind, status)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(src) => write!(f, "{:?}: {}", self.kind, src),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

#[non_exhaustive]
#[derive(Debug)]
pub struct Status {
    pub status_code: StatusCode,
    pub method: Method,
    pub path: String,
    pub message: String,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error({}) making {} call to {} with {}",
            self.status_code, self.method, self.path, self.message
        )
    }
}

impl StdError for Status {}

#[non_exhaustive]
#[derive(Debug)]
pub struct Validation {
    pub reason: String,
    /// Field-level details returned by the API, when present
    pub details: Option<serde_json::Value>,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "invalid: {} ({details})", self.reason),
            None => write!(f, "invalid: {}", self.reason),
        }
    }
}

impl StdError for Validation {}

#[non_exhaustive]
#[derive(Debug)]
pub struct Synchronization;

impl fmt::Display for Synchronization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "synchronization error: the client is still shared while changing authentication state"
        )
    }
}

impl StdError for Synchronization {}

/// The API asked this client to back off.
#[non_exhaustive]
#[derive(Debug)]
pub struct RateLimited {
    /// Value of the `Retry-After` header, when the API sent one
    pub retry_after: Option<Duration>,
    pub message: String,
}

impl fmt::Display for RateLimited {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.retry_after {
            Some(after) => write!(
                f,
                "rate limited, retry after {}s: {}",
                after.as_secs(),
                self.message
            ),
            None => write!(f, "rate limited: {}", self.message),
        }
    }
}

impl StdError for RateLimited {}

#[non_exhaustive]
#[derive(Debug)]
pub struct InsufficientFunds {
    pub message: String,
}

impl fmt::Display for InsufficientFunds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "insufficient funds: {}", self.message)
    }
}

impl StdError for InsufficientFunds {}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            Kind::Timeout
        } else if e.is_connect() || e.is_request() {
            Kind::Network
        } else {
            Kind::Internal
        };
        Error::with_source(kind, e)
    }
}

impl From<header::InvalidHeaderValue> for Error {
    fn from(e: header::InvalidHeaderValue) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

impl From<rust_decimal::Error> for Error {
    fn from(e: rust_decimal::Error) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

impl From<Validation> for Error {
    fn from(err: Validation) -> Self {
        Error::with_source(Kind::Validation, err)
    }
}

impl From<Status> for Error {
    fn from(err: Status) -> Self {
        Error::with_source(Kind::Status, err)
    }
}

impl From<Synchronization> for Error {
    fn from(err: Synchronization) -> Self {
        Error::with_source(Kind::Synchronization, err)
    }
}

impl From<RateLimited> for Error {
    fn from(err: RateLimited) -> Self {
        Error::with_source(Kind::RateLimit, err)
    }
}

impl From<InsufficientFunds> for Error {
    fn from(err: InsufficientFunds) -> Self {
        Error::with_source(Kind::InsufficientFunds, err)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rate_limited_display_should_include_retry_after() {
        let err = RateLimited {
            retry_after: Some(Duration::from_secs(30)),
            message: "slow down".to_owned(),
        };

        assert_eq!(err.to_string(), "rate limited, retry after 30s: slow down");
    }

    #[test]
    fn validation_into_error_should_keep_details() {
        let error: Error = Validation {
            reason: "bad order".to_owned(),
            details: Some(json!({ "price": "must be positive" })),
        }
        .into();

        assert_eq!(error.kind(), Kind::Validation);
        let validation = error.downcast_ref::<Validation>().unwrap();
        assert_eq!(
            validation.details,
            Some(json!({ "price": "must be positive" }))
        );
        assert!(error.to_string().contains("must be positive"));
    }

    #[test]
    fn status_with_kind_should_override_kind() {
        let status = Status {
            status_code: StatusCode::UNAUTHORIZED,
            method: Method::GET,
            path: "/wallet/balances".to_owned(),
            message: "bad key".to_owned(),
        };

        let error = Error::status_with_kind(Kind::Authentication, status);

        assert_eq!(error.kind(), Kind::Authentication);
        assert_eq!(
            error.downcast_ref::<Status>().unwrap().status_code,
            StatusCode::UNAUTHORIZED
        );
    }
}
