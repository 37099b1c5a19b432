#![expect(
    clippy::module_name_repetitions,
    reason = "Error types include the module name to indicate their scope"
)]

use std::error::Error as StdError;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{Error, Kind};

/// WebSocket error variants.
#[non_exhaustive]
#[derive(Debug)]
pub enum WsError {
    /// Error connecting to or communicating with the WebSocket server
    Connection(tokio_tungstenite::tungstenite::Error),
    /// Error parsing a WebSocket message
    MessageParse(serde_json::Error),
    /// WebSocket connection was closed
    ConnectionClosed,
    /// Reconnection stopped after the configured number of attempts
    ReconnectExhausted {
        /// Number of attempts that were made
        attempts: u32,
    },
    /// A single scheduled reconnection attempt failed
    ReconnectFailed {
        /// Attempt number, starting at 1
        attempt: u32,
        source: Box<Error>,
    },
    /// A subscription callback panicked while handling a message
    CallbackPanicked {
        /// Routing key of the message being handled
        key: String,
    },
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(e) => write!(f, "WebSocket connection error: {e}"),
            Self::MessageParse(e) => write!(f, "Failed to parse WebSocket message: {e}"),
            Self::ConnectionClosed => write!(f, "WebSocket connection closed"),
            Self::ReconnectExhausted { attempts } => {
                write!(f, "max reconnection attempts reached ({attempts})")
            }
            Self::ReconnectFailed { attempt, source } => {
                write!(f, "Reconnection attempt {attempt} failed: {source}")
            }
            Self::CallbackPanicked { key } => {
                write!(f, "Callback for subscription {key} panicked")
            }
        }
    }
}

impl StdError for WsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Connection(e) => Some(e),
            Self::MessageParse(e) => Some(e),
            Self::ReconnectFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

// Integration with main Error type
impl From<WsError> for Error {
    fn from(e: WsError) -> Self {
        Error::with_source(Kind::WebSocket, e)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::with_source(Kind::WebSocket, WsError::Connection(e))
    }
}

/// Callback receiving every error that cannot be returned to a caller.
pub type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync>;

/// Single destination for asynchronous failures (transport, decode, reconnect).
#[derive(Default)]
pub(crate) struct ErrorSink {
    handler: RwLock<Option<ErrorHandler>>,
}

impl ErrorSink {
    pub(crate) fn set(&self, handler: ErrorHandler) {
        *self.handler.write().unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    /// Hands `error` to the registered handler, or logs it when there is none.
    pub(crate) fn report(&self, error: Error) {
        let handler = self
            .handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match handler {
            Some(handler) => handler(&error),
            None => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%error, "Unhandled WebSocket error");
                #[cfg(not(feature = "tracing"))]
                let _ = &error;
            }
        }
    }
}

impl fmt::Debug for ErrorSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered = self
            .handler
            .read()
            .map(|handler| handler.is_some())
            .unwrap_or_default();
        f.debug_struct("ErrorSink")
            .field("handler", &registered)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn report_should_reach_registered_handler() {
        let sink = ErrorSink::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        sink.set(Arc::new(move |error: &Error| {
            seen_clone.lock().unwrap().push(error.to_string());
        }));
        sink.report(WsError::ReconnectExhausted { attempts: 3 }.into());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("max reconnection attempts reached"));
    }

    #[test]
    fn report_without_handler_should_not_panic() {
        ErrorSink::default().report(WsError::ConnectionClosed.into());
    }

    #[test]
    fn reconnect_failed_should_expose_source() {
        let error: Error = WsError::ReconnectFailed {
            attempt: 2,
            source: Box::new(WsError::ConnectionClosed.into()),
        }
        .into();

        assert_eq!(error.kind(), Kind::WebSocket);
        let ws = error.downcast_ref::<WsError>().unwrap();
        assert!(matches!(ws, WsError::ReconnectFailed { attempt: 2, .. }));
        assert!(ws.source().is_some());
    }
}
