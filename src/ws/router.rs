use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Utf8Bytes;

use super::error::{ErrorSink, WsError};
use super::registry::SubscriptionRegistry;
use super::types::response::{ControlMessage, InboundMessage};

/// Resolves inbound frames to subscriptions and invokes their callbacks.
#[derive(Clone, Debug)]
pub(crate) struct Router {
    registry: Arc<SubscriptionRegistry>,
    errors: Arc<ErrorSink>,
}

impl Router {
    pub(crate) fn new(registry: Arc<SubscriptionRegistry>, errors: Arc<ErrorSink>) -> Self {
        Self { registry, errors }
    }

    /// Decodes and dispatches a single text frame.
    ///
    /// Decode failures and panicking callbacks go to the error sink; frames that match no
    /// subscription are dropped.
    pub(crate) fn handle_message(&self, text: &str) {
        let message = match serde_json::from_str::<InboundMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(%text, error = %e, "Failed to parse WebSocket message");
                self.errors.report(WsError::MessageParse(e).into());
                return;
            }
        };

        let data = match message {
            InboundMessage::Data(data) => data,
            InboundMessage::Control(ControlMessage::Pong) => return,
            InboundMessage::Control(control) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(?control, "Ignoring control message");
                #[cfg(not(feature = "tracing"))]
                let _ = control;
                return;
            }
        };

        let key = data.routing_key();
        let callback = self
            .registry
            .callback(&key)
            .or_else(|| self.registry.callback(&data.channel));

        match callback {
            Some(callback) => {
                if catch_unwind(AssertUnwindSafe(|| callback(data.data))).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::error!(%key, "Subscription callback panicked");
                    self.errors.report(WsError::CallbackPanicked { key }.into());
                }
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::trace!(%key, "Dropping message with no matching subscription");
            }
        }
    }

    /// Dispatches frames in arrival order until the sender side is dropped.
    pub(crate) async fn run(self, mut frames: mpsc::Receiver<Utf8Bytes>) {
        while let Some(frame) = frames.recv().await {
            self.handle_message(frame.as_str());
        }
    }
}
