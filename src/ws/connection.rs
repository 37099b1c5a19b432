#![expect(
    clippy::module_name_repetitions,
    reason = "Connection types expose their domain in the name for clarity"
)]

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff as _;
use futures::{SinkExt as _, StreamExt as _};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, interval_at, sleep};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::config::Config;
use super::error::{ErrorSink, WsError};
use super::registry::{Subscription, SubscriptionRegistry};
use super::router::Router;
use super::types::request::{Channel, Heartbeat, SubscriptionRequest};
use crate::Result;
use crate::error::Error;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Capacity of the queue between the socket reader and the callback dispatcher.
const DISPATCH_CAPACITY: usize = 1024;

/// Connection state tracking.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,
    /// Attempting to connect
    Connecting,
    /// Successfully connected
    Connected {
        /// When the connection was established
        since: Instant,
    },
    /// Waiting to retry after an abnormal closure
    Reconnecting {
        /// Current reconnection attempt number
        attempt: u32,
    },
}

impl ConnectionState {
    /// Check if the connection is currently active.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

/// How a transport ended.
#[derive(Debug)]
enum Closure {
    /// Close handshake with the normal code, from either side
    Clean,
    /// Anything else, with the transport error when there was one
    Abnormal(Option<WsError>),
}

/// Outcome of a single dial.
enum Dial {
    Opened,
    /// `disconnect` ran while the dial was in flight
    Superseded,
    Failed(Error),
}

/// Handles that exist only while a transport is open.
struct Session {
    outbound: mpsc::UnboundedSender<Message>,
    heartbeat: JoinHandle<()>,
}

impl Session {
    fn send<R: Serialize>(&self, request: &R) -> Result<()> {
        let json = serde_json::to_string(request)?;
        self.outbound
            .send(Message::Text(json.into()))
            .map_err(|_e| WsError::ConnectionClosed)?;
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.heartbeat.abort();
    }
}

/// Mutable connection state. Only touched under [`ConnectionManager::lock`], which is never held
/// across an `.await` or while caller callbacks run.
struct Control {
    /// Bumped for every new transport and by `disconnect`; events tagged with an older epoch
    /// belong to a discarded transport and are ignored.
    epoch: u64,
    connecting: bool,
    session: Option<Session>,
    reconnect_enabled: bool,
    attempts: u32,
    backoff: ExponentialBackoff,
    pending_reconnect: Option<CancellationToken>,
}

/// Owns the transport lifecycle: dialing, heartbeats, closure detection, and reconnection with
/// exponential backoff.
///
/// Subscriptions live in a [`SubscriptionRegistry`] that outlives any single transport; each
/// successful dial replays it, so callers never resubscribe after a reconnect.
pub struct ConnectionManager {
    /// Endpoint with authentication query parameters already applied
    endpoint: Url,
    config: Config,
    registry: Arc<SubscriptionRegistry>,
    errors: Arc<ErrorSink>,
    control: Mutex<Control>,
    state_tx: watch::Sender<ConnectionState>,
}

impl ConnectionManager {
    pub(crate) fn new(endpoint: Url, config: Config) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            endpoint,
            control: Mutex::new(Control {
                epoch: 0,
                connecting: false,
                session: None,
                reconnect_enabled: config.reconnect.enabled,
                attempts: 0,
                backoff: config.reconnect.clone().into(),
                pending_reconnect: None,
            }),
            config,
            registry: Arc::default(),
            errors: Arc::default(),
            state_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn errors(&self) -> &Arc<ErrorSink> {
        &self.errors
    }

    /// Opens the transport and waits until it is ready.
    ///
    /// Returns immediately when a transport is already open or being dialed. A manual call
    /// re-enables reconnection and pre-empts any pending scheduled attempt.
    pub async fn connect(self: &Arc<Self>) -> Result<()> {
        let epoch = {
            let mut control = self.lock();
            if control.session.is_some() || control.connecting {
                return Ok(());
            }
            if let Some(token) = control.pending_reconnect.take() {
                token.cancel();
            }
            control.reconnect_enabled = self.config.reconnect.enabled;
            control.connecting = true;
            control.epoch
        };
        self.state_tx.send_replace(ConnectionState::Connecting);

        match self.establish(epoch).await {
            Dial::Opened => Ok(()),
            Dial::Superseded => Err(WsError::ConnectionClosed.into()),
            Dial::Failed(error) => {
                let control = self.lock();
                if control.epoch == epoch && !control.connecting && control.session.is_none() {
                    self.state_tx.send_replace(ConnectionState::Disconnected);
                }
                Err(error)
            }
        }
    }

    /// Closes the transport with the normal close code and forgets every subscription.
    ///
    /// Disables reconnection and cancels a pending attempt. Does not wait for the server to
    /// acknowledge the close.
    pub fn disconnect(&self) {
        let mut control = self.lock();
        control.reconnect_enabled = false;
        control.epoch += 1;
        control.connecting = false;
        control.attempts = 0;
        control.backoff.reset();
        if let Some(token) = control.pending_reconnect.take() {
            token.cancel();
        }
        if let Some(session) = control.session.take() {
            let close = Message::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "client disconnect".into(),
            }));
            _ = session.outbound.send(close);
        }
        self.registry.clear();
        drop(control);

        self.state_tx.send_replace(ConnectionState::Disconnected);

        #[cfg(feature = "tracing")]
        tracing::debug!("WebSocket disconnected by client");
    }

    /// Stores `subscription` and, when a transport is open, sends its subscribe message.
    pub(crate) fn register(&self, subscription: Subscription) -> String {
        let request = subscription.request();

        let control = self.lock();
        let key = self.registry.insert(subscription);
        if let Some(session) = &control.session
            && let Err(e) = session.send(&request)
        {
            // The closing transport will be replaced and the registry replayed.
            #[cfg(feature = "tracing")]
            tracing::debug!(%key, error = %e, "Deferring subscribe until reconnect");
            #[cfg(not(feature = "tracing"))]
            let _ = &e;
        }

        key
    }

    /// Removes the entry at `key`; sends one unsubscribe message if it existed and a transport
    /// is open.
    pub(crate) fn deregister(&self, key: &str, channel: Channel, symbol: Option<String>) {
        let control = self.lock();
        if !self.registry.remove(key) {
            return;
        }
        if let Some(session) = &control.session
            && let Err(e) = session.send(&SubscriptionRequest::unsubscribe(channel, symbol))
        {
            #[cfg(feature = "tracing")]
            tracing::debug!(%key, error = %e, "Unable to send unsubscribe");
            #[cfg(not(feature = "tracing"))]
            let _ = &e;
        }
    }

    /// Dials the endpoint and, on success, installs the new session.
    async fn establish(self: &Arc<Self>, epoch: u64) -> Dial {
        let dialed = connect_async(self.endpoint.as_str()).await;

        let mut control = self.lock();
        if control.epoch != epoch {
            return Dial::Superseded;
        }
        control.connecting = false;

        let ws_stream = match dialed {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    host = ?self.endpoint.host_str(),
                    error = %e,
                    "Unable to connect"
                );
                return Dial::Failed(e.into());
            }
        };

        control.epoch += 1;
        let epoch = control.epoch;
        control.attempts = 0;
        control.backoff.reset();

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let session = Session {
            heartbeat: tokio::spawn(heartbeat_loop(
                outbound.clone(),
                self.config.heartbeat_interval,
            )),
            outbound,
        };

        for request in self.registry.requests() {
            if let Err(e) = session.send(&request) {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "Unable to queue subscription replay");
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
            }
        }
        control.session = Some(session);
        drop(control);

        self.state_tx.send_replace(ConnectionState::Connected {
            since: Instant::now(),
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(epoch, "WebSocket connected");

        let router = Router::new(Arc::clone(&self.registry), Arc::clone(&self.errors));
        tokio::spawn(run_session(
            Arc::downgrade(self),
            epoch,
            ws_stream,
            outbound_rx,
            router,
        ));

        Dial::Opened
    }

    /// Handles the end of the transport tagged `epoch`.
    fn on_closed(self: &Arc<Self>, epoch: u64, closure: Closure) {
        let mut reports: Vec<Error> = Vec::new();
        {
            let mut control = self.lock();
            if control.epoch != epoch {
                return;
            }
            control.session = None;

            #[cfg(feature = "tracing")]
            tracing::debug!(epoch, ?closure, "WebSocket closed");

            match closure {
                Closure::Clean => {
                    self.state_tx.send_replace(ConnectionState::Disconnected);
                }
                Closure::Abnormal(error) => {
                    reports.extend(error.map(Error::from));
                    if control.reconnect_enabled {
                        reports.extend(self.schedule_reconnect(&mut control));
                    } else {
                        self.state_tx.send_replace(ConnectionState::Disconnected);
                    }
                }
            }
        }

        for error in reports {
            self.errors.report(error);
        }
    }

    /// Schedules the next attempt, or gives up once the cap is reached.
    ///
    /// Returns the exhaustion error to report once the lock is released.
    fn schedule_reconnect(self: &Arc<Self>, control: &mut Control) -> Option<Error> {
        if !control.reconnect_enabled || control.session.is_some() || control.connecting {
            return None;
        }

        if let Some(max) = self.config.reconnect.max_attempts
            && control.attempts >= max
        {
            control.reconnect_enabled = false;
            self.state_tx.send_replace(ConnectionState::Disconnected);

            #[cfg(feature = "tracing")]
            tracing::error!(attempts = control.attempts, "Giving up on reconnection");

            return Some(
                WsError::ReconnectExhausted {
                    attempts: control.attempts,
                }
                .into(),
            );
        }

        control.attempts = control.attempts.saturating_add(1);
        let attempt = control.attempts;
        let delay = control
            .backoff
            .next_backoff()
            .unwrap_or(self.config.reconnect.max_backoff);

        let token = CancellationToken::new();
        if let Some(previous) = control.pending_reconnect.replace(token.clone()) {
            previous.cancel();
        }
        self.state_tx
            .send_replace(ConnectionState::Reconnecting { attempt });

        #[cfg(feature = "tracing")]
        tracing::info!(attempt, ?delay, "Scheduling reconnection");

        tokio::spawn(Self::retry(
            Arc::downgrade(self),
            control.epoch,
            attempt,
            delay,
            token,
        ));

        None
    }

    /// Waits out `delay`, then dials again unless cancelled or superseded.
    async fn retry(
        manager: Weak<Self>,
        epoch: u64,
        attempt: u32,
        delay: Duration,
        token: CancellationToken,
    ) {
        tokio::select! {
            () = token.cancelled() => return,
            () = sleep(delay) => {}
        }

        let Some(manager) = manager.upgrade() else {
            return;
        };

        {
            let mut control = manager.lock();
            if token.is_cancelled()
                || control.epoch != epoch
                || control.session.is_some()
                || control.connecting
            {
                return;
            }
            control.pending_reconnect = None;
            control.connecting = true;
        }
        manager.state_tx.send_replace(ConnectionState::Connecting);

        let Dial::Failed(error) = manager.establish(epoch).await else {
            return;
        };

        let exhausted = {
            let mut control = manager.lock();
            if control.epoch != epoch {
                return;
            }
            manager.schedule_reconnect(&mut control)
        };

        manager.errors.report(
            WsError::ReconnectFailed {
                attempt,
                source: Box::new(error),
            }
            .into(),
        );
        if let Some(exhausted) = exhausted {
            manager.errors.report(exhausted);
        }
    }

    /// Get the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Subscribe to connection state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Number of subscriptions that will be replayed on the next connection.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        let control = self
            .control
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = control.pending_reconnect.take() {
            token.cancel();
        }
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("host", &self.endpoint.host_str())
            .field("config", &self.config)
            .field("state", &self.state())
            .field("subscriptions", &self.registry.len())
            .finish_non_exhaustive()
    }
}

/// Sends `{"type":"ping"}` every `period` until the session's outbound queue closes.
async fn heartbeat_loop(outbound: mpsc::UnboundedSender<Message>, period: Duration) {
    if period.is_zero() {
        return;
    }
    let Ok(ping) = serde_json::to_string(&Heartbeat::Ping) else {
        return;
    };

    let mut ticker = interval_at(time::Instant::now() + period, period);
    loop {
        ticker.tick().await;
        if outbound.send(Message::Text(ping.clone().into())).is_err() {
            break;
        }
    }
}

/// Owns the socket for one transport: forwards text frames to the dispatcher and writes queued
/// outbound messages, until either side closes.
async fn run_session(
    manager: Weak<ConnectionManager>,
    epoch: u64,
    ws_stream: WsStream,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    router: Router,
) {
    let (mut write, mut read) = ws_stream.split();
    let (frames_tx, frames_rx) = mpsc::channel(DISPATCH_CAPACITY);
    tokio::spawn(router.run(frames_rx));

    let closure = loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(text = %text.as_str(), "Received WebSocket text message");

                    if frames_tx.send(text).await.is_err() {
                        break Closure::Abnormal(None);
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    break match frame {
                        Some(frame) if frame.code == CloseCode::Normal => Closure::Clean,
                        _ => Closure::Abnormal(None),
                    };
                }
                // Binary frames and protocol-level ping/pong
                Some(Ok(_)) => {}
                Some(Err(e)) => break Closure::Abnormal(Some(WsError::Connection(e))),
                None => break Closure::Abnormal(None),
            },
            message = outbound.recv() => match message {
                Some(message) => {
                    let closing = matches!(message, Message::Close(_));
                    if let Err(e) = write.send(message).await {
                        break Closure::Abnormal(Some(WsError::Connection(e)));
                    }
                    if closing {
                        break Closure::Clean;
                    }
                }
                None => {
                    _ = write.send(Message::Close(None)).await;
                    break Closure::Clean;
                }
            },
        }
    };

    if let Some(manager) = manager.upgrade() {
        manager.on_closed(epoch, closure);
    }
}
