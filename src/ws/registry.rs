//! Desired subscriptions, independent of any live transport.
//!
//! The registry is the source of truth for what the client wants to receive: every fresh
//! connection replays it, and inbound frames are resolved against it.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

use super::types::request::{Channel, SubscriptionRequest};

/// Callback invoked with the `data` payload of each matching inbound message.
pub type Callback = Arc<dyn Fn(Value) + Send + Sync>;

/// Identity key of a subscription: `channel` or `channel:symbol`.
#[must_use]
pub fn key(channel: Channel, symbol: Option<&str>) -> String {
    match symbol {
        Some(symbol) => format!("{channel}:{symbol}"),
        None => channel.to_string(),
    }
}

#[derive(Clone)]
pub(crate) struct Subscription {
    pub(crate) channel: Channel,
    pub(crate) symbol: Option<String>,
    pub(crate) callback: Callback,
}

impl Subscription {
    pub(crate) fn request(&self) -> SubscriptionRequest {
        SubscriptionRequest::subscribe(self.channel, self.symbol.clone())
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("symbol", &self.symbol)
            .finish_non_exhaustive()
    }
}

/// One entry per key; inserting an existing key replaces its callback.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionRegistry {
    entries: DashMap<String, Subscription>,
}

impl SubscriptionRegistry {
    /// Stores `subscription`, returning its key.
    pub(crate) fn insert(&self, subscription: Subscription) -> String {
        let key = key(subscription.channel, subscription.symbol.as_deref());
        self.entries.insert(key.clone(), subscription);
        key
    }

    /// Removes the entry at `key`, returning whether it existed.
    pub(crate) fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// The callback registered at `key`, cloned out so no shard lock is held while it runs.
    pub(crate) fn callback(&self, key: &str) -> Option<Callback> {
        self.entries
            .get(key)
            .map(|entry| Arc::clone(&entry.callback))
    }

    /// Subscribe messages for every entry, used to replay the registry on a fresh connection.
    pub(crate) fn requests(&self) -> Vec<SubscriptionRequest> {
        self.entries.iter().map(|entry| entry.request()).collect()
    }

    pub(crate) fn clear(&self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
