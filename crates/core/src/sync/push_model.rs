//! Push channel contracts: tagged messages, connection state and subscriptions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::errors::Result;
use crate::rooms::{Room, RoomPatch};

/// Buffered events per subscription before the producer waits.
pub const SUBSCRIPTION_BUFFER: usize = 256;

/// Server-pushed message. The tag says which shape the payload has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PushMessage {
    /// Full listing; replaces the cache.
    Snapshot { rooms: Vec<Room> },
    /// Single-room partial update; merged by id.
    Delta { room: RoomPatch },
}

/// Observable state of the realtime connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

/// Event delivered to a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected,
    Disconnected { reason: String },
    Message(PushMessage),
}

/// A live subscription to a push channel.
///
/// Dropping it releases the subscription and stops any worker feeding it.
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::Receiver<ChannelEvent>,
    worker: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(events: mpsc::Receiver<ChannelEvent>) -> Self {
        Self {
            events,
            worker: None,
        }
    }

    /// Subscription fed by a background task that is aborted on drop.
    pub fn with_worker(events: mpsc::Receiver<ChannelEvent>, worker: JoinHandle<()>) -> Self {
        Self {
            events,
            worker: Some(worker),
        }
    }

    /// Next event, or `None` once the channel side has gone away.
    pub async fn next(&mut self) -> Option<ChannelEvent> {
        self.events.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.events.close();
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

/// Source of push subscriptions.
///
/// Implementations that spawn workers must be called from within a Tokio runtime.
pub trait PushChannel: Send + Sync {
    fn subscribe(&self) -> Result<Subscription>;
}

/// In-process push channel. Backs tests and offline use.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<ChannelEvent>>>>,
    opened: Arc<AtomicUsize>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a message to every live subscriber. Returns how many received it.
    pub fn publish(&self, message: PushMessage) -> usize {
        self.emit(ChannelEvent::Message(message))
    }

    /// Delivers any channel event, including connection changes.
    pub fn emit(&self, event: ChannelEvent) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|sender| !sender.is_closed());
        subscribers
            .iter()
            .filter(|sender| sender.try_send(event.clone()).is_ok())
            .count()
    }

    /// Subscriptions that are still open.
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|sender| !sender.is_closed());
        subscribers.len()
    }

    /// Subscriptions created over the channel's lifetime.
    pub fn subscriptions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl PushChannel for MemoryChannel {
    fn subscribe(&self) -> Result<Subscription> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Subscription::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rooms::RoomStatus;
    use serde_json::json;

    #[test]
    fn push_message_is_tagged_on_the_wire() {
        let delta: PushMessage = serde_json::from_value(json!({
            "kind": "delta",
            "room": { "_id": "A", "status": "dirty" }
        }))
        .unwrap();
        match delta {
            PushMessage::Delta { room } => {
                assert_eq!(room.id.as_str(), "A");
                assert_eq!(room.status, Some(RoomStatus::Dirty));
            }
            other => panic!("expected delta, got {:?}", other),
        }

        let snapshot = serde_json::to_value(PushMessage::Snapshot { rooms: vec![] }).unwrap();
        assert_eq!(snapshot, json!({ "kind": "snapshot", "rooms": [] }));
    }

    #[tokio::test]
    async fn dropped_subscription_stops_receiving() {
        let channel = MemoryChannel::new();
        let mut first = channel.subscribe().unwrap();
        let second = channel.subscribe().unwrap();
        assert_eq!(channel.subscriber_count(), 2);

        drop(second);
        assert_eq!(channel.subscriber_count(), 1);
        assert_eq!(channel.emit(ChannelEvent::Connected), 1);
        assert_eq!(first.next().await, Some(ChannelEvent::Connected));
        assert_eq!(channel.subscriptions_opened(), 2);
    }
}
