//! Post-commit change notification
//!
//! Stores publish an event after every committed state change: one
//! `merge` per accepted message, a `revoke` per message it displaced,
//! and a `prune` per eviction. Delivery is synchronous and in
//! subscription order, strictly after the batch commit. A failing
//! subscriber cannot undo the commit; the failure is logged and the
//! remaining subscribers still run.
//!
//! Subscribers must not register further subscribers from inside a
//! callback; publication holds the registry read lock.

use hubdb_core::{Message, Result};
use log::warn;
use parking_lot::RwLock;
use std::collections::HashMap;

/// The kind of a store event, used for subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A message was merged
    Merge,
    /// A message was displaced by a conflicting winner
    Revoke,
    /// A message was evicted by the pruner
    Prune,
}

/// A store state change, carrying the affected message
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// `message` was merged into the store
    MergeMessage(Message),
    /// `message` lost a conflict and was deleted
    RevokeMessage(Message),
    /// `message` was evicted by the pruner
    PruneMessage(Message),
}

impl StoreEvent {
    /// Returns the event's kind
    pub fn kind(&self) -> EventKind {
        match self {
            StoreEvent::MergeMessage(_) => EventKind::Merge,
            StoreEvent::RevokeMessage(_) => EventKind::Revoke,
            StoreEvent::PruneMessage(_) => EventKind::Prune,
        }
    }

    /// Returns the affected message
    pub fn message(&self) -> &Message {
        match self {
            StoreEvent::MergeMessage(message)
            | StoreEvent::RevokeMessage(message)
            | StoreEvent::PruneMessage(message) => message,
        }
    }
}

type Subscriber = Box<dyn Fn(&StoreEvent) -> Result<()> + Send + Sync>;

/// Synchronous fan-out registry for store events
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<EventKind, Vec<Subscriber>>>,
}

impl EventBus {
    /// Creates a bus with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber for one event kind
    ///
    /// Subscribers of the same kind are invoked in registration order.
    pub fn subscribe<F>(&self, kind: EventKind, subscriber: F)
    where
        F: Fn(&StoreEvent) -> Result<()> + Send + Sync + 'static,
    {
        self.subscribers
            .write()
            .entry(kind)
            .or_default()
            .push(Box::new(subscriber));
    }

    /// Delivers an event to every subscriber of its kind
    pub fn publish(&self, event: &StoreEvent) {
        let subscribers = self.subscribers.read();
        let Some(subscribers) = subscribers.get(&event.kind()) else {
            return;
        };
        for subscriber in subscribers {
            if let Err(e) = subscriber(event) {
                warn!("event subscriber failed for {:?}: {}", event.kind(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubdb_core::{Error, Fid, FollowBody, MessageBody, MessageData, MessageType, HASH_LENGTH};
    use std::sync::{Arc, Mutex};

    fn message() -> Message {
        Message {
            data: MessageData {
                fid: Fid::from_slice(b"alice").unwrap(),
                timestamp: 100,
                message_type: MessageType::FollowAdd,
                body: MessageBody::Follow(FollowBody {
                    user: Fid::from_slice(b"bob").unwrap(),
                }),
            },
            hash: [3; HASH_LENGTH],
        }
    }

    #[test]
    fn test_delivery_in_subscription_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let seen = Arc::clone(&seen);
            bus.subscribe(EventKind::Merge, move |_| {
                seen.lock().unwrap().push(i);
                Ok(())
            });
        }

        bus.publish(&StoreEvent::MergeMessage(message()));
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_kinds_are_isolated() {
        let bus = EventBus::new();
        let merges = Arc::new(Mutex::new(0));

        let count = Arc::clone(&merges);
        bus.subscribe(EventKind::Merge, move |_| {
            *count.lock().unwrap() += 1;
            Ok(())
        });

        bus.publish(&StoreEvent::PruneMessage(message()));
        bus.publish(&StoreEvent::MergeMessage(message()));
        assert_eq!(*merges.lock().unwrap(), 1);
    }

    #[test]
    fn test_failing_subscriber_does_not_stop_delivery() {
        let bus = EventBus::new();
        let delivered = Arc::new(Mutex::new(false));

        bus.subscribe(EventKind::Revoke, |_| {
            Err(Error::Unavailable("subscriber down".to_string()))
        });
        let flag = Arc::clone(&delivered);
        bus.subscribe(EventKind::Revoke, move |_| {
            *flag.lock().unwrap() = true;
            Ok(())
        });

        bus.publish(&StoreEvent::RevokeMessage(message()));
        assert!(*delivered.lock().unwrap());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        bus.publish(&StoreEvent::MergeMessage(message()));
    }
}
