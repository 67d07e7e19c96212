// Change-event plumbing: subscription bus + hub long-poll pump
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::hub::HubClient;

/// How long to wait before reconnecting after a failed event poll.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// "Something changed on the hub." A notice without a `list_id` means
/// every subscriber should consider its data stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    pub list_id: Option<String>,
}

/// Opaque handle identifying one subscription on a [`ChangeBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

/// A live subscription: the token to unsubscribe with plus the receiving
/// end of the notice channel. The channel closes once the token is
/// unsubscribed or the bus is dropped.
pub struct ChangeSubscription {
    pub token: SubscriptionToken,
    pub receiver: mpsc::UnboundedReceiver<ChangeNotice>,
}

/// Fan-out bus for change notices.
///
/// Subscribers get their own unbounded channel so a slow consumer never
/// blocks the poller or other subscribers. Explicit tokens instead of
/// drop-based cleanup: callers unsubscribe on teardown, and publish
/// prunes whatever they forgot.
pub struct ChangeBus {
    next_token: AtomicU64,
    senders: Mutex<HashMap<u64, mpsc::UnboundedSender<ChangeNotice>>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self {
            next_token: AtomicU64::new(1),
            senders: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self) -> ChangeSubscription {
        let token = self.next_token.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();

        self.senders
            .lock()
            .expect("change bus lock poisoned")
            .insert(token, tx);

        debug!("change subscription {} registered", token);

        ChangeSubscription {
            token: SubscriptionToken(token),
            receiver: rx,
        }
    }

    pub fn unsubscribe(&self, token: SubscriptionToken) {
        let removed = self
            .senders
            .lock()
            .expect("change bus lock poisoned")
            .remove(&token.0);

        if removed.is_some() {
            debug!("change subscription {} removed", token.0);
        }
    }

    /// Deliver a notice to every live subscriber, pruning dead ones.
    pub fn publish(&self, notice: ChangeNotice) {
        let mut senders = self.senders.lock().expect("change bus lock poisoned");
        senders.retain(|_, tx| tx.send(notice.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.senders.lock().expect("change bus lock poisoned").len()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Long-poll the hub forever, feeding events into the bus.
///
/// Spawn this on the runtime and abort the handle to stop it. Poll
/// failures are logged and the loop reconnects after a short delay; the
/// cursor survives reconnects so events are not dropped.
pub async fn run_event_poller(client: HubClient, bus: Arc<ChangeBus>) {
    let mut cursor = 0u64;

    loop {
        match client.poll_events(cursor).await {
            Ok(batch) => {
                cursor = batch.cursor;
                for event in batch.events {
                    bus.publish(ChangeNotice {
                        list_id: event.list_id,
                    });
                }
            }
            Err(err) => {
                warn!("event poll failed: {}. Reconnecting...", err);
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let bus = ChangeBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(ChangeNotice {
            list_id: Some("l1".into()),
        });

        assert_eq!(a.receiver.recv().await.unwrap().list_id.as_deref(), Some("l1"));
        assert_eq!(b.receiver.recv().await.unwrap().list_id.as_deref(), Some("l1"));
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_channel() {
        let bus = ChangeBus::new();
        let mut sub = bus.subscribe();

        bus.unsubscribe(sub.token);
        bus.publish(ChangeNotice { list_id: None });

        // Sender is gone, so the channel yields None instead of the notice
        assert!(sub.receiver.recv().await.is_none());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_prunes_dropped_receivers() {
        let bus = ChangeBus::new();
        let sub = bus.subscribe();
        drop(sub);

        assert_eq!(bus.subscriber_count(), 1);
        bus.publish(ChangeNotice { list_id: None });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let bus = ChangeBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        assert_ne!(a.token, b.token);
    }
}
