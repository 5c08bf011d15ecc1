//! Received push notifications
//!
//! Platform integrations publish into a `NotificationHub`; listeners hold
//! a `NotificationSubscription` which unregisters itself when dropped.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::NotificationSettings;

/// Buffered notifications per listener before old ones are dropped
const CHANNEL_CAPACITY: usize = 32;

/// A notification delivered to this device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushNotification {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// How a received notification should be presented
pub type Presentation = NotificationSettings;

/// Fan-out point for received notifications
#[derive(Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<PushNotification>,
    presentation: Presentation,
    listeners: Arc<AtomicUsize>,
}

impl NotificationHub {
    pub fn new(presentation: Presentation) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            presentation,
            listeners: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Presentation applied to every notification on this hub
    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    /// Deliver a notification to every live subscription
    ///
    /// Returns the number of listeners reached.
    pub fn publish(&self, notification: PushNotification) -> usize {
        self.sender.send(notification).unwrap_or(0)
    }

    pub fn subscribe(&self) -> NotificationSubscription {
        self.listeners.fetch_add(1, Ordering::SeqCst);
        debug!("Notification listener registered");
        NotificationSubscription {
            receiver: self.sender.subscribe(),
            listeners: self.listeners.clone(),
        }
    }

    /// Live subscriptions
    pub fn listener_count(&self) -> usize {
        self.listeners.load(Ordering::SeqCst)
    }
}

/// Scoped listener registration
pub struct NotificationSubscription {
    receiver: broadcast::Receiver<PushNotification>,
    listeners: Arc<AtomicUsize>,
}

impl NotificationSubscription {
    /// Next notification, or `None` once the hub is gone
    ///
    /// Notifications missed because the listener lagged are skipped;
    /// the next available one is returned.
    pub async fn recv(&mut self) -> Option<PushNotification> {
        loop {
            match self.receiver.recv().await {
                Ok(notification) => return Some(notification),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("Notification listener lagged, skipped {}", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for NotificationSubscription {
    fn drop(&mut self) {
        self.listeners.fetch_sub(1, Ordering::SeqCst);
        debug!("Notification listener released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub() -> NotificationHub {
        NotificationHub::new(Presentation::default())
    }

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let hub = hub();
        let mut sub = hub.subscribe();

        let sent = PushNotification {
            title: Some("Nueva publicación".to_string()),
            ..Default::default()
        };
        assert_eq!(hub.publish(sent.clone()), 1);
        assert_eq!(sub.recv().await, Some(sent));
    }

    #[test]
    fn test_publish_without_listeners() {
        let hub = hub();
        assert_eq!(hub.publish(PushNotification::default()), 0);
    }

    #[test]
    fn test_subscription_released_on_drop() {
        let hub = hub();
        let first = hub.subscribe();
        let second = hub.subscribe();
        assert_eq!(hub.listener_count(), 2);

        drop(first);
        assert_eq!(hub.listener_count(), 1);
        drop(second);
        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_recv_ends_when_hub_dropped() {
        let hub = hub();
        let mut sub = hub.subscribe();
        drop(hub);
        assert_eq!(sub.recv().await, None);
    }

    #[test]
    fn test_presentation_from_settings() {
        let hub = NotificationHub::new(Presentation {
            show_alert: true,
            play_sound: false,
            set_badge: true,
        });
        assert!(!hub.presentation().play_sound);
    }
}
