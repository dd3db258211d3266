// src/identity.rs

use tokio::sync::broadcast;

/// Session changes reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    SignedIn { user_id: String },
    SignedOut { user_id: String },
}

/// Fan-out point for identity events.
#[derive(Clone)]
pub struct IdentityHub {
    tx: broadcast::Sender<IdentityEvent>,
}

impl IdentityHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Registers a listener. Dropping the returned handle unsubscribes.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live subscriptions.
    pub fn listeners(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn publish(&self, event: IdentityEvent) {
        // No listeners is fine: nobody needs to react.
        let _ = self.tx.send(event);
    }
}

impl Default for IdentityHub {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription to identity events.
pub struct Subscription {
    rx: broadcast::Receiver<IdentityEvent>,
}

impl Subscription {
    /// Next event, or `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<IdentityEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Identity listener lagged, skipped {} event(s)", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dropping_subscription_unsubscribes() {
        let hub = IdentityHub::new();
        let sub = hub.subscribe();
        assert_eq!(hub.listeners(), 1);
        drop(sub);
        assert_eq!(hub.listeners(), 0);
    }

    #[tokio::test]
    async fn events_reach_subscribers() {
        let hub = IdentityHub::new();
        let mut sub = hub.subscribe();
        hub.publish(IdentityEvent::SignedOut {
            user_id: "u1".to_string(),
        });
        assert_eq!(
            sub.recv().await,
            Some(IdentityEvent::SignedOut {
                user_id: "u1".to_string()
            })
        );
        drop(hub);
        assert_eq!(sub.recv().await, None);
    }
}
