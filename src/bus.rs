use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;

/// Broadcast topic with bounded capacity.
/// Frames go from the controller to the window thread, pointer clicks go
/// the other way, so `T` must be `Send + Sync`.
#[derive(Debug, Clone)]
pub struct Topic<T> {
    name: &'static str,
    tx: broadcast::Sender<Arc<T>>,
}

impl<T: Send + Sync + 'static> Topic<T> {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { name, tx }
    }

    /// Publishing with no subscriber is not an error; the message is dropped.
    pub fn publish(&self, msg: T) {
        if self.tx.send(Arc::new(msg)).is_err() {
            trace!(topic = self.name, "No subscribers, message dropped.");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<T>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_sees_published_message() {
        let topic: Topic<u32> = Topic::new("test", 4);
        let mut rx = topic.subscribe();
        topic.publish(7);
        assert_eq!(*rx.try_recv().unwrap(), 7);
    }

    #[test]
    fn test_publish_without_subscriber_is_silent() {
        let topic: Topic<u32> = Topic::new("test", 4);
        topic.publish(1);
        let mut rx = topic.subscribe();
        assert!(matches!(rx.try_recv(), Err(broadcast::error::TryRecvError::Empty)));
    }
}
