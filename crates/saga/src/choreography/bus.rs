//! In-process notification channel.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::choreography::notification::Notification;

/// FIFO stand-in for the at-least-once publish/subscribe channel.
///
/// The channel makes no deduplication promise: publishing the same
/// notification twice delivers it twice, exactly like the transport it
/// stands in for. The consumers own idempotence.
#[derive(Clone, Default)]
pub struct InMemoryEventBus {
    queue: Arc<Mutex<VecDeque<Notification>>>,
}

impl InMemoryEventBus {
    /// Creates a new empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a notification onto the channel.
    pub fn publish(&self, notification: Notification) {
        tracing::debug!(
            source = notification.source(),
            detail_type = notification.detail_type(),
            id = %notification.detail().id,
            "notification published"
        );
        self.queue.lock().unwrap().push_back(notification);
    }

    /// Takes the oldest pending notification off the channel.
    pub fn pop(&self) -> Option<Notification> {
        self.queue.lock().unwrap().pop_front()
    }

    /// Returns the number of pending notifications.
    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Returns true when no notifications are pending.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choreography::notification::{Command, Detail};
    use common::SagaId;

    #[test]
    fn test_fifo_order() {
        let bus = InMemoryEventBus::new();
        let first = SagaId::new();
        let second = SagaId::new();

        bus.publish(Notification::command(Command::CreateOrder, Detail::for_id(first)));
        bus.publish(Notification::command(Command::CreateOrder, Detail::for_id(second)));
        assert_eq!(bus.len(), 2);

        assert_eq!(bus.pop().unwrap().detail().id, first);
        assert_eq!(bus.pop().unwrap().detail().id, second);
        assert!(bus.pop().is_none());
        assert!(bus.is_empty());
    }

    #[test]
    fn test_duplicates_are_delivered_twice() {
        let bus = InMemoryEventBus::new();
        let n = Notification::command(Command::ProcessOrder, Detail::for_id(SagaId::new()));

        bus.publish(n.clone());
        bus.publish(n);
        assert_eq!(bus.len(), 2);
    }
}
