//! NotificationLog - Notification History with Ring Buffer

use crossbeam_channel::Receiver;

use crate::eventing::{Notification, NotificationLevel};
use crate::helpers::BoundedDeque;

/// Recent notifications, newest last
#[derive(Debug)]
pub struct NotificationLog {
    entries: BoundedDeque<Notification>,
}

impl NotificationLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BoundedDeque::new(capacity),
        }
    }

    /// Move everything waiting in `rx` into the log and return the new entries
    pub fn drain(&mut self, rx: &Receiver<Notification>) -> Vec<Notification> {
        let received: Vec<Notification> = rx.try_iter().collect();
        for notification in &received {
            self.entries.push(notification.clone());
        }
        received
    }

    /// Newest first
    pub fn recent(&self, count: usize) -> Vec<&Notification> {
        self.entries.iter_rev().take(count).collect()
    }

    pub fn count(&self, level: NotificationLevel) -> usize {
        self.entries.iter().filter(|n| n.level == level).count()
    }

    pub fn last(&self) -> Option<&Notification> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self::new(crate::constants::NOTIFICATION_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventing::Notifier;

    #[test]
    fn test_drain_keeps_bounded_history() {
        let (notifier, rx) = Notifier::channel();
        let mut log = NotificationLog::new(2);

        notifier.positive("one");
        notifier.info("two");
        notifier.negative("three");

        let drained = log.drain(&rx);
        assert_eq!(drained.len(), 3);
        assert_eq!(log.len(), 2);
        assert_eq!(log.recent(1)[0].message, "three");
        assert_eq!(log.count(NotificationLevel::Positive), 0);
        assert!(log.drain(&rx).is_empty());
    }
}
