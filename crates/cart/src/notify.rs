//! Transient user-facing notifications.
//!
//! Cart operations never return errors to their caller. Instead they publish
//! a [`Notice`] on a broadcast channel that the host drains and shows as a
//! toast. Publishing never blocks and succeeds with no one listening.

use std::fmt;

use tokio::sync::broadcast;

/// Channel capacity. Slow subscribers lose the oldest notices.
const NOTICE_CAPACITY: usize = 32;

/// A condition reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    /// Requested quantity exceeds available stock.
    OutOfStock,
    /// Adding a product failed (lookup or persistence error).
    AddFailed,
    /// Removing a product failed (not in cart or persistence error).
    RemoveFailed,
    /// Changing a product quantity failed.
    UpdateFailed,
}

impl Notice {
    /// Message shown to the user.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::OutOfStock => "Requested quantity is out of stock",
            Self::AddFailed => "Error adding product",
            Self::RemoveFailed => "Error removing product",
            Self::UpdateFailed => "Error updating product quantity",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Sending half of the notification channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    /// Create a notifier with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTICE_CAPACITY);
        Self { tx }
    }

    /// Publish a notice to current subscribers.
    pub fn notify(&self, notice: Notice) {
        tracing::debug!(notice = ?notice, "{notice}");
        // Err only means there are no subscribers right now
        let _ = self.tx.send(notice);
    }

    /// Receive notices published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}

/// Drain every notice already queued on `rx` without waiting.
pub fn drain(rx: &mut broadcast::Receiver<Notice>) -> Vec<Notice> {
    let mut notices = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(notice) => notices.push(notice),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Notification subscriber lagged");
            }
            Err(_) => break,
        }
    }
    notices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_without_subscribers_is_fine() {
        let notifier = Notifier::new();
        notifier.notify(Notice::AddFailed);
    }

    #[test]
    fn test_subscribers_receive_in_order() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.notify(Notice::OutOfStock);
        notifier.notify(Notice::RemoveFailed);

        assert_eq!(drain(&mut rx), vec![Notice::OutOfStock, Notice::RemoveFailed]);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_messages_are_distinct() {
        let all = [
            Notice::OutOfStock,
            Notice::AddFailed,
            Notice::RemoveFailed,
            Notice::UpdateFailed,
        ];
        let messages: std::collections::HashSet<_> = all.iter().map(|n| n.message()).collect();
        assert_eq!(messages.len(), all.len());
        assert_eq!(Notice::OutOfStock.to_string(), "Requested quantity is out of stock");
    }
}
