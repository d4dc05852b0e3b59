//! Broadcast channel for fire-and-forget collaborator notifications.
//!
//! [`NotificationBus`] wraps a [`tokio::sync::broadcast`] channel. The
//! crediting and reschedule services publish a [`Notification`] after a
//! successful mutation; the email-dispatch collaborator (out of scope
//! here) subscribes. Delivery is best-effort: a full ring buffer drops
//! the oldest notifications for lagging receivers.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::SessionId;

/// Notification emitted after a successful ledger mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "notification_type", rename_all = "snake_case")]
pub enum Notification {
    /// A verified purchase was credited to a package.
    PackageCredited {
        /// Purchasing client.
        client_id: Uuid,
        /// Credited package.
        package_id: Uuid,
        /// Package type.
        package_type: String,
        /// Sessions added by this purchase.
        sessions_added: i32,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A reschedule proposal was approved and the session moved.
    SessionRescheduled {
        /// Session that moved.
        session_id: SessionId,
        /// Assigned trainer.
        trainer_id: Uuid,
        /// Booked client.
        client_id: Uuid,
        /// New session date.
        date: NaiveDate,
        /// New start time.
        start_time: NaiveTime,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast bus for [`Notification`]s.
#[derive(Debug, Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
}

impl NotificationBus {
    /// Creates a new `NotificationBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes a notification to all subscribers.
    ///
    /// Returns the number of receivers that received it. With no active
    /// receivers the notification is silently dropped — delivery is
    /// fire-and-forget by contract.
    pub fn publish(&self, notification: Notification) -> usize {
        self.sender.send(notification).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
