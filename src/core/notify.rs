//! Best-effort notifications
//!
//! Payments, circulation events and published results notify the student.
//! Delivery failures are logged and swallowed: a notification never fails the
//! operation that triggered it.

use crate::types::ErpError;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationKind {
    FeePayment,
    BookIssued,
    BookReturned,
    BookRenewed,
    ResultPublished,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub recipient: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(
        recipient: impl Into<String>,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Notification {
            recipient: recipient.into(),
            kind,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Delivery channel (in-app, email, SMS)
pub trait Notifier: Send + Sync {
    fn send(&self, notification: &Notification) -> Result<(), ErpError>;
}

/// Notifier that writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notification: &Notification) -> Result<(), ErpError> {
        info!(
            recipient = %notification.recipient,
            kind = ?notification.kind,
            title = %notification.title,
            "{}",
            notification.message
        );
        Ok(())
    }
}

/// Send a notification, logging and discarding any failure
pub fn deliver(notifier: &dyn Notifier, notification: Notification) {
    if let Err(e) = notifier.send(&notification) {
        warn!(
            recipient = %notification.recipient,
            kind = ?notification.kind,
            "Notification dropped: {}",
            e
        );
    }
}
