//! Notification Sink
//!
//! Outbound notifications (OTP codes, welcome, new-device alerts) go
//! through the injected [`Notifier`]. Delivery is fire-and-forget:
//! failures are logged and never surfaced to the caller, and use cases
//! spawn the call off the response path where latency matters.
//!
//! The production transport (mail) lives outside this subsystem; the
//! default implementation logs through `tracing`.

use crate::domain::entity::account::Account;

/// What is being sent and its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    /// One-time code for verification or password reset
    Otp { code: String },
    /// Welcome message after successful verification
    Welcome,
    /// A new device joined the registry
    NewDevice { device_id: String },
}

/// A notification addressed to an account holder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub email: String,
    pub first_name: String,
}

impl Notification {
    /// Address a notification to the account's email
    pub fn for_account(account: &Account, kind: NotificationKind) -> Self {
        Self {
            kind,
            email: account.email.as_str().to_string(),
            first_name: account.first_name.clone(),
        }
    }
}

/// Notification sink trait
#[trait_variant::make(Notifier: Send)]
pub trait LocalNotifier {
    /// Deliver a notification; implementations swallow and log failures
    async fn notify(&self, notification: Notification);
}

/// Default sink: structured log lines instead of a mail transport
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    async fn notify(&self, notification: Notification) {
        match &notification.kind {
            NotificationKind::Otp { code } => {
                tracing::info!(
                    email = %notification.email,
                    code = %code,
                    "OTP notification"
                );
            }
            NotificationKind::Welcome => {
                tracing::info!(
                    email = %notification.email,
                    first_name = %notification.first_name,
                    "Welcome notification"
                );
            }
            NotificationKind::NewDevice { device_id } => {
                tracing::info!(
                    email = %notification.email,
                    device_id = %device_id,
                    "New device notification"
                );
            }
        }
    }
}

/// Recording sink for tests
#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Records every notification it receives
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }

        pub fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: Notification) {
            self.sent.lock().unwrap().push(notification);
        }
    }
}
