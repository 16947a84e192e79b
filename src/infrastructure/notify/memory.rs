//! Recording notifier for tests and local development

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::notification::{EmailChanged, Notifier, TeamInviteMail, UsernameChanged};
use crate::domain::DomainError;

/// A message captured by the recording notifier
#[derive(Debug, Clone, PartialEq)]
pub enum SentMessage {
    EmailChanged { to: String, old_email: String },
    UsernameChanged { email: String, username: String },
    PasswordChanged { email: String },
    TeamInvite { email: String, team_name: String, token: String },
}

/// In-memory notifier that records every message.
///
/// `set_should_fail(true)` makes every subsequent send fail, which is how
/// the compensation paths are exercised in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<SentMessage>>>,
    should_fail: Arc<RwLock<bool>>,
}

impl RecordingNotifier {
    /// Create a new recording notifier
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle failure of all subsequent sends
    pub async fn set_should_fail(&self, fail: bool) {
        *self.should_fail.write().await = fail;
    }

    /// Messages sent so far
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().await.clone()
    }

    /// Number of messages sent so far
    pub async fn sent_count(&self) -> usize {
        self.sent.read().await.len()
    }

    async fn record(&self, message: SentMessage) -> Result<(), DomainError> {
        if *self.should_fail.read().await {
            return Err(DomainError::external_effect("mail gateway unavailable"));
        }

        self.sent.write().await.push(message);
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_email_changed(&self, message: &EmailChanged) -> Result<(), DomainError> {
        self.record(SentMessage::EmailChanged {
            to: message.to.clone(),
            old_email: message.old_email.clone(),
        })
        .await
    }

    async fn send_username_changed(&self, message: &UsernameChanged) -> Result<(), DomainError> {
        self.record(SentMessage::UsernameChanged {
            email: message.email.clone(),
            username: message.username.clone(),
        })
        .await
    }

    async fn send_password_changed(&self, email: &str) -> Result<(), DomainError> {
        self.record(SentMessage::PasswordChanged {
            email: email.to_string(),
        })
        .await
    }

    async fn send_team_invite(&self, message: &TeamInviteMail) -> Result<(), DomainError> {
        self.record(SentMessage::TeamInvite {
            email: message.email.clone(),
            team_name: message.team_name.clone(),
            token: message.token.clone(),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_messages() {
        let notifier = RecordingNotifier::new();

        notifier.send_password_changed("ada@example.com").await.unwrap();

        let sent = notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            SentMessage::PasswordChanged {
                email: "ada@example.com".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let notifier = RecordingNotifier::new();
        notifier.set_should_fail(true).await;

        let result = notifier.send_password_changed("ada@example.com").await;
        assert!(matches!(result, Err(DomainError::ExternalEffect { .. })));
        assert_eq!(notifier.sent_count().await, 0);
    }
}
