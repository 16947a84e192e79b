//! Notification collaborator interface
//!
//! Each call is fire-and-await with no delivery guarantee beyond
//! success/failure; a failure after a local mutation triggers the caller's
//! compensation path.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;

use super::DomainError;

/// Payload for the email-changed notification
#[derive(Debug, Clone, Serialize)]
pub struct EmailChanged {
    /// Recipient (the new address)
    pub to: String,
    /// The address being replaced
    pub old_email: String,
    /// Free-form context line for the mail body
    pub context: String,
}

/// Payload for the username-changed notification
#[derive(Debug, Clone, Serialize)]
pub struct UsernameChanged {
    pub email: String,
    pub username: String,
}

/// Payload for a team invitation mail
#[derive(Debug, Clone, Serialize)]
pub struct TeamInviteMail {
    pub email: String,
    pub team_name: String,
    pub token: String,
}

/// Outbound notification service
#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    async fn send_email_changed(&self, message: &EmailChanged) -> Result<(), DomainError>;

    async fn send_username_changed(&self, message: &UsernameChanged) -> Result<(), DomainError>;

    async fn send_password_changed(&self, email: &str) -> Result<(), DomainError>;

    async fn send_team_invite(&self, message: &TeamInviteMail) -> Result<(), DomainError>;
}
