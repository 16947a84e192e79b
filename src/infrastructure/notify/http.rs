//! HTTP notifier posting to the transactional mail gateway

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::domain::notification::{EmailChanged, Notifier, TeamInviteMail, UsernameChanged};
use crate::domain::DomainError;

/// Notifier backed by an HTTP mail gateway.
///
/// Each message kind maps to `POST {base_url}/messages/{kind}`. Any
/// transport error or non-success status is an external-effect failure;
/// the caller compensates.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNotifier {
    /// Create a new notifier for the given gateway base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn post<T: Serialize + ?Sized>(&self, kind: &str, body: &T) -> Result<(), DomainError> {
        let url = format!("{}/messages/{}", self.base_url.trim_end_matches('/'), kind);
        debug!(url = %url, "sending notification");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::external_effect(format!("mail gateway: {}", e)))?;

        if !response.status().is_success() {
            return Err(DomainError::external_effect(format!(
                "mail gateway returned {} for {}",
                response.status(),
                kind
            )));
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct PasswordChangedBody<'a> {
    email: &'a str,
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send_email_changed(&self, message: &EmailChanged) -> Result<(), DomainError> {
        self.post("email-changed", message).await
    }

    async fn send_username_changed(&self, message: &UsernameChanged) -> Result<(), DomainError> {
        self.post("username-changed", message).await
    }

    async fn send_password_changed(&self, email: &str) -> Result<(), DomainError> {
        self.post("password-changed", &PasswordChangedBody { email })
            .await
    }

    async fn send_team_invite(&self, message: &TeamInviteMail) -> Result<(), DomainError> {
        self.post("team-invite", message).await
    }
}
