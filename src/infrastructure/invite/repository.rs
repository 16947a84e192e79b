//! In-memory invite repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::invite::{InviteId, InviteRepository, TeamInvite};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// In-memory implementation of InviteRepository
#[derive(Debug, Default)]
pub struct InMemoryInviteRepository {
    invites: Arc<RwLock<HashMap<String, TeamInvite>>>,
}

impl InMemoryInviteRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InviteRepository for InMemoryInviteRepository {
    async fn get(
        &self,
        id: &InviteId,
        team_id: &TeamId,
    ) -> Result<Option<TeamInvite>, DomainError> {
        let invites = self.invites.read().await;
        Ok(invites
            .get(id.as_str())
            .filter(|i| i.team_id() == team_id)
            .cloned())
    }

    async fn get_by_token(
        &self,
        team_id: &TeamId,
        token: &str,
    ) -> Result<Option<TeamInvite>, DomainError> {
        let invites = self.invites.read().await;
        Ok(invites
            .values()
            .find(|i| i.team_id() == team_id && i.token() == token)
            .cloned())
    }

    async fn create(&self, invite: TeamInvite) -> Result<TeamInvite, DomainError> {
        let mut invites = self.invites.write().await;
        let id = invite.id().as_str().to_string();

        if invites.contains_key(&id) {
            return Err(DomainError::conflict(format!(
                "Invite with ID '{}' already exists",
                id
            )));
        }

        invites.insert(id, invite.clone());
        Ok(invite)
    }

    async fn update(&self, invite: &TeamInvite) -> Result<TeamInvite, DomainError> {
        let mut invites = self.invites.write().await;
        let id = invite.id().as_str().to_string();

        if !invites.contains_key(&id) {
            return Err(DomainError::not_found(format!("Invite '{}' not found", id)));
        }

        invites.insert(id, invite.clone());
        Ok(invite.clone())
    }

    async fn delete(&self, id: &InviteId) -> Result<bool, DomainError> {
        let mut invites = self.invites.write().await;
        Ok(invites.remove(id.as_str()).is_some())
    }

    async fn delete_by_token(&self, team_id: &TeamId, token: &str) -> Result<bool, DomainError> {
        let mut invites = self.invites.write().await;
        let key = invites
            .values()
            .find(|i| i.team_id() == team_id && i.token() == token)
            .map(|i| i.id().as_str().to_string());

        match key {
            Some(key) => Ok(invites.remove(&key).is_some()),
            None => Ok(false),
        }
    }

    async fn list_for_team(&self, team_id: &TeamId) -> Result<Vec<TeamInvite>, DomainError> {
        let invites = self.invites.read().await;
        Ok(invites
            .values()
            .filter(|i| i.team_id() == team_id)
            .cloned()
            .collect())
    }
}
