//! Invite repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{InviteId, TeamInvite};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// Repository trait for team invitations
#[async_trait]
pub trait InviteRepository: Send + Sync + Debug {
    /// Get an invite by id, scoped to a team
    async fn get(&self, id: &InviteId, team_id: &TeamId)
        -> Result<Option<TeamInvite>, DomainError>;

    /// Get an invite by its (team, token) natural key
    async fn get_by_token(
        &self,
        team_id: &TeamId,
        token: &str,
    ) -> Result<Option<TeamInvite>, DomainError>;

    /// Persist a new invite
    async fn create(&self, invite: TeamInvite) -> Result<TeamInvite, DomainError>;

    /// Update an existing invite (token rotation, status transitions)
    async fn update(&self, invite: &TeamInvite) -> Result<TeamInvite, DomainError>;

    /// Hard-delete an invite by id, returns true if one existed
    async fn delete(&self, id: &InviteId) -> Result<bool, DomainError>;

    /// Hard-delete by the (team, token) natural key; fallback used by
    /// create-compensation when the generated id is not usable
    async fn delete_by_token(&self, team_id: &TeamId, token: &str) -> Result<bool, DomainError>;

    /// All invites of a team, any status
    async fn list_for_team(&self, team_id: &TeamId) -> Result<Vec<TeamInvite>, DomainError>;
}
