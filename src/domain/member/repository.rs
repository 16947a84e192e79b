//! Membership repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::TeamMember;
use crate::domain::team::TeamId;
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Repository trait for team memberships
///
/// `create` MUST surface a duplicate (team, user) pair as
/// `DomainError::Conflict` backed by a real uniqueness constraint. The
/// invite acceptance protocol races its read-check-insert sequence on
/// purpose and treats that conflict as idempotent success; it never uses
/// optimistic locking.
#[async_trait]
pub trait MemberRepository: Send + Sync + Debug {
    /// Get a membership by (team, user)
    async fn get(&self, team_id: &TeamId, user_id: &UserId)
        -> Result<Option<TeamMember>, DomainError>;

    /// Insert a new membership; `Conflict` when the pair already exists
    async fn create(&self, member: TeamMember) -> Result<TeamMember, DomainError>;

    /// Update an existing membership (role changes)
    async fn update(&self, member: &TeamMember) -> Result<TeamMember, DomainError>;

    /// Remove a membership, returns true if one existed
    async fn delete(&self, team_id: &TeamId, user_id: &UserId) -> Result<bool, DomainError>;

    /// All memberships of a team
    async fn list_for_team(&self, team_id: &TeamId) -> Result<Vec<TeamMember>, DomainError>;

    /// All memberships of a user
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<TeamMember>, DomainError>;
}
