//! Membership/team directory: read-side lookups shared by the services

use std::sync::Arc;

use crate::domain::authz::Role;
use crate::domain::member::{MemberRepository, TeamMember};
use crate::domain::team::{Team, TeamId, TeamRepository};
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Lookups of team, membership and role used as read dependencies by the
/// account, invite and project services. Soft-deleted teams are reported
/// as missing by the underlying repository.
#[derive(Debug, Clone)]
pub struct Directory {
    teams: Arc<dyn TeamRepository>,
    members: Arc<dyn MemberRepository>,
}

impl Directory {
    /// Create a new directory over the given repositories
    pub fn new(teams: Arc<dyn TeamRepository>, members: Arc<dyn MemberRepository>) -> Self {
        Self { teams, members }
    }

    /// Get a team or fail with `NotFound`
    pub async fn require_team(&self, team_id: &TeamId) -> Result<Team, DomainError> {
        self.teams
            .get(team_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", team_id)))
    }

    /// Membership of a user in a team, if any
    pub async fn membership(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
    ) -> Result<Option<TeamMember>, DomainError> {
        self.members.get(team_id, user_id).await
    }

    /// Resolve the acting user's team and role; `NotFound` when the team is
    /// missing, `Forbidden` when the user is not a member
    pub async fn require_member(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
    ) -> Result<(Team, Role), DomainError> {
        let team = self.require_team(team_id).await?;

        let member = self
            .membership(team_id, user_id)
            .await?
            .ok_or_else(|| {
                DomainError::forbidden(format!("Not a member of team '{}'", team_id))
            })?;

        Ok((team, member.role()))
    }

    /// Like `require_member` but additionally requires the admin role
    pub async fn require_admin(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
    ) -> Result<Team, DomainError> {
        let (team, role) = self.require_member(team_id, user_id).await?;

        if role != Role::Admin {
            return Err(DomainError::forbidden(format!(
                "Admin role required for team '{}'",
                team_id
            )));
        }

        Ok(team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::team::repository::{
        InMemoryMemberRepository, InMemoryTeamRepository,
    };

    async fn setup() -> (Directory, Team, UserId) {
        let teams: Arc<dyn TeamRepository> = Arc::new(InMemoryTeamRepository::new());
        let members: Arc<dyn MemberRepository> = Arc::new(InMemoryMemberRepository::new());

        let team = Team::new(TeamId::generate(), "Test Team", Role::Member).unwrap();
        teams.create(team.clone()).await.unwrap();

        let user_id = UserId::generate();
        members
            .create(TeamMember::new(team.id().clone(), user_id.clone(), Role::Admin))
            .await
            .unwrap();

        (Directory::new(teams, members), team, user_id)
    }

    #[tokio::test]
    async fn test_require_member_resolves_role() {
        let (directory, team, user_id) = setup().await;

        let (resolved, role) = directory.require_member(team.id(), &user_id).await.unwrap();
        assert_eq!(resolved.id(), team.id());
        assert_eq!(role, Role::Admin);
    }

    #[tokio::test]
    async fn test_require_member_missing_team() {
        let (directory, _, user_id) = setup().await;

        let result = directory.require_member(&TeamId::generate(), &user_id).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_require_member_not_a_member() {
        let (directory, team, _) = setup().await;

        let result = directory.require_member(team.id(), &UserId::generate()).await;
        assert!(matches!(result, Err(DomainError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_require_admin_rejects_non_admin() {
        let (directory, team, _) = setup().await;

        let viewer = UserId::generate();
        directory
            .members
            .create(TeamMember::new(team.id().clone(), viewer.clone(), Role::Viewer))
            .await
            .unwrap();

        let result = directory.require_admin(team.id(), &viewer).await;
        assert!(matches!(result, Err(DomainError::Forbidden { .. })));
    }
}
