//! In-memory team and membership repositories

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::member::{MemberRepository, TeamMember};
use crate::domain::team::{Team, TeamId, TeamRepository};
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// In-memory implementation of TeamRepository
#[derive(Debug, Default)]
pub struct InMemoryTeamRepository {
    teams: Arc<RwLock<HashMap<String, Team>>>,
}

impl InMemoryTeamRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TeamRepository for InMemoryTeamRepository {
    async fn get(&self, id: &TeamId) -> Result<Option<Team>, DomainError> {
        let teams = self.teams.read().await;
        Ok(teams
            .get(id.as_str())
            .filter(|t| !t.is_deleted())
            .cloned())
    }

    async fn create(&self, team: Team) -> Result<Team, DomainError> {
        let mut teams = self.teams.write().await;
        let id = team.id().as_str().to_string();

        if teams.contains_key(&id) {
            return Err(DomainError::conflict(format!(
                "Team with ID '{}' already exists",
                id
            )));
        }

        teams.insert(id, team.clone());
        Ok(team)
    }

    async fn update(&self, team: &Team) -> Result<Team, DomainError> {
        let mut teams = self.teams.write().await;
        let id = team.id().as_str().to_string();

        if !teams.contains_key(&id) {
            return Err(DomainError::not_found(format!("Team '{}' not found", id)));
        }

        teams.insert(id, team.clone());
        Ok(team.clone())
    }

    async fn list(&self) -> Result<Vec<Team>, DomainError> {
        let teams = self.teams.read().await;
        Ok(teams.values().filter(|t| !t.is_deleted()).cloned().collect())
    }
}

fn member_key(team_id: &TeamId, user_id: &UserId) -> String {
    format!("{}:{}", team_id.as_str(), user_id.as_str())
}

/// In-memory implementation of MemberRepository
///
/// The (team, user) uniqueness constraint lives inside the write lock and
/// surfaces as `Conflict`, mirroring the PostgreSQL unique index that the
/// acceptance race depends on.
#[derive(Debug, Default)]
pub struct InMemoryMemberRepository {
    members: Arc<RwLock<HashMap<String, TeamMember>>>,
}

impl InMemoryMemberRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemberRepository for InMemoryMemberRepository {
    async fn get(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
    ) -> Result<Option<TeamMember>, DomainError> {
        let members = self.members.read().await;
        Ok(members.get(&member_key(team_id, user_id)).cloned())
    }

    async fn create(&self, member: TeamMember) -> Result<TeamMember, DomainError> {
        let mut members = self.members.write().await;
        let key = member_key(member.team_id(), member.user_id());

        if members.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "User '{}' is already a member of team '{}'",
                member.user_id(),
                member.team_id()
            )));
        }

        members.insert(key, member.clone());
        Ok(member)
    }

    async fn update(&self, member: &TeamMember) -> Result<TeamMember, DomainError> {
        let mut members = self.members.write().await;
        let key = member_key(member.team_id(), member.user_id());

        if !members.contains_key(&key) {
            return Err(DomainError::not_found(format!(
                "Membership of '{}' in team '{}' not found",
                member.user_id(),
                member.team_id()
            )));
        }

        members.insert(key, member.clone());
        Ok(member.clone())
    }

    async fn delete(&self, team_id: &TeamId, user_id: &UserId) -> Result<bool, DomainError> {
        let mut members = self.members.write().await;
        Ok(members.remove(&member_key(team_id, user_id)).is_some())
    }

    async fn list_for_team(&self, team_id: &TeamId) -> Result<Vec<TeamMember>, DomainError> {
        let members = self.members.read().await;
        Ok(members
            .values()
            .filter(|m| m.team_id() == team_id)
            .cloned()
            .collect())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<TeamMember>, DomainError> {
        let members = self.members.read().await;
        Ok(members
            .values()
            .filter(|m| m.user_id() == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::authz::Role;

    fn create_test_team() -> Team {
        Team::new(TeamId::generate(), "Test Team", Role::Member).unwrap()
    }

    #[tokio::test]
    async fn test_team_create_and_get() {
        let repo = InMemoryTeamRepository::new();
        let team = create_test_team();

        repo.create(team.clone()).await.unwrap();

        let retrieved = repo.get(team.id()).await.unwrap().unwrap();
        assert_eq!(retrieved.name(), "Test Team");
    }

    #[tokio::test]
    async fn test_soft_deleted_team_is_invisible() {
        let repo = InMemoryTeamRepository::new();
        let mut team = create_test_team();
        repo.create(team.clone()).await.unwrap();

        team.soft_delete();
        repo.update(&team).await.unwrap();

        assert!(repo.get(team.id()).await.unwrap().is_none());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_member_uniqueness_conflict() {
        let repo = InMemoryMemberRepository::new();
        let team_id = TeamId::generate();
        let user_id = UserId::generate();

        repo.create(TeamMember::new(team_id.clone(), user_id.clone(), Role::Member))
            .await
            .unwrap();

        let result = repo
            .create(TeamMember::new(team_id, user_id, Role::Admin))
            .await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_member_listing() {
        let repo = InMemoryMemberRepository::new();
        let team_id = TeamId::generate();
        let user_a = UserId::generate();
        let user_b = UserId::generate();

        repo.create(TeamMember::new(team_id.clone(), user_a.clone(), Role::Admin))
            .await
            .unwrap();
        repo.create(TeamMember::new(team_id.clone(), user_b, Role::Viewer))
            .await
            .unwrap();

        assert_eq!(repo.list_for_team(&team_id).await.unwrap().len(), 2);
        assert_eq!(repo.list_for_user(&user_a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_member_delete() {
        let repo = InMemoryMemberRepository::new();
        let team_id = TeamId::generate();
        let user_id = UserId::generate();

        repo.create(TeamMember::new(team_id.clone(), user_id.clone(), Role::Member))
            .await
            .unwrap();

        assert!(repo.delete(&team_id, &user_id).await.unwrap());
        assert!(repo.get(&team_id, &user_id).await.unwrap().is_none());
        assert!(!repo.delete(&team_id, &user_id).await.unwrap());
    }
}
