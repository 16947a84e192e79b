//! Team service for team management

use std::sync::Arc;

use tracing::info;

use super::directory::Directory;
use crate::domain::authz::{self, CustomRules, Role};
use crate::domain::member::{MemberRepository, TeamMember};
use crate::domain::team::{validate_team_name, Team, TeamId, TeamRepository};
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Request for creating a new team
#[derive(Debug, Clone)]
pub struct CreateTeamRequest {
    pub name: String,
    pub default_role: Role,
}

/// Team service for managing teams, membership listings and team rules
#[derive(Debug)]
pub struct TeamService {
    teams: Arc<dyn TeamRepository>,
    members: Arc<dyn MemberRepository>,
    directory: Directory,
}

impl TeamService {
    /// Create a new team service
    pub fn new(teams: Arc<dyn TeamRepository>, members: Arc<dyn MemberRepository>) -> Self {
        let directory = Directory::new(Arc::clone(&teams), Arc::clone(&members));
        Self {
            teams,
            members,
            directory,
        }
    }

    /// The directory built over this service's repositories
    pub fn directory(&self) -> Directory {
        self.directory.clone()
    }

    /// Create a new team; the creator becomes its first admin member
    pub async fn create(
        &self,
        actor: &UserId,
        request: CreateTeamRequest,
    ) -> Result<Team, DomainError> {
        validate_team_name(&request.name).map_err(|e| DomainError::validation(e.to_string()))?;

        let team = Team::new(TeamId::generate(), &request.name, request.default_role)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        info!(team_id = %team.id(), name = %request.name, "Creating team");

        let team = self.teams.create(team).await?;

        self.members
            .create(TeamMember::new(team.id().clone(), actor.clone(), Role::Admin))
            .await?;

        Ok(team)
    }

    /// Get a team the actor belongs to
    pub async fn get(&self, team_id: &str, actor: &UserId) -> Result<Team, DomainError> {
        let team_id = parse_team_id(team_id)?;
        let (team, _) = self.directory.require_member(&team_id, actor).await?;
        Ok(team)
    }

    /// List the teams the actor belongs to
    pub async fn list(&self, actor: &UserId) -> Result<Vec<Team>, DomainError> {
        let memberships = self.members.list_for_user(actor).await?;

        let mut teams = Vec::with_capacity(memberships.len());
        for membership in memberships {
            if let Some(team) = self.teams.get(membership.team_id()).await? {
                teams.push(team);
            }
        }

        Ok(teams)
    }

    /// List a team's members; any member may look
    pub async fn members(
        &self,
        team_id: &str,
        actor: &UserId,
    ) -> Result<Vec<TeamMember>, DomainError> {
        let team_id = parse_team_id(team_id)?;
        self.directory.require_member(&team_id, actor).await?;
        self.members.list_for_team(&team_id).await
    }

    /// Replace the team's rule overrides. Admin-gated; the new map replaces
    /// the old one wholesale.
    pub async fn set_rules(
        &self,
        team_id: &str,
        actor: &UserId,
        rules: CustomRules,
    ) -> Result<Team, DomainError> {
        let team_id = parse_team_id(team_id)?;
        let (mut team, role) = self.directory.require_member(&team_id, actor).await?;

        if !authz::can_modify_team_rules(role) {
            return Err(DomainError::forbidden(
                "Only admins may modify team rules",
            ));
        }

        authz::validate_rules(&rules)?;

        info!(team_id = %team_id, "Replacing team rules");

        team.set_custom_rules(rules);
        self.teams.update(&team).await
    }

    /// Materialize the effective rules for the actor's role in the team.
    /// Listing is open to every role.
    pub async fn effective_rules(
        &self,
        team_id: &str,
        actor: &UserId,
    ) -> Result<CustomRules, DomainError> {
        let team_id = parse_team_id(team_id)?;
        let (team, role) = self.directory.require_member(&team_id, actor).await?;

        if !authz::can_list_team_rules(role) {
            return Err(DomainError::forbidden("Not allowed to list team rules"));
        }

        Ok(authz::effective_rules(role, team.custom_rules()))
    }

    /// Soft-delete a team. Admin-gated; the team disappears from lookups.
    pub async fn delete(&self, team_id: &str, actor: &UserId) -> Result<(), DomainError> {
        let team_id = parse_team_id(team_id)?;
        let mut team = self.directory.require_admin(&team_id, actor).await?;

        info!(team_id = %team_id, "Soft-deleting team");

        team.soft_delete();
        self.teams.update(&team).await?;
        Ok(())
    }
}

fn parse_team_id(id: &str) -> Result<TeamId, DomainError> {
    TeamId::new(id).map_err(|e| DomainError::invalid_id(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::authz::TriState;
    use crate::infrastructure::team::repository::{
        InMemoryMemberRepository, InMemoryTeamRepository,
    };
    use std::collections::BTreeMap;

    fn create_service() -> TeamService {
        TeamService::new(
            Arc::new(InMemoryTeamRepository::new()),
            Arc::new(InMemoryMemberRepository::new()),
        )
    }

    fn request(name: &str) -> CreateTeamRequest {
        CreateTeamRequest {
            name: name.to_string(),
            default_role: Role::Member,
        }
    }

    fn deny_create_file() -> CustomRules {
        let mut rules = CustomRules::new();
        rules.insert(
            "create".to_string(),
            BTreeMap::from([("file".to_string(), TriState::Deny)]),
        );
        rules
    }

    #[tokio::test]
    async fn test_create_makes_creator_admin() {
        let service = create_service();
        let actor = UserId::generate();

        let team = service.create(&actor, request("My Team")).await.unwrap();

        let members = service.members(team.id().as_str(), &actor).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].role(), Role::Admin);
    }

    #[tokio::test]
    async fn test_create_invalid_name() {
        let service = create_service();
        let actor = UserId::generate();

        let result = service.create(&actor, request("")).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_get_requires_membership() {
        let service = create_service();
        let owner = UserId::generate();
        let stranger = UserId::generate();

        let team = service.create(&owner, request("My Team")).await.unwrap();

        assert!(service.get(team.id().as_str(), &owner).await.is_ok());

        let result = service.get(team.id().as_str(), &stranger).await;
        assert!(matches!(result, Err(DomainError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_list_only_own_teams() {
        let service = create_service();
        let ada = UserId::generate();
        let grace = UserId::generate();

        service.create(&ada, request("Ada's Team")).await.unwrap();
        service.create(&grace, request("Grace's Team")).await.unwrap();

        let teams = service.list(&ada).await.unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].name(), "Ada's Team");
    }

    #[tokio::test]
    async fn test_set_rules_replaces_and_gates() {
        let service = create_service();
        let admin = UserId::generate();
        let team = service.create(&admin, request("My Team")).await.unwrap();

        let updated = service
            .set_rules(team.id().as_str(), &admin, deny_create_file())
            .await
            .unwrap();
        assert!(updated.custom_rules().contains_key("create"));

        // A second replacement drops the first map entirely.
        let mut other = CustomRules::new();
        other.insert(
            "delete".to_string(),
            BTreeMap::from([("bucket".to_string(), TriState::Allow)]),
        );
        let updated = service
            .set_rules(team.id().as_str(), &admin, other)
            .await
            .unwrap();
        assert!(!updated.custom_rules().contains_key("create"));
        assert!(updated.custom_rules().contains_key("delete"));
    }

    #[tokio::test]
    async fn test_set_rules_denied_for_member() {
        let service = create_service();
        let admin = UserId::generate();
        let member = UserId::generate();
        let team = service.create(&admin, request("My Team")).await.unwrap();

        service
            .members
            .create(TeamMember::new(team.id().clone(), member.clone(), Role::Member))
            .await
            .unwrap();

        let result = service
            .set_rules(team.id().as_str(), &member, deny_create_file())
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_set_rules_rejects_unknown_keys() {
        let service = create_service();
        let admin = UserId::generate();
        let team = service.create(&admin, request("My Team")).await.unwrap();

        let mut rules = CustomRules::new();
        rules.insert(
            "share".to_string(),
            BTreeMap::from([("file".to_string(), TriState::Allow)]),
        );

        let result = service.set_rules(team.id().as_str(), &admin, rules).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_effective_rules_open_to_viewer() {
        let service = create_service();
        let admin = UserId::generate();
        let viewer = UserId::generate();
        let team = service.create(&admin, request("My Team")).await.unwrap();

        service
            .members
            .create(TeamMember::new(team.id().clone(), viewer.clone(), Role::Viewer))
            .await
            .unwrap();

        let rules = service
            .effective_rules(team.id().as_str(), &viewer)
            .await
            .unwrap();
        assert_eq!(
            rules.get("read").and_then(|r| r.get("file")),
            Some(&TriState::Allow)
        );
        assert_eq!(
            rules.get("create").and_then(|r| r.get("file")),
            Some(&TriState::Deny)
        );
    }

    #[tokio::test]
    async fn test_delete_is_soft_and_admin_gated() {
        let service = create_service();
        let admin = UserId::generate();
        let member = UserId::generate();
        let team = service.create(&admin, request("My Team")).await.unwrap();

        service
            .members
            .create(TeamMember::new(team.id().clone(), member.clone(), Role::Member))
            .await
            .unwrap();

        let result = service.delete(team.id().as_str(), &member).await;
        assert!(matches!(result, Err(DomainError::Forbidden { .. })));

        service.delete(team.id().as_str(), &admin).await.unwrap();

        // Gone from lookups afterwards.
        let result = service.get(team.id().as_str(), &admin).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
