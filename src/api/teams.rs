//! Team management endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::authz::{CustomRules, Role};
use crate::domain::member::TeamMember;
use crate::domain::team::Team;
use crate::infrastructure::team::CreateTeamRequest;

/// Create the teams router
pub fn create_teams_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_team).get(list_teams))
        .route("/{team_id}", get(get_team).delete(delete_team))
        .route("/{team_id}/rules", put(set_rules).get(get_rules))
        .route("/{team_id}/members", get(list_members))
}

/// Request to create a new team
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTeamApiRequest {
    pub name: String,
    #[serde(default)]
    pub default_role: Role,
}

/// Request to replace team rules
#[derive(Debug, Clone, Deserialize)]
pub struct SetRulesRequest {
    pub rules: CustomRules,
}

/// Team response
#[derive(Debug, Clone, Serialize)]
pub struct TeamResponse {
    pub id: String,
    pub name: String,
    pub default_role: Role,
    pub custom_rules: CustomRules,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id().as_str().to_string(),
            name: team.name().to_string(),
            default_role: team.default_role(),
            custom_rules: team.custom_rules().clone(),
            created_at: team.created_at().to_rfc3339(),
            updated_at: team.updated_at().to_rfc3339(),
        }
    }
}

/// Membership response
#[derive(Debug, Clone, Serialize)]
pub struct MemberResponse {
    pub team_id: String,
    pub user_id: String,
    pub role: Role,
    pub created_at: String,
}

impl From<&TeamMember> for MemberResponse {
    fn from(member: &TeamMember) -> Self {
        Self {
            team_id: member.team_id().as_str().to_string(),
            user_id: member.user_id().as_str().to_string(),
            role: member.role(),
            created_at: member.created_at().to_rfc3339(),
        }
    }
}

/// List teams response
#[derive(Debug, Clone, Serialize)]
pub struct ListTeamsResponse {
    pub teams: Vec<TeamResponse>,
    pub total: usize,
}

/// Rules response
#[derive(Debug, Clone, Serialize)]
pub struct RulesResponse {
    pub rules: CustomRules,
}

/// POST /teams
pub async fn create_team(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(request): Json<CreateTeamApiRequest>,
) -> Result<Json<TeamResponse>, ApiError> {
    debug!(name = %request.name, "Creating team");

    let team = state
        .teams
        .create(
            user.id(),
            CreateTeamRequest {
                name: request.name,
                default_role: request.default_role,
            },
        )
        .await
        .map_err(ApiError::from)?;

    Ok(Json(TeamResponse::from(&team)))
}

/// GET /teams
pub async fn list_teams(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<ListTeamsResponse>, ApiError> {
    let teams = state.teams.list(user.id()).await.map_err(ApiError::from)?;

    let team_responses: Vec<TeamResponse> = teams.iter().map(TeamResponse::from).collect();
    let total = team_responses.len();

    Ok(Json(ListTeamsResponse {
        teams: team_responses,
        total,
    }))
}

/// GET /teams/{team_id}
pub async fn get_team(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(team_id): Path<String>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = state
        .teams
        .get(&team_id, user.id())
        .await
        .map_err(ApiError::from)?;

    Ok(Json(TeamResponse::from(&team)))
}

/// DELETE /teams/{team_id}
pub async fn delete_team(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(team_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    debug!(team_id = %team_id, "Deleting team");

    state
        .teams
        .delete(&team_id, user.id())
        .await
        .map_err(ApiError::from)?;

    Ok(Json(serde_json::json!({
        "deleted": true,
        "id": team_id
    })))
}

/// PUT /teams/{team_id}/rules
pub async fn set_rules(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(team_id): Path<String>,
    Json(request): Json<SetRulesRequest>,
) -> Result<Json<TeamResponse>, ApiError> {
    debug!(team_id = %team_id, "Replacing team rules");

    let team = state
        .teams
        .set_rules(&team_id, user.id(), request.rules)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(TeamResponse::from(&team)))
}

/// GET /teams/{team_id}/rules
pub async fn get_rules(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(team_id): Path<String>,
) -> Result<Json<RulesResponse>, ApiError> {
    let rules = state
        .teams
        .effective_rules(&team_id, user.id())
        .await
        .map_err(ApiError::from)?;

    Ok(Json(RulesResponse { rules }))
}

/// GET /teams/{team_id}/members
pub async fn list_members(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let members = state
        .teams
        .members(&team_id, user.id())
        .await
        .map_err(ApiError::from)?;

    Ok(Json(members.iter().map(MemberResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::authz::{Role, TriState};
    use crate::domain::team::TeamId;

    #[test]
    fn test_create_team_request_default_role() {
        let json = r#"{"name": "My Team"}"#;

        let request: CreateTeamApiRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.name, "My Team");
        assert_eq!(request.default_role, Role::Member);
    }

    #[test]
    fn test_create_team_request_explicit_role() {
        let json = r#"{"name": "My Team", "default_role": "viewer"}"#;

        let request: CreateTeamApiRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.default_role, Role::Viewer);
    }

    #[test]
    fn test_create_team_request_unknown_role_rejected() {
        let json = r#"{"name": "My Team", "default_role": "owner"}"#;
        assert!(serde_json::from_str::<CreateTeamApiRequest>(json).is_err());
    }

    #[test]
    fn test_set_rules_request_tristate_leaves() {
        let json = r#"{"rules": {"create": {"bucket": false, "file": true, "folder": null}}}"#;

        let request: SetRulesRequest = serde_json::from_str(json).unwrap();
        let create = request.rules.get("create").unwrap();
        assert_eq!(create.get("bucket"), Some(&TriState::Deny));
        assert_eq!(create.get("file"), Some(&TriState::Allow));
        assert_eq!(create.get("folder"), Some(&TriState::Unset));
    }

    #[test]
    fn test_team_response_serialization() {
        let team = Team::new(TeamId::generate(), "Test Team", Role::Member).unwrap();
        let response = TeamResponse::from(&team);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"name\":\"Test Team\""));
        assert!(json.contains("\"default_role\":\"member\""));
    }
}
