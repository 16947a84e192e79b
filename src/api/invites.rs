//! Team invitation endpoints

use axum::{
    extract::{Path, State},
    routing::{delete, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::teams::MemberResponse;
use crate::api::types::{ApiError, Json};
use crate::domain::authz::Role;
use crate::domain::invite::TeamInvite;

/// Create the invites router, nested under /teams/{team_id}/invites
pub fn create_invites_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_invite).get(list_invites))
        .route("/accept", post(accept_invite))
        .route("/{invite_id}", delete(revoke_invite))
        .route("/{invite_id}/resend", post(resend_invite))
}

/// Request to create an invite; the team's default role applies when no
/// role is given
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInviteRequest {
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Request to accept an invite
#[derive(Debug, Clone, Deserialize)]
pub struct AcceptInviteRequest {
    pub token: String,
}

/// Invite response. The token is included: the admin surface needs it to
/// hand the link to the invitee out of band if mail is not enough.
#[derive(Debug, Clone, Serialize)]
pub struct InviteResponse {
    pub id: String,
    pub team_id: String,
    pub email: String,
    pub role: Role,
    pub token: String,
    pub status: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<String>,
}

impl From<&TeamInvite> for InviteResponse {
    fn from(invite: &TeamInvite) -> Self {
        Self {
            id: invite.id().as_str().to_string(),
            team_id: invite.team_id().as_str().to_string(),
            email: invite.email().to_string(),
            role: invite.role(),
            token: invite.token().to_string(),
            status: invite.status().as_str().to_string(),
            created_at: invite.created_at().to_rfc3339(),
            accepted_at: invite.accepted_at().map(|t| t.to_rfc3339()),
        }
    }
}

/// POST /teams/{team_id}/invites
pub async fn create_invite(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(team_id): Path<String>,
    Json(request): Json<CreateInviteRequest>,
) -> Result<Json<InviteResponse>, ApiError> {
    debug!(team_id = %team_id, email = %request.email, "Creating invite");

    let invite = state
        .invites
        .create(&team_id, &user, &request.email, request.role)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(InviteResponse::from(&invite)))
}

/// GET /teams/{team_id}/invites
pub async fn list_invites(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<InviteResponse>>, ApiError> {
    let invites = state
        .invites
        .list(&team_id, &user)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(invites.iter().map(InviteResponse::from).collect()))
}

/// POST /teams/{team_id}/invites/{invite_id}/resend
pub async fn resend_invite(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((team_id, invite_id)): Path<(String, String)>,
) -> Result<Json<InviteResponse>, ApiError> {
    debug!(team_id = %team_id, invite_id = %invite_id, "Resending invite");

    let invite = state
        .invites
        .resend(&team_id, &invite_id, &user)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(InviteResponse::from(&invite)))
}

/// DELETE /teams/{team_id}/invites/{invite_id}
pub async fn revoke_invite(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((team_id, invite_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    debug!(team_id = %team_id, invite_id = %invite_id, "Revoking invite");

    state
        .invites
        .revoke(&team_id, &invite_id, &user)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(serde_json::json!({
        "revoked": true,
        "id": invite_id
    })))
}

/// POST /teams/{team_id}/invites/accept
pub async fn accept_invite(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(team_id): Path<String>,
    Json(request): Json<AcceptInviteRequest>,
) -> Result<Json<MemberResponse>, ApiError> {
    debug!(team_id = %team_id, "Accepting invite");

    let membership = state
        .invites
        .accept(&team_id, &request.token, &user)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(MemberResponse::from(&membership)))
}
