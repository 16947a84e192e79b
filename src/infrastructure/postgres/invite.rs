//! PostgreSQL invite repository implementation

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::{is_unique_violation, storage_error};
use crate::domain::authz::Role;
use crate::domain::invite::{InviteId, InviteRepository, InviteStatus, TeamInvite};
use crate::domain::team::TeamId;
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// PostgreSQL implementation of InviteRepository
#[derive(Debug, Clone)]
pub struct PostgresInviteRepository {
    pool: PgPool,
}

impl PostgresInviteRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INVITE_COLUMNS: &str =
    "id, team_id, email, role, token, status, invited_by, created_at, accepted_at";

#[async_trait]
impl InviteRepository for PostgresInviteRepository {
    async fn get(
        &self,
        id: &InviteId,
        team_id: &TeamId,
    ) -> Result<Option<TeamInvite>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {INVITE_COLUMNS} FROM team_invites WHERE id = $1 AND team_id = $2"
        ))
        .bind(id.as_str())
        .bind(team_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to get invite", e))?;

        row.map(|r| row_to_invite(&r)).transpose()
    }

    async fn get_by_token(
        &self,
        team_id: &TeamId,
        token: &str,
    ) -> Result<Option<TeamInvite>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {INVITE_COLUMNS} FROM team_invites WHERE team_id = $1 AND token = $2"
        ))
        .bind(team_id.as_str())
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to get invite by token", e))?;

        row.map(|r| row_to_invite(&r)).transpose()
    }

    async fn create(&self, invite: TeamInvite) -> Result<TeamInvite, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO team_invites (id, team_id, email, role, token, status,
                                      invited_by, created_at, accepted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(invite.id().as_str())
        .bind(invite.team_id().as_str())
        .bind(invite.email())
        .bind(invite.role().as_str())
        .bind(invite.token())
        .bind(invite.status().as_str())
        .bind(invite.invited_by().as_str())
        .bind(invite.created_at())
        .bind(invite.accepted_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict(format!("Invite '{}' already exists", invite.id()))
            } else {
                storage_error("Failed to create invite", e)
            }
        })?;

        Ok(invite)
    }

    async fn update(&self, invite: &TeamInvite) -> Result<TeamInvite, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE team_invites
            SET email = $2, role = $3, token = $4, status = $5, accepted_at = $6
            WHERE id = $1
            "#,
        )
        .bind(invite.id().as_str())
        .bind(invite.email())
        .bind(invite.role().as_str())
        .bind(invite.token())
        .bind(invite.status().as_str())
        .bind(invite.accepted_at())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to update invite", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Invite '{}' not found",
                invite.id()
            )));
        }

        Ok(invite.clone())
    }

    async fn delete(&self, id: &InviteId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM team_invites WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete invite", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_token(&self, team_id: &TeamId, token: &str) -> Result<bool, DomainError> {
        let result =
            sqlx::query("DELETE FROM team_invites WHERE team_id = $1 AND token = $2")
                .bind(team_id.as_str())
                .bind(token)
                .execute(&self.pool)
                .await
                .map_err(|e| storage_error("Failed to delete invite by token", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_team(&self, team_id: &TeamId) -> Result<Vec<TeamInvite>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {INVITE_COLUMNS} FROM team_invites WHERE team_id = $1 ORDER BY created_at"
        ))
        .bind(team_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list invites", e))?;

        rows.iter().map(row_to_invite).collect()
    }
}

fn row_to_invite(row: &sqlx::postgres::PgRow) -> Result<TeamInvite, DomainError> {
    let team_id: String = row.get("team_id");
    let role: String = row.get("role");
    let status: String = row.get("status");
    let invited_by: String = row.get("invited_by");

    let team_id = TeamId::new(&team_id)
        .map_err(|e| DomainError::storage(format!("Invalid team ID in database: {}", e)))?;
    let role = Role::parse(&role)
        .ok_or_else(|| DomainError::storage(format!("Invalid role '{}' in database", role)))?;
    let status = InviteStatus::parse(&status).ok_or_else(|| {
        DomainError::storage(format!("Invalid invite status '{}' in database", status))
    })?;
    let invited_by = UserId::new(&invited_by)
        .map_err(|e| DomainError::storage(format!("Invalid user ID in database: {}", e)))?;

    Ok(TeamInvite::from_storage(
        InviteId::new(row.get::<String, _>("id")),
        team_id,
        row.get("email"),
        role,
        row.get("token"),
        status,
        invited_by,
        row.get("created_at"),
        row.get("accepted_at"),
    ))
}
