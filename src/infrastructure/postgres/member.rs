//! PostgreSQL membership repository implementation
//!
//! The `team_members` table carries a unique index on (team_id, user_id);
//! the conflict surfaced from it is the sole correctness mechanism for
//! concurrent invite acceptance.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::{is_unique_violation, storage_error};
use crate::domain::authz::Role;
use crate::domain::member::{MemberRepository, TeamMember};
use crate::domain::team::TeamId;
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// PostgreSQL implementation of MemberRepository
#[derive(Debug, Clone)]
pub struct PostgresMemberRepository {
    pool: PgPool,
}

impl PostgresMemberRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MEMBER_COLUMNS: &str = "team_id, user_id, role, created_at";

#[async_trait]
impl MemberRepository for PostgresMemberRepository {
    async fn get(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
    ) -> Result<Option<TeamMember>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members WHERE team_id = $1 AND user_id = $2"
        ))
        .bind(team_id.as_str())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to get membership", e))?;

        row.map(|r| row_to_member(&r)).transpose()
    }

    async fn create(&self, member: TeamMember) -> Result<TeamMember, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO team_members (team_id, user_id, role, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(member.team_id().as_str())
        .bind(member.user_id().as_str())
        .bind(member.role().as_str())
        .bind(member.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict(format!(
                    "User '{}' is already a member of team '{}'",
                    member.user_id(),
                    member.team_id()
                ))
            } else {
                storage_error("Failed to create membership", e)
            }
        })?;

        Ok(member)
    }

    async fn update(&self, member: &TeamMember) -> Result<TeamMember, DomainError> {
        let result = sqlx::query(
            "UPDATE team_members SET role = $3 WHERE team_id = $1 AND user_id = $2",
        )
        .bind(member.team_id().as_str())
        .bind(member.user_id().as_str())
        .bind(member.role().as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to update membership", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Membership of '{}' in team '{}' not found",
                member.user_id(),
                member.team_id()
            )));
        }

        Ok(member.clone())
    }

    async fn delete(&self, team_id: &TeamId, user_id: &UserId) -> Result<bool, DomainError> {
        let result =
            sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = $2")
                .bind(team_id.as_str())
                .bind(user_id.as_str())
                .execute(&self.pool)
                .await
                .map_err(|e| storage_error("Failed to delete membership", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_team(&self, team_id: &TeamId) -> Result<Vec<TeamMember>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members WHERE team_id = $1 ORDER BY created_at"
        ))
        .bind(team_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list team members", e))?;

        rows.iter().map(row_to_member).collect()
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<TeamMember>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members WHERE user_id = $1 ORDER BY created_at"
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list user memberships", e))?;

        rows.iter().map(row_to_member).collect()
    }
}

fn row_to_member(row: &sqlx::postgres::PgRow) -> Result<TeamMember, DomainError> {
    let team_id: String = row.get("team_id");
    let user_id: String = row.get("user_id");
    let role: String = row.get("role");

    let team_id = TeamId::new(&team_id)
        .map_err(|e| DomainError::storage(format!("Invalid team ID in database: {}", e)))?;
    let user_id = UserId::new(&user_id)
        .map_err(|e| DomainError::storage(format!("Invalid user ID in database: {}", e)))?;
    let role = Role::parse(&role)
        .ok_or_else(|| DomainError::storage(format!("Invalid role '{}' in database", role)))?;

    Ok(TeamMember::from_storage(
        team_id,
        user_id,
        role,
        row.get("created_at"),
    ))
}
