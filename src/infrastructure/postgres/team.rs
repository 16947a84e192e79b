//! PostgreSQL team repository implementation

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::{is_unique_violation, storage_error};
use crate::domain::authz::{CustomRules, Role};
use crate::domain::team::{Team, TeamId, TeamRepository};
use crate::domain::DomainError;

/// PostgreSQL implementation of TeamRepository
#[derive(Debug, Clone)]
pub struct PostgresTeamRepository {
    pool: PgPool,
}

impl PostgresTeamRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TEAM_COLUMNS: &str =
    "id, name, default_role, custom_rules, deleted_at, created_at, updated_at";

#[async_trait]
impl TeamRepository for PostgresTeamRepository {
    async fn get(&self, id: &TeamId) -> Result<Option<Team>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to get team", e))?;

        row.map(|r| row_to_team(&r)).transpose()
    }

    async fn create(&self, team: Team) -> Result<Team, DomainError> {
        let rules = serde_json::to_value(team.custom_rules())
            .map_err(|e| DomainError::storage(format!("Failed to encode team rules: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO teams (id, name, default_role, custom_rules, deleted_at,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(team.id().as_str())
        .bind(team.name())
        .bind(team.default_role().as_str())
        .bind(rules)
        .bind(team.deleted_at())
        .bind(team.created_at())
        .bind(team.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict(format!("Team '{}' already exists", team.id()))
            } else {
                storage_error("Failed to create team", e)
            }
        })?;

        Ok(team)
    }

    async fn update(&self, team: &Team) -> Result<Team, DomainError> {
        let rules = serde_json::to_value(team.custom_rules())
            .map_err(|e| DomainError::storage(format!("Failed to encode team rules: {}", e)))?;

        let result = sqlx::query(
            r#"
            UPDATE teams
            SET name = $2, default_role = $3, custom_rules = $4, deleted_at = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(team.id().as_str())
        .bind(team.name())
        .bind(team.default_role().as_str())
        .bind(rules)
        .bind(team.deleted_at())
        .bind(team.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to update team", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Team '{}' not found",
                team.id()
            )));
        }

        Ok(team.clone())
    }

    async fn list(&self) -> Result<Vec<Team>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE deleted_at IS NULL ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list teams", e))?;

        rows.iter().map(row_to_team).collect()
    }
}

fn row_to_team(row: &sqlx::postgres::PgRow) -> Result<Team, DomainError> {
    let id: String = row.get("id");
    let default_role: String = row.get("default_role");
    let rules: serde_json::Value = row.get("custom_rules");

    let team_id = TeamId::new(&id)
        .map_err(|e| DomainError::storage(format!("Invalid team ID in database: {}", e)))?;
    let default_role = Role::parse(&default_role).ok_or_else(|| {
        DomainError::storage(format!("Invalid role '{}' in database", default_role))
    })?;
    let custom_rules: CustomRules = serde_json::from_value(rules)
        .map_err(|e| DomainError::storage(format!("Invalid team rules in database: {}", e)))?;

    Ok(Team::from_storage(
        team_id,
        row.get("name"),
        default_role,
        custom_rules,
        row.get("deleted_at"),
        row.get("created_at"),
        row.get("updated_at"),
    ))
}
