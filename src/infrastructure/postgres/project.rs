//! PostgreSQL project repository implementation

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::{is_unique_violation, storage_error};
use crate::domain::project::{Project, ProjectFile, ProjectId, ProjectRepository};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// PostgreSQL implementation of ProjectRepository
///
/// The embedded file list is stored as a JSONB column and re-written with
/// the row, matching the save-the-owning-row-once compensation model.
#[derive(Debug, Clone)]
pub struct PostgresProjectRepository {
    pool: PgPool,
}

impl PostgresProjectRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PROJECT_COLUMNS: &str =
    "id, team_id, name, bucket, files, deleted_at, created_at, updated_at";

#[async_trait]
impl ProjectRepository for PostgresProjectRepository {
    async fn get(
        &self,
        id: &ProjectId,
        team_id: &TeamId,
    ) -> Result<Option<Project>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects
             WHERE id = $1 AND team_id = $2 AND deleted_at IS NULL"
        ))
        .bind(id.as_str())
        .bind(team_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to get project", e))?;

        row.map(|r| row_to_project(&r)).transpose()
    }

    async fn create(&self, project: Project) -> Result<Project, DomainError> {
        let files = serde_json::to_value(project.files())
            .map_err(|e| DomainError::storage(format!("Failed to encode files: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO projects (id, team_id, name, bucket, files, deleted_at,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(project.id().as_str())
        .bind(project.team_id().as_str())
        .bind(project.name())
        .bind(project.bucket())
        .bind(files)
        .bind(project.deleted_at())
        .bind(project.created_at())
        .bind(project.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict(format!("Project '{}' already exists", project.id()))
            } else {
                storage_error("Failed to create project", e)
            }
        })?;

        Ok(project)
    }

    async fn update(&self, project: &Project) -> Result<Project, DomainError> {
        let files = serde_json::to_value(project.files())
            .map_err(|e| DomainError::storage(format!("Failed to encode files: {}", e)))?;

        let result = sqlx::query(
            r#"
            UPDATE projects
            SET name = $2, files = $3, deleted_at = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(project.id().as_str())
        .bind(project.name())
        .bind(files)
        .bind(project.deleted_at())
        .bind(project.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to update project", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Project '{}' not found",
                project.id()
            )));
        }

        Ok(project.clone())
    }

    async fn delete(&self, id: &ProjectId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete project", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_team(&self, team_id: &TeamId) -> Result<Vec<Project>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects
             WHERE team_id = $1 AND deleted_at IS NULL ORDER BY created_at"
        ))
        .bind(team_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list projects", e))?;

        rows.iter().map(row_to_project).collect()
    }
}

fn row_to_project(row: &sqlx::postgres::PgRow) -> Result<Project, DomainError> {
    let team_id: String = row.get("team_id");
    let files: serde_json::Value = row.get("files");

    let team_id = TeamId::new(&team_id)
        .map_err(|e| DomainError::storage(format!("Invalid team ID in database: {}", e)))?;
    let files: Vec<ProjectFile> = serde_json::from_value(files)
        .map_err(|e| DomainError::storage(format!("Invalid file list in database: {}", e)))?;

    Ok(Project::from_storage(
        ProjectId::new(row.get::<String, _>("id")),
        team_id,
        row.get("name"),
        row.get("bucket"),
        files,
        row.get("deleted_at"),
        row.get("created_at"),
        row.get("updated_at"),
    ))
}
