//! Project repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{Project, ProjectId};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// Repository trait for project storage
///
/// `get` and `list_for_team` exclude soft-deleted projects. The whole row
/// (including the embedded file list) is re-saved on update, which is what
/// the rename/upload compensation paths rely on.
#[async_trait]
pub trait ProjectRepository: Send + Sync + Debug {
    /// Get a project by id, scoped to a team, excluding soft-deleted rows
    async fn get(&self, id: &ProjectId, team_id: &TeamId)
        -> Result<Option<Project>, DomainError>;

    /// Persist a new project
    async fn create(&self, project: Project) -> Result<Project, DomainError>;

    /// Update an existing project (file changes, soft delete, restore)
    async fn update(&self, project: &Project) -> Result<Project, DomainError>;

    /// Hard-delete a project row, returns true if one existed
    async fn delete(&self, id: &ProjectId) -> Result<bool, DomainError>;

    /// All non-deleted projects of a team
    async fn list_for_team(&self, team_id: &TeamId) -> Result<Vec<Project>, DomainError>;
}
