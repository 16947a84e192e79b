//! Team repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{Team, TeamId};
use crate::domain::DomainError;

/// Repository trait for team storage
///
/// `get` and `list` exclude soft-deleted teams; a deleted team is
/// indistinguishable from a missing one.
#[async_trait]
pub trait TeamRepository: Send + Sync + Debug {
    /// Get a team by ID, excluding soft-deleted teams
    async fn get(&self, id: &TeamId) -> Result<Option<Team>, DomainError>;

    /// Create a new team
    async fn create(&self, team: Team) -> Result<Team, DomainError>;

    /// Update an existing team (also used to persist a soft delete or restore)
    async fn update(&self, team: &Team) -> Result<Team, DomainError>;

    /// List all non-deleted teams
    async fn list(&self) -> Result<Vec<Team>, DomainError>;

    /// Check if a team exists (and is not soft-deleted)
    async fn exists(&self, id: &TeamId) -> Result<bool, DomainError> {
        Ok(self.get(id).await?.is_some())
    }
}
