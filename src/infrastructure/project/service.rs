//! Project service: team-scoped projects mirrored into object storage
//!
//! Projects map to a bucket each, files to a key each. Every mirrored
//! mutation runs through the mutation coordinator so a storage failure
//! rolls the local row back before the caller sees the error.

use std::sync::Arc;

use tracing::info;

use crate::domain::authz;
use crate::domain::object_store::ObjectStore;
use crate::domain::project::{Project, ProjectFile, ProjectId, ProjectRepository};
use crate::domain::team::TeamId;
use crate::domain::user::UserId;
use crate::domain::DomainError;
use crate::infrastructure::mutation::run_with_compensation;
use crate::infrastructure::team::Directory;

/// Project service
#[derive(Debug)]
pub struct ProjectService {
    projects: Arc<dyn ProjectRepository>,
    store: Arc<dyn ObjectStore>,
    directory: Directory,
}

impl ProjectService {
    /// Create a new project service
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        store: Arc<dyn ObjectStore>,
        directory: Directory,
    ) -> Self {
        Self {
            projects,
            store,
            directory,
        }
    }

    /// Create a project and its backing bucket.
    ///
    /// The bucket-exists pre-check runs before anything is persisted; the
    /// row is created first and deleted again if the bucket creation fails.
    pub async fn create(
        &self,
        team_id: &str,
        actor: &UserId,
        name: &str,
    ) -> Result<Project, DomainError> {
        let team_id = parse_team_id(team_id)?;
        let (team, role) = self.directory.require_member(&team_id, actor).await?;

        if !authz::can_perform(role, "create", "bucket", team.custom_rules()) {
            return Err(DomainError::forbidden("Not allowed to create projects"));
        }

        if name.trim().is_empty() {
            return Err(DomainError::validation("Project name cannot be empty"));
        }

        let project = Project::new(team_id.clone(), name);

        if self.store.bucket_exists(project.bucket()).await? {
            return Err(DomainError::conflict(format!(
                "Bucket '{}' already exists",
                project.bucket()
            )));
        }

        info!(team_id = %team_id, project_id = %project.id(), "Creating project");

        let projects = Arc::clone(&self.projects);
        let projects_undo = Arc::clone(&self.projects);
        let store = Arc::clone(&self.store);

        run_with_compensation(
            move || async move { projects.create(project).await },
            move |saved: Project| async move { store.create_bucket(saved.bucket()).await },
            move |saved: Project| async move { projects_undo.delete(saved.id()).await.map(|_| ()) },
        )
        .await
    }

    /// Get a project the actor's team owns
    pub async fn get(
        &self,
        team_id: &str,
        project_id: &str,
        actor: &UserId,
    ) -> Result<Project, DomainError> {
        let team_id = parse_team_id(team_id)?;
        self.directory.require_member(&team_id, actor).await?;
        self.get_required(&team_id, project_id).await
    }

    /// List a team's projects
    pub async fn list(&self, team_id: &str, actor: &UserId) -> Result<Vec<Project>, DomainError> {
        let team_id = parse_team_id(team_id)?;
        self.directory.require_member(&team_id, actor).await?;
        self.projects.list_for_team(&team_id).await
    }

    /// Soft-delete a project and drop its bucket; a bucket failure
    /// restores the row.
    pub async fn delete(
        &self,
        team_id: &str,
        project_id: &str,
        actor: &UserId,
    ) -> Result<(), DomainError> {
        let team_id = parse_team_id(team_id)?;
        let (team, role) = self.directory.require_member(&team_id, actor).await?;

        if !authz::can_perform(role, "delete", "bucket", team.custom_rules()) {
            return Err(DomainError::forbidden("Not allowed to delete projects"));
        }

        let project = self.get_required(&team_id, project_id).await?;

        info!(team_id = %team_id, project_id = %project.id(), "Deleting project");

        let previous = project.clone();
        let mut deleted = project;
        deleted.soft_delete();

        let projects = Arc::clone(&self.projects);
        let projects_revert = Arc::clone(&self.projects);
        let store = Arc::clone(&self.store);

        run_with_compensation(
            move || async move { projects.update(&deleted).await },
            move |saved: Project| async move { store.delete_bucket(saved.bucket()).await },
            move |_| async move { projects_revert.update(&previous).await.map(|_| ()) },
        )
        .await?;

        Ok(())
    }

    /// Add a file row and upload its content; an upload failure removes
    /// the row again.
    pub async fn upload_file(
        &self,
        team_id: &str,
        project_id: &str,
        actor: &UserId,
        name: &str,
        content: &[u8],
    ) -> Result<Project, DomainError> {
        let team_id = parse_team_id(team_id)?;
        let (team, role) = self.directory.require_member(&team_id, actor).await?;

        if !authz::can_perform(role, "create", "file", team.custom_rules()) {
            return Err(DomainError::forbidden("Not allowed to add files"));
        }

        if name.trim().is_empty() {
            return Err(DomainError::validation("File name cannot be empty"));
        }

        let project = self.get_required(&team_id, project_id).await?;

        if project.files().iter().any(|f| f.name() == name) {
            return Err(DomainError::conflict(format!(
                "File '{}' already exists in project",
                name
            )));
        }

        let previous = project.clone();
        let mut changed = project;
        let file_name = name.to_string();
        changed.add_file(ProjectFile::new(&file_name));

        let projects = Arc::clone(&self.projects);
        let projects_revert = Arc::clone(&self.projects);
        let store = Arc::clone(&self.store);
        let bytes = content.to_vec();

        run_with_compensation(
            move || async move { projects.update(&changed).await },
            move |saved: Project| async move {
                store.upload_file(saved.bucket(), &file_name, &bytes).await
            },
            move |_| async move { projects_revert.update(&previous).await.map(|_| ()) },
        )
        .await
    }

    /// Rename a file row and its object key; a storage failure reverts the
    /// row to the captured pre-rename state.
    pub async fn rename_file(
        &self,
        team_id: &str,
        project_id: &str,
        file_id: &str,
        actor: &UserId,
        new_name: &str,
    ) -> Result<Project, DomainError> {
        let team_id = parse_team_id(team_id)?;
        let (team, role) = self.directory.require_member(&team_id, actor).await?;

        if !authz::can_perform(role, "update", "file", team.custom_rules()) {
            return Err(DomainError::forbidden("Not allowed to rename files"));
        }

        if new_name.trim().is_empty() {
            return Err(DomainError::validation("File name cannot be empty"));
        }

        let project = self.get_required(&team_id, project_id).await?;

        let previous = project.clone();
        let mut changed = project;
        let old_name = changed
            .rename_file(file_id, new_name)
            .ok_or_else(|| DomainError::not_found(format!("File '{}' not found", file_id)))?;

        let projects = Arc::clone(&self.projects);
        let projects_revert = Arc::clone(&self.projects);
        let store = Arc::clone(&self.store);
        let new_name = new_name.to_string();

        run_with_compensation(
            move || async move { projects.update(&changed).await },
            move |saved: Project| async move {
                store.rename_file(saved.bucket(), &old_name, &new_name).await
            },
            move |_| async move { projects_revert.update(&previous).await.map(|_| ()) },
        )
        .await
    }

    /// Remove a file row and its object; a storage failure restores the row.
    pub async fn delete_file(
        &self,
        team_id: &str,
        project_id: &str,
        file_id: &str,
        actor: &UserId,
    ) -> Result<Project, DomainError> {
        let team_id = parse_team_id(team_id)?;
        let (team, role) = self.directory.require_member(&team_id, actor).await?;

        if !authz::can_perform(role, "delete", "file", team.custom_rules()) {
            return Err(DomainError::forbidden("Not allowed to delete files"));
        }

        let project = self.get_required(&team_id, project_id).await?;

        let previous = project.clone();
        let mut changed = project;
        let removed = changed
            .remove_file(file_id)
            .ok_or_else(|| DomainError::not_found(format!("File '{}' not found", file_id)))?;
        let key = removed.name().to_string();

        let projects = Arc::clone(&self.projects);
        let projects_revert = Arc::clone(&self.projects);
        let store = Arc::clone(&self.store);

        run_with_compensation(
            move || async move { projects.update(&changed).await },
            move |saved: Project| async move { store.delete_file(saved.bucket(), &key).await },
            move |_| async move { projects_revert.update(&previous).await.map(|_| ()) },
        )
        .await
    }

    async fn get_required(
        &self,
        team_id: &TeamId,
        project_id: &str,
    ) -> Result<Project, DomainError> {
        self.projects
            .get(&ProjectId::new(project_id), team_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("Project '{}' not found", project_id))
            })
    }
}

fn parse_team_id(id: &str) -> Result<TeamId, DomainError> {
    TeamId::new(id).map_err(|e| DomainError::invalid_id(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::authz::Role;
    use crate::domain::member::TeamMember;
    use crate::domain::member::MemberRepository;
    use crate::domain::team::{Team, TeamRepository};
    use crate::infrastructure::project::repository::InMemoryProjectRepository;
    use crate::infrastructure::store::InMemoryObjectStore;
    use crate::infrastructure::team::repository::{
        InMemoryMemberRepository, InMemoryTeamRepository,
    };

    struct Harness {
        service: ProjectService,
        projects: Arc<InMemoryProjectRepository>,
        store: Arc<InMemoryObjectStore>,
        members: Arc<InMemoryMemberRepository>,
        team: Team,
        admin: UserId,
    }

    async fn harness() -> Harness {
        let teams = Arc::new(InMemoryTeamRepository::new());
        let members = Arc::new(InMemoryMemberRepository::new());
        let projects = Arc::new(InMemoryProjectRepository::new());
        let store = Arc::new(InMemoryObjectStore::new());

        let team = Team::new(TeamId::generate(), "Test Team", Role::Member).unwrap();
        teams.create(team.clone()).await.unwrap();

        let admin = UserId::generate();
        members
            .create(TeamMember::new(team.id().clone(), admin.clone(), Role::Admin))
            .await
            .unwrap();

        let directory = Directory::new(teams.clone(), members.clone());
        let service = ProjectService::new(projects.clone(), store.clone(), directory);

        Harness {
            service,
            projects,
            store,
            members,
            team,
            admin,
        }
    }

    #[tokio::test]
    async fn test_create_makes_bucket() {
        let h = harness().await;

        let project = h
            .service
            .create(h.team.id().as_str(), &h.admin, "Diagrams")
            .await
            .unwrap();

        assert!(h.store.bucket_exists(project.bucket()).await.unwrap());
    }

    /// Store double whose pre-check passes but whose bucket creation fails,
    /// to drive the delete-on-failure path.
    #[derive(Debug)]
    struct BrokenBucketStore;

    #[async_trait::async_trait]
    impl ObjectStore for BrokenBucketStore {
        async fn bucket_exists(&self, _bucket: &str) -> Result<bool, DomainError> {
            Ok(false)
        }

        async fn create_bucket(&self, _bucket: &str) -> Result<(), DomainError> {
            Err(DomainError::external_effect("bucket backend down"))
        }

        async fn delete_bucket(&self, _bucket: &str) -> Result<(), DomainError> {
            Ok(())
        }

        async fn upload_file(
            &self,
            _bucket: &str,
            _key: &str,
            _bytes: &[u8],
        ) -> Result<(), DomainError> {
            Ok(())
        }

        async fn rename_file(
            &self,
            _bucket: &str,
            _from: &str,
            _to: &str,
        ) -> Result<(), DomainError> {
            Ok(())
        }

        async fn delete_file(&self, _bucket: &str, _key: &str) -> Result<(), DomainError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_create_deletes_row_on_bucket_failure() {
        let h = harness().await;

        // Same repositories, but the bucket creation itself fails after
        // the pre-check passed.
        let teams = Arc::new(InMemoryTeamRepository::new());
        teams.create(h.team.clone()).await.unwrap();
        let directory = Directory::new(teams, h.members.clone());
        let service = ProjectService::new(h.projects.clone(), Arc::new(BrokenBucketStore), directory);

        let result = service
            .create(h.team.id().as_str(), &h.admin, "Diagrams")
            .await;
        assert!(matches!(result, Err(DomainError::ExternalEffect { .. })));

        // The optimistically created row was deleted, not merely reverted.
        let remaining = h.projects.list_for_team(h.team.id()).await.unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_viewer_cannot_create() {
        let h = harness().await;
        let viewer = UserId::generate();
        h.members
            .create(TeamMember::new(h.team.id().clone(), viewer.clone(), Role::Viewer))
            .await
            .unwrap();

        let result = h
            .service
            .create(h.team.id().as_str(), &viewer, "Diagrams")
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_member_cannot_create_bucket_by_default() {
        let h = harness().await;
        let member = UserId::generate();
        h.members
            .create(TeamMember::new(h.team.id().clone(), member.clone(), Role::Member))
            .await
            .unwrap();

        // The default matrix denies bucket creation to members.
        let result = h
            .service
            .create(h.team.id().as_str(), &member, "Diagrams")
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_upload_and_delete_file() {
        let h = harness().await;
        let project = h
            .service
            .create(h.team.id().as_str(), &h.admin, "Diagrams")
            .await
            .unwrap();

        let updated = h
            .service
            .upload_file(
                h.team.id().as_str(),
                project.id().as_str(),
                &h.admin,
                "flow.svg",
                b"<svg/>",
            )
            .await
            .unwrap();

        assert_eq!(updated.files().len(), 1);
        assert_eq!(h.store.keys(project.bucket()).await, vec!["flow.svg".to_string()]);

        let file_id = updated.files()[0].id().to_string();
        let updated = h
            .service
            .delete_file(h.team.id().as_str(), project.id().as_str(), &file_id, &h.admin)
            .await
            .unwrap();

        assert!(updated.files().is_empty());
        assert!(h.store.keys(project.bucket()).await.is_empty());
    }

    #[tokio::test]
    async fn test_upload_duplicate_name_conflicts() {
        let h = harness().await;
        let project = h
            .service
            .create(h.team.id().as_str(), &h.admin, "Diagrams")
            .await
            .unwrap();

        h.service
            .upload_file(
                h.team.id().as_str(),
                project.id().as_str(),
                &h.admin,
                "flow.svg",
                b"<svg/>",
            )
            .await
            .unwrap();

        let result = h
            .service
            .upload_file(
                h.team.id().as_str(),
                project.id().as_str(),
                &h.admin,
                "flow.svg",
                b"<svg/>",
            )
            .await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_upload_failure_removes_row() {
        let h = harness().await;
        let project = h
            .service
            .create(h.team.id().as_str(), &h.admin, "Diagrams")
            .await
            .unwrap();

        h.store.set_should_fail(true).await;

        let result = h
            .service
            .upload_file(
                h.team.id().as_str(),
                project.id().as_str(),
                &h.admin,
                "flow.svg",
                b"<svg/>",
            )
            .await;
        assert!(matches!(result, Err(DomainError::ExternalEffect { .. })));

        h.store.set_should_fail(false).await;
        let stored = h
            .service
            .get(h.team.id().as_str(), project.id().as_str(), &h.admin)
            .await
            .unwrap();
        assert!(stored.files().is_empty());
    }

    #[tokio::test]
    async fn test_rename_failure_reverts_row() {
        let h = harness().await;
        let project = h
            .service
            .create(h.team.id().as_str(), &h.admin, "Diagrams")
            .await
            .unwrap();
        let project = h
            .service
            .upload_file(
                h.team.id().as_str(),
                project.id().as_str(),
                &h.admin,
                "flow.svg",
                b"<svg/>",
            )
            .await
            .unwrap();
        let file_id = project.files()[0].id().to_string();

        h.store.set_should_fail(true).await;

        let result = h
            .service
            .rename_file(
                h.team.id().as_str(),
                project.id().as_str(),
                &file_id,
                &h.admin,
                "flow-v2.svg",
            )
            .await;
        assert!(matches!(result, Err(DomainError::ExternalEffect { .. })));

        h.store.set_should_fail(false).await;
        let stored = h
            .service
            .get(h.team.id().as_str(), project.id().as_str(), &h.admin)
            .await
            .unwrap();
        assert_eq!(stored.files()[0].name(), "flow.svg");
        assert_eq!(h.store.keys(project.bucket()).await, vec!["flow.svg".to_string()]);
    }

    #[tokio::test]
    async fn test_rename_updates_key() {
        let h = harness().await;
        let project = h
            .service
            .create(h.team.id().as_str(), &h.admin, "Diagrams")
            .await
            .unwrap();
        let project = h
            .service
            .upload_file(
                h.team.id().as_str(),
                project.id().as_str(),
                &h.admin,
                "flow.svg",
                b"<svg/>",
            )
            .await
            .unwrap();
        let file_id = project.files()[0].id().to_string();

        let updated = h
            .service
            .rename_file(
                h.team.id().as_str(),
                project.id().as_str(),
                &file_id,
                &h.admin,
                "flow-v2.svg",
            )
            .await
            .unwrap();

        assert_eq!(updated.files()[0].name(), "flow-v2.svg");
        assert_eq!(h.store.keys(project.bucket()).await, vec!["flow-v2.svg".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_project_failure_restores_row() {
        let h = harness().await;
        let project = h
            .service
            .create(h.team.id().as_str(), &h.admin, "Diagrams")
            .await
            .unwrap();

        h.store.set_should_fail(true).await;

        let result = h
            .service
            .delete(h.team.id().as_str(), project.id().as_str(), &h.admin)
            .await;
        assert!(matches!(result, Err(DomainError::ExternalEffect { .. })));

        h.store.set_should_fail(false).await;
        assert!(h
            .service
            .get(h.team.id().as_str(), project.id().as_str(), &h.admin)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_delete_project_drops_bucket() {
        let h = harness().await;
        let project = h
            .service
            .create(h.team.id().as_str(), &h.admin, "Diagrams")
            .await
            .unwrap();

        h.service
            .delete(h.team.id().as_str(), project.id().as_str(), &h.admin)
            .await
            .unwrap();

        assert!(!h.store.bucket_exists(project.bucket()).await.unwrap());
        let result = h
            .service
            .get(h.team.id().as_str(), project.id().as_str(), &h.admin)
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
