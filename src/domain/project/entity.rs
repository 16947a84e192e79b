//! Project and project file entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::team::TeamId;

/// Project identifier (uuid-shaped string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A file mirrored into the project's bucket, keyed by its name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Stable identifier within the project
    id: String,
    /// File name; doubles as the object-storage key
    name: String,
    /// Creation timestamp
    created_at: DateTime<Utc>,
}

impl ProjectFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

/// Team-scoped project, mirrored to a bucket-per-project in object storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier
    id: ProjectId,
    /// Owning team
    team_id: TeamId,
    /// Display name
    name: String,
    /// Name of the backing bucket
    bucket: String,
    /// Files mirrored into the bucket
    #[serde(default)]
    files: Vec<ProjectFile>,
    /// Soft-delete marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deleted_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    created_at: DateTime<Utc>,
    /// Last update timestamp
    updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project; the bucket name is derived from the id
    pub fn new(team_id: TeamId, name: impl Into<String>) -> Self {
        let id = ProjectId::generate();
        let bucket = format!("teamspace-{}", id);
        let now = Utc::now();

        Self {
            id,
            team_id,
            name: name.into(),
            bucket,
            files: Vec::new(),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a project from persisted state
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_storage(
        id: ProjectId,
        team_id: TeamId,
        name: String,
        bucket: String,
        files: Vec<ProjectFile>,
        deleted_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            team_id,
            name,
            bucket,
            files,
            deleted_at,
            created_at,
            updated_at,
        }
    }

    // Getters

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    pub fn team_id(&self) -> &TeamId {
        &self.team_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn files(&self) -> &[ProjectFile] {
        &self.files
    }

    pub fn file(&self, file_id: &str) -> Option<&ProjectFile> {
        self.files.iter().find(|f| f.id() == file_id)
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    /// Add a file row; the caller mirrors it to the bucket
    pub fn add_file(&mut self, file: ProjectFile) {
        self.files.push(file);
        self.touch();
    }

    /// Rename a file row, returns the old name when the file exists
    pub fn rename_file(&mut self, file_id: &str, name: impl Into<String>) -> Option<String> {
        let file = self.files.iter_mut().find(|f| f.id() == file_id)?;
        let old = file.name().to_string();
        file.set_name(name);
        self.touch();
        Some(old)
    }

    /// Remove a file row, returning it when it existed
    pub fn remove_file(&mut self, file_id: &str) -> Option<ProjectFile> {
        let idx = self.files.iter().position(|f| f.id() == file_id)?;
        self.touch();
        Some(self.files.remove(idx))
    }

    /// Mark the project as deleted
    pub fn soft_delete(&mut self) {
        self.deleted_at = Some(Utc::now());
        self.touch();
    }

    /// Undo a soft delete
    pub fn restore(&mut self) {
        self.deleted_at = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
