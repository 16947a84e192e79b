//! Team-scoped project endpoints

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
use crate::domain::project::{Project, ProjectFile};

/// Create the projects router, nested under /teams/{team_id}/projects
pub fn create_projects_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_project).get(list_projects))
        .route("/{project_id}", get(get_project).delete(delete_project))
        .route("/{project_id}/files", post(upload_file))
        .route(
            "/{project_id}/files/{file_id}",
            put(rename_file).delete(delete_file),
        )
}

/// Request to create a project
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

/// Request to upload a file into a project
#[derive(Debug, Clone, Deserialize)]
pub struct UploadFileRequest {
    pub name: String,
    pub content: String,
}

/// Request to rename a file
#[derive(Debug, Clone, Deserialize)]
pub struct RenameFileRequest {
    pub name: String,
}

/// File response
#[derive(Debug, Clone, Serialize)]
pub struct FileResponse {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

impl From<&ProjectFile> for FileResponse {
    fn from(file: &ProjectFile) -> Self {
        Self {
            id: file.id().to_string(),
            name: file.name().to_string(),
            created_at: file.created_at().to_rfc3339(),
        }
    }
}

/// Project response
#[derive(Debug, Clone, Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub team_id: String,
    pub name: String,
    pub bucket: String,
    pub files: Vec<FileResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Project> for ProjectResponse {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id().as_str().to_string(),
            team_id: project.team_id().as_str().to_string(),
            name: project.name().to_string(),
            bucket: project.bucket().to_string(),
            files: project.files().iter().map(FileResponse::from).collect(),
            created_at: project.created_at().to_rfc3339(),
            updated_at: project.updated_at().to_rfc3339(),
        }
    }
}

/// POST /teams/{team_id}/projects
pub async fn create_project(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(team_id): Path<String>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    debug!(team_id = %team_id, name = %request.name, "Creating project");

    let project = state
        .projects
        .create(&team_id, user.id(), &request.name)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ProjectResponse::from(&project)))
}

/// GET /teams/{team_id}/projects
pub async fn list_projects(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let projects = state
        .projects
        .list(&team_id, user.id())
        .await
        .map_err(ApiError::from)?;

    Ok(Json(projects.iter().map(ProjectResponse::from).collect()))
}

/// GET /teams/{team_id}/projects/{project_id}
pub async fn get_project(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((team_id, project_id)): Path<(String, String)>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state
        .projects
        .get(&team_id, &project_id, user.id())
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ProjectResponse::from(&project)))
}

/// DELETE /teams/{team_id}/projects/{project_id}
pub async fn delete_project(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((team_id, project_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    debug!(team_id = %team_id, project_id = %project_id, "Deleting project");

    state
        .projects
        .delete(&team_id, &project_id, user.id())
        .await
        .map_err(ApiError::from)?;

    Ok(Json(serde_json::json!({
        "deleted": true,
        "id": project_id
    })))
}

/// POST /teams/{team_id}/projects/{project_id}/files
pub async fn upload_file(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((team_id, project_id)): Path<(String, String)>,
    Json(request): Json<UploadFileRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    debug!(team_id = %team_id, project_id = %project_id, name = %request.name, "Uploading file");

    let project = state
        .projects
        .upload_file(
            &team_id,
            &project_id,
            user.id(),
            &request.name,
            request.content.as_bytes(),
        )
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ProjectResponse::from(&project)))
}

/// PUT /teams/{team_id}/projects/{project_id}/files/{file_id}
pub async fn rename_file(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((team_id, project_id, file_id)): Path<(String, String, String)>,
    Json(request): Json<RenameFileRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    debug!(team_id = %team_id, project_id = %project_id, file_id = %file_id, "Renaming file");

    let project = state
        .projects
        .rename_file(&team_id, &project_id, &file_id, user.id(), &request.name)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ProjectResponse::from(&project)))
}

/// DELETE /teams/{team_id}/projects/{project_id}/files/{file_id}
pub async fn delete_file(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((team_id, project_id, file_id)): Path<(String, String, String)>,
) -> Result<Json<ProjectResponse>, ApiError> {
    debug!(team_id = %team_id, project_id = %project_id, file_id = %file_id, "Deleting file");

    let project = state
        .projects
        .delete_file(&team_id, &project_id, &file_id, user.id())
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ProjectResponse::from(&project)))
}
