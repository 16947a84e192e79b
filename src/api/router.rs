use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::account;
use super::auth;
use super::health;
use super::invites;
use super::projects;
use super::state::AppState;
use super::teams;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints (no auth)
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        // Authentication endpoints
        .nest("/auth", auth::create_auth_router())
        // Team management, with invites and projects nested per team
        .nest("/teams", teams::create_teams_router())
        .nest("/teams/{team_id}/invites", invites::create_invites_router())
        .nest("/teams/{team_id}/projects", projects::create_projects_router())
        // Account mutation
        .nest("/account", account::create_account_router())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
