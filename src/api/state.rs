//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::auth::JwtGenerator;
use crate::infrastructure::invite::InviteService;
use crate::infrastructure::project::ProjectService;
use crate::infrastructure::team::TeamService;
use crate::infrastructure::user::AccountService;

/// Application state containing the shared services
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub teams: Arc<TeamService>,
    pub invites: Arc<InviteService>,
    pub projects: Arc<ProjectService>,
    pub jwt: Arc<dyn JwtGenerator>,
}

impl AppState {
    /// Create new application state with the provided services
    pub fn new(
        accounts: Arc<AccountService>,
        teams: Arc<TeamService>,
        invites: Arc<InviteService>,
        projects: Arc<ProjectService>,
        jwt: Arc<dyn JwtGenerator>,
    ) -> Self {
        Self {
            accounts,
            teams,
            invites,
            projects,
            jwt,
        }
    }
}
