//! Teamspace API
//!
//! Multi-tenant team management: memberships, role-based authorization
//! with per-team rule overrides, an invitation lifecycle that survives
//! concurrent acceptance, and account mutation endpoints whose external
//! side effects (notification mail, bucket rotation) are paired with
//! synchronous compensation.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};

use api::state::AppState;
use domain::invite::InviteRepository;
use domain::member::MemberRepository;
use domain::notification::Notifier;
use domain::object_store::ObjectStore;
use domain::project::ProjectRepository;
use domain::team::TeamRepository;
use domain::user::UserRepository;
use infrastructure::auth::{JwtConfig, JwtService};
use infrastructure::invite::{InMemoryInviteRepository, InviteService};
use infrastructure::notify::{HttpNotifier, RecordingNotifier};
use infrastructure::postgres::{
    PostgresInviteRepository, PostgresMemberRepository, PostgresProjectRepository,
    PostgresTeamRepository, PostgresUserRepository,
};
use infrastructure::project::{InMemoryProjectRepository, ProjectService};
use infrastructure::store::InMemoryObjectStore;
use infrastructure::team::{
    InMemoryMemberRepository, InMemoryTeamRepository, TeamService,
};
use infrastructure::user::{AccountService, Argon2Hasher, InMemoryUserRepository};

struct Repositories {
    users: Arc<dyn UserRepository>,
    teams: Arc<dyn TeamRepository>,
    members: Arc<dyn MemberRepository>,
    invites: Arc<dyn InviteRepository>,
    projects: Arc<dyn ProjectRepository>,
}

/// Create the application state with all services initialized
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let repositories = match config.storage.backend.as_str() {
        "postgres" => {
            let database_url = std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

            info!("Connecting to PostgreSQL...");
            let pool = sqlx::PgPool::connect(&database_url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to PostgreSQL: {}", e))?;
            info!("PostgreSQL connection established");

            Repositories {
                users: Arc::new(PostgresUserRepository::new(pool.clone())),
                teams: Arc::new(PostgresTeamRepository::new(pool.clone())),
                members: Arc::new(PostgresMemberRepository::new(pool.clone())),
                invites: Arc::new(PostgresInviteRepository::new(pool.clone())),
                projects: Arc::new(PostgresProjectRepository::new(pool)),
            }
        }
        "memory" => {
            info!("Using in-memory storage");
            Repositories {
                users: Arc::new(InMemoryUserRepository::new()),
                teams: Arc::new(InMemoryTeamRepository::new()),
                members: Arc::new(InMemoryMemberRepository::new()),
                invites: Arc::new(InMemoryInviteRepository::new()),
                projects: Arc::new(InMemoryProjectRepository::new()),
            }
        }
        other => {
            anyhow::bail!("Unknown storage backend '{}', expected 'memory' or 'postgres'", other)
        }
    };

    let notifier: Arc<dyn Notifier> = match &config.mail.base_url {
        Some(base_url) => {
            info!(base_url = %base_url, "Using HTTP mail gateway");
            Arc::new(HttpNotifier::new(base_url))
        }
        None => {
            warn!("No mail gateway configured; notifications are recorded in-process only");
            Arc::new(RecordingNotifier::new())
        }
    };

    // Bucket mirroring runs against the in-process store; a remote object
    // storage client plugs in behind the same trait.
    let store: Arc<dyn ObjectStore> = Arc::new(InMemoryObjectStore::new());

    let hasher = Arc::new(Argon2Hasher::new());

    let accounts = Arc::new(AccountService::new(
        repositories.users,
        hasher,
        Arc::clone(&notifier),
    ));

    let teams = Arc::new(TeamService::new(
        repositories.teams,
        Arc::clone(&repositories.members),
    ));
    let directory = teams.directory();

    let invites = Arc::new(InviteService::new(
        repositories.invites,
        repositories.members,
        directory.clone(),
        notifier,
    ));

    let projects = Arc::new(ProjectService::new(repositories.projects, store, directory));

    let jwt_secret = config
        .auth
        .jwt_secret
        .clone()
        .or_else(|| std::env::var("JWT_SECRET").ok())
        .unwrap_or_else(|| {
            warn!(
                "No JWT_SECRET configured. Generating a random secret; \
                 sessions will NOT survive a restart."
            );
            generate_random_secret()
        });

    let jwt = Arc::new(JwtService::new(JwtConfig::new(
        jwt_secret,
        u64::from(config.auth.jwt_expiration_hours),
    )));

    Ok(AppState::new(accounts, teams, invites, projects, jwt))
}

/// Generate a random JWT secret
fn generate_random_secret() -> String {
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_app_state_with_memory_backend() {
        let config = AppConfig::default();
        let state = create_app_state(&config).await.unwrap();

        // The wiring is usable end to end: register, login, create a team.
        let user = state
            .accounts
            .register(infrastructure::user::RegisterRequest {
                email: "ada@example.com".to_string(),
                username: "ada".to_string(),
                password: "secure_password123".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                age: 30,
            })
            .await
            .unwrap();

        let token = state.jwt.generate(&user).unwrap();
        assert!(state.jwt.validate(&token).is_ok());

        let team = state
            .teams
            .create(
                user.id(),
                infrastructure::team::CreateTeamRequest {
                    name: "Ada's Team".to_string(),
                    default_role: domain::authz::Role::Member,
                },
            )
            .await
            .unwrap();

        assert_eq!(team.name(), "Ada's Team");
    }

    #[tokio::test]
    async fn test_create_app_state_rejects_unknown_backend() {
        let mut config = AppConfig::default();
        config.storage.backend = "cassandra".to_string();

        assert!(create_app_state(&config).await.is_err());
    }

    #[test]
    fn test_random_secret_length() {
        assert_eq!(generate_random_secret().len(), 64);
    }
}
