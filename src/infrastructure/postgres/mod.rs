//! PostgreSQL repository implementations
//!
//! Runtime-checked `sqlx` queries over a shared `PgPool`. Uniqueness
//! violations are detected from the database error and surfaced as
//! `Conflict`; the membership unique index on (team_id, user_id) is what
//! the invite acceptance race relies on.

mod invite;
mod member;
mod project;
mod team;
mod user;

pub use invite::PostgresInviteRepository;
pub use member::PostgresMemberRepository;
pub use project::PostgresProjectRepository;
pub use team::PostgresTeamRepository;
pub use user::PostgresUserRepository;

use crate::domain::DomainError;

/// True when the database error is a uniqueness violation
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    let msg = error.to_string();
    msg.contains("duplicate key") || msg.contains("unique constraint")
}

pub(crate) fn storage_error(context: &str, error: sqlx::Error) -> DomainError {
    DomainError::storage(format!("{}: {}", context, error))
}
