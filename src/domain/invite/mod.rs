//! Invitation domain: entity, state machine, repository

mod entity;
mod repository;

pub use entity::{InviteId, InviteStatus, TeamInvite};
pub use repository::InviteRepository;
