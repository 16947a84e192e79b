//! Invite infrastructure: lifecycle manager and in-memory repository

pub mod repository;
mod service;

pub use repository::InMemoryInviteRepository;
pub use service::InviteService;
