//! User infrastructure: password hashing, account service, in-memory repository

pub mod password;
pub mod repository;
mod service;

pub use password::{Argon2Hasher, PasswordHasher};
pub use repository::InMemoryUserRepository;
pub use service::{AccountService, RegisterRequest};
