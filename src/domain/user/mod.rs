//! User domain: entity, validation, repository

mod entity;
mod repository;
mod validation;

pub use entity::{User, UserId};
pub use repository::UserRepository;
pub use validation::{
    validate_age, validate_email, validate_name, validate_password, validate_user_id,
    validate_username, UserValidationError, MIN_AGE,
};
