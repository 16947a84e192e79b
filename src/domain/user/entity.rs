//! User entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{validate_age, validate_user_id, UserValidationError};

/// User identifier - alphanumeric + hyphens, max 50 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Create a new UserId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        validate_user_id(&id)?;
        Ok(Self(id))
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user
    id: UserId,
    /// Unique email address
    email: String,
    /// Unique username for login
    username: String,
    /// First name
    first_name: String,
    /// Last name
    last_name: String,
    /// Argon2 password hash - never exposed in serialization
    #[serde(skip_serializing)]
    password_hash: String,
    /// Age in years; gated at registration and update
    age: u8,
    /// Creation timestamp
    created_at: DateTime<Utc>,
    /// Last update timestamp
    updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        username: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        password_hash: impl Into<String>,
        age: u8,
    ) -> Result<Self, UserValidationError> {
        validate_age(age)?;
        let now = Utc::now();

        Ok(Self {
            id,
            email: email.into(),
            username: username.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            password_hash: password_hash.into(),
            age,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuild a user from persisted state. Skips the age gate: the row
    /// already passed it when it was written.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_storage(
        id: UserId,
        email: String,
        username: String,
        first_name: String,
        last_name: String,
        password_hash: String,
        age: u8,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            username,
            first_name,
            last_name,
            password_hash,
            age,
            created_at,
            updated_at,
        }
    }

    // Getters

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn age(&self) -> u8 {
        self.age
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    /// Update the email address
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.touch();
    }

    /// Update the username
    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
        self.touch();
    }

    /// Update the first name
    pub fn set_first_name(&mut self, first_name: impl Into<String>) {
        self.first_name = first_name.into();
        self.touch();
    }

    /// Update the last name
    pub fn set_last_name(&mut self, last_name: impl Into<String>) {
        self.last_name = last_name.into();
        self.touch();
    }

    /// Update the password hash. Hashing happens in the service layer and
    /// only when the plaintext actually changed.
    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = password_hash.into();
        self.touch();
    }

    /// Update the age; the gate applies on update as well
    pub fn set_age(&mut self, age: u8) -> Result<(), UserValidationError> {
        validate_age(age)?;
        self.age = age;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_user(email: &str, username: &str) -> User {
        User::new(
            UserId::generate(),
            email,
            username,
            "Test",
            "User",
            "hashed_password",
            30,
        )
        .unwrap()
    }

    #[test]
    fn test_user_id_valid() {
        let id = UserId::new("admin").unwrap();
        assert_eq!(id.as_str(), "admin");
    }

    #[test]
    fn test_user_id_generate_is_valid() {
        let id = UserId::generate();
        assert!(UserId::new(id.as_str()).is_ok());
    }

    #[test]
    fn test_user_id_invalid() {
        assert!(UserId::new("").is_err());
        assert!(UserId::new("user name").is_err());
    }

    #[test]
    fn test_user_creation() {
        let user = create_test_user("ada@example.com", "ada");

        assert_eq!(user.email(), "ada@example.com");
        assert_eq!(user.username(), "ada");
        assert_eq!(user.first_name(), "Test");
        assert_eq!(user.age(), 30);
        assert_eq!(user.password_hash(), "hashed_password");
    }

    #[test]
    fn test_age_gate_on_creation() {
        let result = User::new(
            UserId::generate(),
            "kid@example.com",
            "kiddo",
            "Kid",
            "User",
            "hash",
            11,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_age_gate_on_update() {
        let mut user = create_test_user("ada@example.com", "ada");
        assert!(user.set_age(11).is_err());
        assert_eq!(user.age(), 30);
        assert!(user.set_age(12).is_ok());
        assert_eq!(user.age(), 12);
    }

    #[test]
    fn test_mutators_touch_updated_at() {
        let mut user = create_test_user("ada@example.com", "ada");
        let original_updated = user.updated_at();

        std::thread::sleep(std::time::Duration::from_millis(10));

        user.set_email("new@example.com");
        assert_eq!(user.email(), "new@example.com");
        assert!(user.updated_at() > original_updated);
    }

    #[test]
    fn test_user_serialization_excludes_password() {
        let user = create_test_user("ada@example.com", "ada");

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("hashed_password"));
        assert!(!json.contains("password_hash"));
    }
}
