//! Account service: registration, login support and account mutation
//!
//! Every "change X and notify" operation runs through the mutation
//! coordinator: the field is persisted first, the notification is sent
//! second, and a send failure reverts the field to its captured
//! pre-mutation value before the error reaches the caller.

use std::sync::Arc;

use tracing::info;

use super::password::PasswordHasher;
use crate::domain::notification::{EmailChanged, Notifier, UsernameChanged};
use crate::domain::user::{
    validate_age, validate_email, validate_name, validate_password, validate_username, User,
    UserId, UserRepository,
};
use crate::domain::DomainError;
use crate::infrastructure::mutation::run_with_compensation;

/// Request for registering a new user
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub age: u8,
}

/// Account service over the user repository, password hasher and notifier
#[derive(Debug)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    notifier: Arc<dyn Notifier>,
}

impl AccountService {
    /// Create a new account service
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            users,
            hasher,
            notifier,
        }
    }

    /// Register a new user
    pub async fn register(&self, request: RegisterRequest) -> Result<User, DomainError> {
        let email = request.email.trim().to_lowercase();

        validate_email(&email).map_err(|e| DomainError::validation(e.to_string()))?;
        validate_username(&request.username)
            .map_err(|e| DomainError::validation(e.to_string()))?;
        validate_password(&request.password)
            .map_err(|e| DomainError::validation(e.to_string()))?;
        validate_name(&request.first_name).map_err(|e| DomainError::validation(e.to_string()))?;
        validate_name(&request.last_name).map_err(|e| DomainError::validation(e.to_string()))?;
        validate_age(request.age).map_err(|e| DomainError::validation(e.to_string()))?;

        let password_hash = self.hasher.hash(&request.password)?;

        let user = User::new(
            UserId::generate(),
            email,
            &request.username,
            &request.first_name,
            &request.last_name,
            password_hash,
            request.age,
        )
        .map_err(|e| DomainError::validation(e.to_string()))?;

        info!(user_id = %user.id(), username = %request.username, "Registering user");

        self.users.create(user).await
    }

    /// Authenticate a user with username and password
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, DomainError> {
        let user = match self.users.get_by_username(username).await? {
            Some(u) => u,
            None => return Ok(None),
        };

        if !self.hasher.verify(password, user.password_hash()) {
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Get a user by ID
    pub async fn get(&self, id: &str) -> Result<Option<User>, DomainError> {
        let user_id = UserId::new(id).map_err(|e| DomainError::invalid_id(e.to_string()))?;
        self.users.get(&user_id).await
    }

    async fn get_required(&self, user_id: &UserId) -> Result<User, DomainError> {
        self.users
            .get(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", user_id)))
    }

    /// Change the first name. Local-only, no external effect.
    pub async fn change_first_name(
        &self,
        user_id: &UserId,
        first_name: &str,
    ) -> Result<User, DomainError> {
        validate_name(first_name).map_err(|e| DomainError::validation(e.to_string()))?;

        let mut user = self.get_required(user_id).await?;
        user.set_first_name(first_name);
        self.users.update(&user).await
    }

    /// Change the last name. Local-only, no external effect.
    pub async fn change_last_name(
        &self,
        user_id: &UserId,
        last_name: &str,
    ) -> Result<User, DomainError> {
        validate_name(last_name).map_err(|e| DomainError::validation(e.to_string()))?;

        let mut user = self.get_required(user_id).await?;
        user.set_last_name(last_name);
        self.users.update(&user).await
    }

    /// Change the email address.
    ///
    /// Conflict pre-check happens before any mutation; the notification
    /// goes to the new address with the old one in the payload, and a send
    /// failure reverts the stored address.
    pub async fn change_email(
        &self,
        user_id: &UserId,
        new_email: &str,
    ) -> Result<User, DomainError> {
        let email = new_email.trim().to_lowercase();
        validate_email(&email).map_err(|e| DomainError::validation(e.to_string()))?;

        let user = self.get_required(user_id).await?;

        if let Some(existing) = self.users.get_by_email(&email).await? {
            if existing.id() != user_id {
                return Err(DomainError::conflict(format!(
                    "Email '{}' is already in use",
                    email
                )));
            }
        }

        let previous = user.clone();
        let old_email = user.email().to_string();
        let mut changed = user;
        changed.set_email(email);

        let users = Arc::clone(&self.users);
        let users_revert = Arc::clone(&self.users);
        let notifier = Arc::clone(&self.notifier);

        run_with_compensation(
            move || async move { users.update(&changed).await },
            move |saved: User| async move {
                notifier
                    .send_email_changed(&EmailChanged {
                        to: saved.email().to_string(),
                        old_email,
                        context: "account email address updated".to_string(),
                    })
                    .await
            },
            move |_| async move { users_revert.update(&previous).await.map(|_| ()) },
        )
        .await
    }

    /// Change the username, with the same pre-check/notify/revert shape as
    /// the email change.
    pub async fn change_username(
        &self,
        user_id: &UserId,
        new_username: &str,
    ) -> Result<User, DomainError> {
        validate_username(new_username).map_err(|e| DomainError::validation(e.to_string()))?;

        let user = self.get_required(user_id).await?;

        if let Some(existing) = self.users.get_by_username(new_username).await? {
            if existing.id() != user_id {
                return Err(DomainError::conflict(format!(
                    "Username '{}' is already in use",
                    new_username
                )));
            }
        }

        let previous = user.clone();
        let mut changed = user;
        changed.set_username(new_username);

        let users = Arc::clone(&self.users);
        let users_revert = Arc::clone(&self.users);
        let notifier = Arc::clone(&self.notifier);

        run_with_compensation(
            move || async move { users.update(&changed).await },
            move |saved: User| async move {
                notifier
                    .send_username_changed(&UsernameChanged {
                        email: saved.email().to_string(),
                        username: saved.username().to_string(),
                    })
                    .await
            },
            move |_| async move { users_revert.update(&previous).await.map(|_| ()) },
        )
        .await
    }

    /// Change the password.
    ///
    /// The current password must verify against the stored hash before
    /// anything is mutated. The new hash is computed exactly once, here,
    /// because this is the only place the plaintext changes; compensation
    /// restores the previous hash string verbatim.
    pub async fn change_password(
        &self,
        user_id: &UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<User, DomainError> {
        let user = self.get_required(user_id).await?;

        if !self.hasher.verify(current_password, user.password_hash()) {
            return Err(DomainError::unauthorized("Current password is incorrect"));
        }

        validate_password(new_password).map_err(|e| DomainError::validation(e.to_string()))?;

        let new_hash = self.hasher.hash(new_password)?;

        let previous = user.clone();
        let email = user.email().to_string();
        let mut changed = user;
        changed.set_password_hash(new_hash);

        let users = Arc::clone(&self.users);
        let users_revert = Arc::clone(&self.users);
        let notifier = Arc::clone(&self.notifier);

        run_with_compensation(
            move || async move { users.update(&changed).await },
            move |_| async move { notifier.send_password_changed(&email).await },
            move |_| async move { users_revert.update(&previous).await.map(|_| ()) },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::notify::{RecordingNotifier, SentMessage};
    use crate::infrastructure::user::password::Argon2Hasher;
    use crate::infrastructure::user::repository::InMemoryUserRepository;

    struct Harness {
        service: AccountService,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness() -> Harness {
        let notifier = Arc::new(RecordingNotifier::new());
        let service = AccountService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(Argon2Hasher::new()),
            notifier.clone(),
        );
        Harness { service, notifier }
    }

    fn register_request(email: &str, username: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: "secure_password123".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            age: 30,
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_email() {
        let h = harness();

        let user = h
            .service
            .register(register_request("Ada@Example.COM", "ada"))
            .await
            .unwrap();

        assert_eq!(user.email(), "ada@example.com");
    }

    #[tokio::test]
    async fn test_register_age_gate() {
        let h = harness();

        let mut request = register_request("kid@example.com", "kiddo");
        request.age = 11;

        let result = h.service.register(request).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let h = harness();

        h.service
            .register(register_request("ada@example.com", "ada"))
            .await
            .unwrap();

        let result = h
            .service
            .register(register_request("ada@example.com", "other"))
            .await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let h = harness();
        h.service
            .register(register_request("ada@example.com", "ada"))
            .await
            .unwrap();

        assert!(h
            .service
            .authenticate("ada", "secure_password123")
            .await
            .unwrap()
            .is_some());
        assert!(h
            .service
            .authenticate("ada", "wrong_password")
            .await
            .unwrap()
            .is_none());
        assert!(h
            .service
            .authenticate("nobody", "secure_password123")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_change_email_sends_to_new_address() {
        let h = harness();
        let user = h
            .service
            .register(register_request("old@example.com", "ada"))
            .await
            .unwrap();

        let updated = h
            .service
            .change_email(user.id(), "new@example.com")
            .await
            .unwrap();

        assert_eq!(updated.email(), "new@example.com");
        assert_eq!(
            h.notifier.sent().await,
            vec![SentMessage::EmailChanged {
                to: "new@example.com".to_string(),
                old_email: "old@example.com".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_change_email_reverts_on_mail_failure() {
        let h = harness();
        let user = h
            .service
            .register(register_request("old@example.com", "ada"))
            .await
            .unwrap();

        h.notifier.set_should_fail(true).await;

        let result = h.service.change_email(user.id(), "new@example.com").await;
        assert!(matches!(result, Err(DomainError::ExternalEffect { .. })));

        let stored = h.service.get(user.id().as_str()).await.unwrap().unwrap();
        assert_eq!(stored.email(), "old@example.com");
    }

    #[tokio::test]
    async fn test_change_email_conflict_pre_check() {
        let h = harness();
        h.service
            .register(register_request("exists@example.com", "grace"))
            .await
            .unwrap();
        let user = h
            .service
            .register(register_request("ada@example.com", "ada"))
            .await
            .unwrap();

        let result = h.service.change_email(user.id(), "exists@example.com").await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));

        // Nothing was mutated, nothing was sent.
        let stored = h.service.get(user.id().as_str()).await.unwrap().unwrap();
        assert_eq!(stored.email(), "ada@example.com");
        let other = h.service.authenticate("grace", "secure_password123").await.unwrap().unwrap();
        assert_eq!(other.email(), "exists@example.com");
        assert_eq!(h.notifier.sent_count().await, 0);
    }

    #[tokio::test]
    async fn test_change_email_invalid_is_noop() {
        let h = harness();
        let user = h
            .service
            .register(register_request("ada@example.com", "ada"))
            .await
            .unwrap();

        let result = h.service.change_email(user.id(), "not-an-email").await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert_eq!(h.notifier.sent_count().await, 0);

        let stored = h.service.get(user.id().as_str()).await.unwrap().unwrap();
        assert_eq!(stored.email(), "ada@example.com");
    }

    #[tokio::test]
    async fn test_change_username_reverts_on_mail_failure() {
        let h = harness();
        let user = h
            .service
            .register(register_request("ada@example.com", "ada"))
            .await
            .unwrap();

        h.notifier.set_should_fail(true).await;

        let result = h.service.change_username(user.id(), "countess").await;
        assert!(matches!(result, Err(DomainError::ExternalEffect { .. })));

        let stored = h.service.get(user.id().as_str()).await.unwrap().unwrap();
        assert_eq!(stored.username(), "ada");
    }

    #[tokio::test]
    async fn test_change_username_conflict_pre_check() {
        let h = harness();
        h.service
            .register(register_request("grace@example.com", "grace"))
            .await
            .unwrap();
        let user = h
            .service
            .register(register_request("ada@example.com", "ada"))
            .await
            .unwrap();

        let result = h.service.change_username(user.id(), "grace").await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        assert_eq!(h.notifier.sent_count().await, 0);
    }

    #[tokio::test]
    async fn test_change_password_happy_path() {
        let h = harness();
        let user = h
            .service
            .register(register_request("ada@example.com", "ada"))
            .await
            .unwrap();

        h.service
            .change_password(user.id(), "secure_password123", "another_password456")
            .await
            .unwrap();

        assert!(h
            .service
            .authenticate("ada", "another_password456")
            .await
            .unwrap()
            .is_some());
        assert!(h
            .service
            .authenticate("ada", "secure_password123")
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            h.notifier.sent().await,
            vec![SentMessage::PasswordChanged {
                email: "ada@example.com".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_change_password_wrong_current_is_unauthorized() {
        let h = harness();
        let user = h
            .service
            .register(register_request("ada@example.com", "ada"))
            .await
            .unwrap();

        let result = h
            .service
            .change_password(user.id(), "wrong_current", "another_password456")
            .await;
        assert!(matches!(result, Err(DomainError::Unauthorized { .. })));
        assert_eq!(h.notifier.sent_count().await, 0);

        // Old password still works.
        assert!(h
            .service
            .authenticate("ada", "secure_password123")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_change_password_reverts_on_mail_failure() {
        let h = harness();
        let user = h
            .service
            .register(register_request("ada@example.com", "ada"))
            .await
            .unwrap();

        h.notifier.set_should_fail(true).await;

        let result = h
            .service
            .change_password(user.id(), "secure_password123", "another_password456")
            .await;
        assert!(matches!(result, Err(DomainError::ExternalEffect { .. })));

        // The previous hash was restored; the old password still verifies.
        assert!(h
            .service
            .authenticate("ada", "secure_password123")
            .await
            .unwrap()
            .is_some());
        assert!(h
            .service
            .authenticate("ada", "another_password456")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_change_names_local_only() {
        let h = harness();
        let user = h
            .service
            .register(register_request("ada@example.com", "ada"))
            .await
            .unwrap();

        let updated = h
            .service
            .change_first_name(user.id(), "Augusta")
            .await
            .unwrap();
        assert_eq!(updated.first_name(), "Augusta");

        let updated = h.service.change_last_name(user.id(), "King").await.unwrap();
        assert_eq!(updated.last_name(), "King");

        assert_eq!(h.notifier.sent_count().await, 0);
    }
}
