//! Identity service - registration, authentication and directory reads.
//!
//! Every state change is written to the directory first and its event is
//! published afterwards. What a failed publish means for the caller is
//! decided by the configured [`DeliveryPolicy`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use common::{AppError, AppResult};
use domain::{
    DomainEvent, EventAction, NewUser, PageQuery, Paginated, Password, ProfileUpdate,
    Registration, User, UserChanges,
};

use super::token_service::{TokenResponse, TokenService, VerifiedClaims};
use crate::events::{DeliveryPolicy, EventPublisher};
use crate::repository::UserRepository;

/// Identity service trait for dependency injection.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Register a new user and announce it
    async fn register(&self, registration: Registration) -> AppResult<User>;

    /// Check credentials and return a bearer token
    async fn login(&self, email: &str, password: &str) -> AppResult<TokenResponse>;

    /// Publish a recovery link for the account and return it
    async fn recover_password(&self, email: &str) -> AppResult<String>;

    /// Replace the password of a user
    async fn update_password(&self, id: i64, password: &str) -> AppResult<()>;

    /// Update profile fields, authorized by the current password
    async fn update_profile(&self, update: ProfileUpdate) -> AppResult<User>;

    /// Delete the account identified by `id`, authorized by email and password
    async fn delete_user(&self, id: i64, email: &str, password: &str) -> AppResult<()>;

    /// Get user by ID
    async fn get_user(&self, id: i64) -> AppResult<Option<User>>;

    /// List all users
    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Users whose name or email contains `term`
    async fn search_users(&self, term: &str) -> AppResult<Vec<User>>;

    /// One page of users
    async fn paginate_users(&self, query: PageQuery) -> AppResult<Paginated<User>>;

    /// Verify a bearer token and extract the caller's identity
    fn verify_token(&self, token: &str) -> AppResult<VerifiedClaims>;

    /// Check the directory is reachable
    async fn check_health(&self) -> AppResult<()>;
}

/// Concrete implementation of IdentityService.
pub struct IdentityManager {
    repo: Arc<dyn UserRepository>,
    publisher: Arc<dyn EventPublisher>,
    tokens: TokenService,
    delivery_policy: DeliveryPolicy,
    recovery_base_url: String,
    dropped_events: AtomicU64,
}

impl IdentityManager {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        publisher: Arc<dyn EventPublisher>,
        tokens: TokenService,
        delivery_policy: DeliveryPolicy,
        recovery_base_url: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            publisher,
            tokens,
            delivery_policy,
            recovery_base_url: recovery_base_url.into(),
            dropped_events: AtomicU64::new(0),
        }
    }

    /// Events lost under the best-effort policy since startup
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    fn recovery_url(&self, id: i64) -> String {
        format!("{}/{}", self.recovery_base_url.trim_end_matches('/'), id)
    }

    /// Publish an event for a change that is already committed.
    async fn emit(&self, action: EventAction, user: &User) -> AppResult<()> {
        let event = DomainEvent::new(action, user);

        let Err(e) = self.publisher.publish(&event).await else {
            return Ok(());
        };

        match self.delivery_policy {
            DeliveryPolicy::Strict => {
                tracing::error!(
                    routing_key = %action,
                    user_id = user.id,
                    error = %e,
                    "Event publish failed"
                );
                Err(e)
            }
            DeliveryPolicy::BestEffort => {
                let dropped = self.dropped_events.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::error!(
                    routing_key = %action,
                    user_id = user.id,
                    dropped_events = dropped,
                    error = %e,
                    "Event dropped"
                );
                Ok(())
            }
        }
    }
}

#[async_trait]
impl IdentityService for IdentityManager {
    async fn register(&self, registration: Registration) -> AppResult<User> {
        let password = Password::new(&registration.password)?;
        let new_user = NewUser::new(registration, password, Utc::now().date_naive());

        let user = self.repo.create(new_user).await?;
        tracing::info!(user_id = user.id, "User registered");

        self.emit(EventAction::Registered, &user).await?;
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> AppResult<TokenResponse> {
        let user = self
            .repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::NotFound)?;

        if !user.verify_password(password) {
            tracing::debug!(user_id = user.id, "Login rejected");
            return Err(AppError::InvalidPassword);
        }

        let token = self.tokens.issue(user.id, &user.email)?;
        self.emit(EventAction::Login, &user).await?;

        Ok(token)
    }

    async fn recover_password(&self, email: &str) -> AppResult<String> {
        let user = self
            .repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::NotFound)?;

        let recovery_url = self.recovery_url(user.id);
        self.emit(EventAction::RecoveryLink, &user).await?;

        Ok(recovery_url)
    }

    async fn update_password(&self, id: i64, password: &str) -> AppResult<()> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound)?;

        let password = Password::new(password)?;
        let user = self.repo.update(id, UserChanges::password(password)).await?;
        tracing::info!(user_id = id, "Password updated");

        self.emit(EventAction::PasswordUpdated, &user).await
    }

    async fn update_profile(&self, update: ProfileUpdate) -> AppResult<User> {
        let user = self
            .repo
            .find_by_id(update.id)
            .await?
            .ok_or(AppError::NotFound)?;

        if !user.verify_password(&update.current_password) {
            return Err(AppError::InvalidPassword);
        }

        let changes = update.changes();
        if changes.is_empty() {
            return Ok(user);
        }

        self.repo.update(user.id, changes).await
    }

    async fn delete_user(&self, id: i64, email: &str, password: &str) -> AppResult<()> {
        let user = self
            .repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::NotFound)?;

        if user.id != id {
            return Err(AppError::InvalidEmail);
        }
        if !user.verify_password(password) {
            return Err(AppError::InvalidPassword);
        }

        self.repo.delete(user.id).await?;
        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        self.repo.find_by_id(id).await
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.repo.list().await
    }

    async fn search_users(&self, term: &str) -> AppResult<Vec<User>> {
        self.repo.search(term).await
    }

    async fn paginate_users(&self, query: PageQuery) -> AppResult<Paginated<User>> {
        self.repo.paginate(&query).await
    }

    fn verify_token(&self, token: &str) -> AppResult<VerifiedClaims> {
        self.tokens.verify(token)
    }

    async fn check_health(&self) -> AppResult<()> {
        self.repo.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use common::JwtConfig;
    use mockall::predicate::eq;

    use crate::events::MockEventPublisher;
    use crate::repository::MockUserRepository;

    const SECRET: &str = "test-secret-key-that-is-at-least-32-chars";

    fn user_with_password(id: i64, email: &str, password: &str) -> User {
        User {
            id,
            name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone_number: "555-0100".to_string(),
            email: email.to_string(),
            password_hash: Password::new(password).unwrap().into_string(),
            is_active: true,
            created_at: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        }
    }

    fn registration() -> Registration {
        Registration {
            name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone_number: "555-0100".to_string(),
            email: "ada@example.com".to_string(),
            password: "analytical".to_string(),
        }
    }

    fn manager(
        repo: MockUserRepository,
        publisher: MockEventPublisher,
        policy: DeliveryPolicy,
    ) -> IdentityManager {
        IdentityManager::new(
            Arc::new(repo),
            Arc::new(publisher),
            TokenService::new(&JwtConfig::new(SECRET, 2).unwrap()),
            policy,
            "http://localhost:8080/user/password",
        )
    }

    fn saving_repo() -> MockUserRepository {
        let mut repo = MockUserRepository::new();
        repo.expect_create().times(1).returning(|new_user| {
            Ok(User {
                id: 1,
                name: new_user.name,
                last_name: new_user.last_name,
                phone_number: new_user.phone_number,
                email: new_user.email,
                password_hash: new_user.password_hash,
                is_active: new_user.is_active,
                created_at: new_user.created_at,
            })
        });
        repo
    }

    #[tokio::test]
    async fn test_register_hashes_password_and_publishes() {
        let mut publisher = MockEventPublisher::new();
        publisher
            .expect_publish()
            .withf(|event| event.action == EventAction::Registered && event.user.id == 1)
            .times(1)
            .returning(|_| Ok(()));

        let service = manager(saving_repo(), publisher, DeliveryPolicy::Strict);
        let user = service.register(registration()).await.unwrap();

        assert_ne!(user.password_hash, "analytical");
        assert!(user.verify_password("analytical"));
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn test_register_publish_failure_is_reported_when_strict() {
        let mut publisher = MockEventPublisher::new();
        publisher
            .expect_publish()
            .times(1)
            .returning(|_| Err(AppError::publish("channel closed")));

        let service = manager(saving_repo(), publisher, DeliveryPolicy::Strict);
        let result = service.register(registration()).await;

        assert!(matches!(result, Err(AppError::Publish(_))));
        assert_eq!(service.dropped_events(), 0);
    }

    #[tokio::test]
    async fn test_register_publish_failure_is_counted_when_best_effort() {
        let mut publisher = MockEventPublisher::new();
        publisher
            .expect_publish()
            .times(1)
            .returning(|_| Err(AppError::publish("channel closed")));

        let service = manager(saving_repo(), publisher, DeliveryPolicy::BestEffort);
        let user = service.register(registration()).await.unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(service.dropped_events(), 1);
    }

    #[tokio::test]
    async fn test_register_conflict_publishes_nothing() {
        let mut repo = MockUserRepository::new();
        repo.expect_create()
            .returning(|_| Err(AppError::conflict("Email")));
        let mut publisher = MockEventPublisher::new();
        publisher.expect_publish().never();

        let service = manager(repo, publisher, DeliveryPolicy::Strict);
        let result = service.register(registration()).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_login_success_issues_verifiable_token() {
        let user = user_with_password(9, "ada@example.com", "analytical");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .with(eq("ada@example.com"))
            .returning(move |_| Ok(Some(user.clone())));
        let mut publisher = MockEventPublisher::new();
        publisher
            .expect_publish()
            .withf(|event| event.action == EventAction::Login)
            .times(1)
            .returning(|_| Ok(()));

        let service = manager(repo, publisher, DeliveryPolicy::Strict);
        let token = service.login("ada@example.com", "analytical").await.unwrap();

        let claims = service.verify_token(&token.access_token).unwrap();
        assert_eq!(claims.user_id, 9);
        assert_eq!(claims.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_login_wrong_password_issues_no_token() {
        let user = user_with_password(9, "ada@example.com", "analytical");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        let mut publisher = MockEventPublisher::new();
        publisher.expect_publish().never();

        let service = manager(repo, publisher, DeliveryPolicy::Strict);
        let result = service.login("ada@example.com", "wrong").await;

        assert!(matches!(result, Err(AppError::InvalidPassword)));
    }

    #[tokio::test]
    async fn test_login_unknown_email_is_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));
        let mut publisher = MockEventPublisher::new();
        publisher.expect_publish().never();

        let service = manager(repo, publisher, DeliveryPolicy::Strict);
        let result = service.login("ghost@example.com", "whatever").await;

        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_recover_password_returns_link_and_publishes() {
        let user = user_with_password(12, "ada@example.com", "analytical");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        let mut publisher = MockEventPublisher::new();
        publisher
            .expect_publish()
            .withf(|event| event.action == EventAction::RecoveryLink && event.user.id == 12)
            .times(1)
            .returning(|_| Ok(()));

        let service = manager(repo, publisher, DeliveryPolicy::Strict);
        let url = service.recover_password("ada@example.com").await.unwrap();

        assert_eq!(url, "http://localhost:8080/user/password/12");
    }

    #[tokio::test]
    async fn test_update_password_unknown_id_writes_nothing() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().with(eq(404)).returning(|_| Ok(None));
        repo.expect_update().never();
        let mut publisher = MockEventPublisher::new();
        publisher.expect_publish().never();

        let service = manager(repo, publisher, DeliveryPolicy::Strict);
        let result = service.update_password(404, "newpw").await;

        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_password_replaces_hash_only() {
        let user = user_with_password(3, "ada@example.com", "analytical");
        let updated = user.clone();
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_update()
            .withf(|id, changes| {
                *id == 3
                    && changes.name.is_none()
                    && changes.email.is_none()
                    && changes
                        .password_hash
                        .as_deref()
                        .is_some_and(|hash| Password::from_hash(hash).verify("newpw"))
            })
            .times(1)
            .returning(move |_, _| Ok(updated.clone()));
        let mut publisher = MockEventPublisher::new();
        publisher
            .expect_publish()
            .withf(|event| event.action == EventAction::PasswordUpdated)
            .times(1)
            .returning(|_| Ok(()));

        let service = manager(repo, publisher, DeliveryPolicy::Strict);
        service.update_password(3, "newpw").await.unwrap();
    }

    #[tokio::test]
    async fn test_update_profile_requires_current_password() {
        let user = user_with_password(3, "ada@example.com", "analytical");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_update().never();

        let service = manager(repo, MockEventPublisher::new(), DeliveryPolicy::Strict);
        let result = service
            .update_profile(ProfileUpdate {
                id: 3,
                name: Some("Augusta".to_string()),
                last_name: None,
                phone_number: None,
                email: None,
                current_password: "wrong".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::InvalidPassword)));
    }

    #[tokio::test]
    async fn test_update_profile_keeps_existing_hash() {
        let user = user_with_password(3, "ada@example.com", "analytical");
        let mut updated = user.clone();
        updated.name = "Augusta".to_string();
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_update()
            .withf(|id, changes| {
                *id == 3
                    && changes.name.as_deref() == Some("Augusta")
                    && changes.password_hash.is_none()
            })
            .times(1)
            .returning(move |_, _| Ok(updated.clone()));

        let service = manager(repo, MockEventPublisher::new(), DeliveryPolicy::Strict);
        let user = service
            .update_profile(ProfileUpdate {
                id: 3,
                name: Some("Augusta".to_string()),
                last_name: None,
                phone_number: None,
                email: None,
                current_password: "analytical".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(user.name, "Augusta");
        assert!(user.verify_password("analytical"));
    }

    #[tokio::test]
    async fn test_delete_rejects_email_of_another_account() {
        let other = user_with_password(8, "grace@example.com", "compiler");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(move |_| Ok(Some(other.clone())));
        repo.expect_delete().never();

        let service = manager(repo, MockEventPublisher::new(), DeliveryPolicy::Strict);
        let result = service.delete_user(3, "grace@example.com", "compiler").await;

        assert!(matches!(result, Err(AppError::InvalidEmail)));
    }

    #[tokio::test]
    async fn test_delete_with_wrong_password_keeps_record() {
        let user = user_with_password(3, "ada@example.com", "analytical");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_delete().never();

        let service = manager(repo, MockEventPublisher::new(), DeliveryPolicy::Strict);
        let result = service.delete_user(3, "ada@example.com", "wrong").await;

        assert!(matches!(result, Err(AppError::InvalidPassword)));
    }

    #[tokio::test]
    async fn test_delete_success() {
        let user = user_with_password(3, "ada@example.com", "analytical");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_delete().with(eq(3)).times(1).returning(|_| Ok(()));

        let service = manager(repo, MockEventPublisher::new(), DeliveryPolicy::Strict);
        assert!(service.delete_user(3, "ada@example.com", "analytical").await.is_ok());
    }

    #[tokio::test]
    async fn test_get_missing_user_is_none() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let service = manager(repo, MockEventPublisher::new(), DeliveryPolicy::Strict);
        assert!(service.get_user(77).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_health_reports_directory_failure() {
        let mut repo = MockUserRepository::new();
        repo.expect_ping()
            .returning(|| Err(AppError::internal("pool exhausted")));

        let service = manager(repo, MockEventPublisher::new(), DeliveryPolicy::Strict);
        assert!(service.check_health().await.is_err());
    }
}
