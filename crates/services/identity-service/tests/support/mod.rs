//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use common::{AppError, AppResult, JwtConfig};
use domain::{
    DomainEvent, NewUser, PageQuery, Paginated, Password, SortDirection, User, UserChanges,
};
use identity_service_lib::events::{DeliveryPolicy, EventPublisher};
use identity_service_lib::repository::UserRepository;
use identity_service_lib::service::{IdentityManager, TokenService};

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-chars";
pub const RECOVERY_BASE_URL: &str = "http://localhost:8080/user/password";

/// Directory kept in a vector, enforcing unique emails like the database.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: Mutex<Vec<User>>,
    next_id: Mutex<i64>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn get(&self, id: i64) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
    }

    fn matches(user: &User, term: &str) -> bool {
        let term = term.to_lowercase();
        user.name.to_lowercase().contains(&term) || user.email.to_lowercase().contains(&term)
    }
}

#[async_trait]
impl UserRepository for InMemoryDirectory {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::conflict("Email"));
        }

        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;

        let user = User {
            id: *next_id,
            name: user.name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            email: user.email,
            password_hash: user.password_hash,
            is_active: user.is_active,
            created_at: user.created_at,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.get(id))
    }

    async fn update(&self, id: i64, changes: UserChanges) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();

        if let Some(email) = &changes.email {
            if users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(AppError::conflict("Email"));
            }
        }

        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AppError::NotFound)?;

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(phone_number) = changes.phone_number {
            user.phone_number = phone_number;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }

        Ok(user.clone())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);

        if users.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn search(&self, term: &str) -> AppResult<Vec<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| Self::matches(u, term.trim()))
            .cloned()
            .collect())
    }

    async fn paginate(&self, query: &PageQuery) -> AppResult<Paginated<User>> {
        let mut matching: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| query.is_unfiltered() || Self::matches(u, &query.name))
            .cloned()
            .collect();

        matching.sort_by_key(|u| (u.created_at, u.id));
        if query.sort == SortDirection::Desc {
            matching.reverse();
        }

        let total = matching.len() as u64;
        let data = match query.offset() {
            Some(offset) if offset < total => matching
                .into_iter()
                .skip(offset as usize)
                .take(query.limit as usize)
                .collect(),
            _ => Vec::new(),
        };

        Ok(Paginated::new(data, query.page, query.limit, total))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Publisher that keeps every event it is given.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn routing_keys(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.routing_key()).collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &DomainEvent) -> AppResult<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Service wired to in-memory collaborators.
pub struct Harness {
    pub directory: Arc<InMemoryDirectory>,
    pub publisher: Arc<RecordingPublisher>,
    pub service: Arc<IdentityManager>,
}

impl Harness {
    pub fn new() -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        let publisher = Arc::new(RecordingPublisher::default());
        let service = Arc::new(IdentityManager::new(
            directory.clone(),
            publisher.clone(),
            token_service(),
            DeliveryPolicy::Strict,
            RECOVERY_BASE_URL,
        ));

        Self {
            directory,
            publisher,
            service,
        }
    }

    /// Insert users directly, bypassing registration. All share one hash.
    pub async fn seed(&self, count: usize, password: &str) -> Vec<User> {
        let hash = Password::new(password).unwrap().into_string();
        let mut users = Vec::with_capacity(count);

        for i in 0..count {
            let created_at = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                + chrono::Duration::days(i as i64);
            let user = self
                .directory
                .create(NewUser {
                    name: format!("User{:02}", i),
                    last_name: "Seed".to_string(),
                    phone_number: format!("555-01{:02}", i),
                    email: format!("user{:02}@example.com", i),
                    password_hash: hash.clone(),
                    is_active: true,
                    created_at,
                })
                .await
                .unwrap();
            users.push(user);
        }

        users
    }
}

pub fn token_service() -> TokenService {
    TokenService::new(&JwtConfig::new(JWT_SECRET, 2).unwrap())
}
