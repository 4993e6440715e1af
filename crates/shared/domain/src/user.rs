//! User domain entity and related types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::password::Password;

/// User domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Assigned by the directory on save, never changed afterwards
    pub id: i64,
    pub name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: NaiveDate,
}

impl User {
    /// Stored credential as a password value object
    pub fn password(&self) -> Password {
        Password::from_hash(self.password_hash.as_str())
    }

    /// Check a plain text password against the stored hash
    pub fn verify_password(&self, plain_text: &str) -> bool {
        self.password().verify(plain_text)
    }
}

/// A user ready to be saved; the directory assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: NaiveDate,
}

impl NewUser {
    /// Build an active user from registration data and an already hashed password.
    pub fn new(registration: Registration, password: Password, created_at: NaiveDate) -> Self {
        Self {
            name: registration.name,
            last_name: registration.last_name,
            phone_number: registration.phone_number,
            email: registration.email,
            password_hash: password.into_string(),
            is_active: true,
            created_at,
        }
    }
}

/// Partial update applied by id. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    /// Changes that only replace the password hash
    pub fn password(password: Password) -> Self {
        Self {
            password_hash: Some(password.into_string()),
            ..Self::default()
        }
    }

    /// True when applying these changes would not modify anything
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Registration input. `password` is plain text and must be hashed before it
/// goes anywhere else.
#[derive(Clone)]
pub struct Registration {
    pub name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub password: String,
}

/// Profile update input, authorized by re-submitting the current password.
#[derive(Clone)]
pub struct ProfileUpdate {
    pub id: i64,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub current_password: String,
}

impl ProfileUpdate {
    /// Directory changes for this update. The password hash is never part of them.
    pub fn changes(&self) -> UserChanges {
        UserChanges {
            name: self.name.clone(),
            last_name: self.last_name.clone(),
            phone_number: self.phone_number.clone(),
            email: self.email.clone(),
            password_hash: None,
        }
    }
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// Unique user identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Last name
    pub last_name: String,
    /// Phone number
    pub phone: String,
    /// Email address
    pub email: String,
    /// Whether the account is active
    pub is_active: bool,
    /// Registration date
    pub created_at: NaiveDate,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            last_name: user.last_name,
            phone: user.phone_number,
            email: user.email,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse::from(user.clone())
    }
}
