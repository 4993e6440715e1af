//! Domain events published when user state changes.
//!
//! Each event carries a snapshot of the user's public attributes. The
//! snapshot type has no password field, so no serialized event can leak one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::User;

/// Fixed vocabulary of identity events. The serialized name doubles as the
/// routing key on the topic exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventAction {
    #[serde(rename = "user.registered")]
    Registered,
    #[serde(rename = "user.login")]
    Login,
    #[serde(rename = "user.recovery.link")]
    RecoveryLink,
    #[serde(rename = "user.password.updated")]
    PasswordUpdated,
}

impl EventAction {
    /// All actions, in declaration order
    pub const ALL: [EventAction; 4] = [
        EventAction::Registered,
        EventAction::Login,
        EventAction::RecoveryLink,
        EventAction::PasswordUpdated,
    ];

    /// Routing key used when publishing this action
    pub fn routing_key(&self) -> &'static str {
        match self {
            EventAction::Registered => "user.registered",
            EventAction::Login => "user.login",
            EventAction::RecoveryLink => "user.recovery.link",
            EventAction::PasswordUpdated => "user.password.updated",
        }
    }
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.routing_key())
    }
}

/// Public attributes of the affected user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub id: i64,
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl From<&User> for UserSnapshot {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone_number.clone(),
        }
    }
}

/// Notification describing one state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub action: EventAction,
    pub user: UserSnapshot,
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    /// Create an event stamped with the current instant
    pub fn new(action: EventAction, user: &User) -> Self {
        Self::at(action, user, Utc::now())
    }

    /// Create an event stamped with the given instant
    pub fn at(action: EventAction, user: &User, timestamp: DateTime<Utc>) -> Self {
        Self {
            action,
            user: UserSnapshot::from(user),
            timestamp,
        }
    }

    /// Routing key for this event
    pub fn routing_key(&self) -> &'static str {
        self.action.routing_key()
    }
}
