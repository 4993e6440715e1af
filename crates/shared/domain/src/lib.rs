//! Domain layer - Core identity entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.

pub mod constants;
pub mod error;
pub mod event;
pub mod pagination;
pub mod password;
pub mod user;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use event::{DomainEvent, EventAction, UserSnapshot};
pub use pagination::{PageQuery, Paginated, SortDirection};
pub use password::Password;
pub use user::{NewUser, ProfileUpdate, Registration, User, UserChanges, UserResponse};
