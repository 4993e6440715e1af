//! Identity business logic.

mod identity_service;
mod token_service;

pub use identity_service::{IdentityManager, IdentityService};
pub use token_service::{Claims, TokenResponse, TokenService, VerifiedClaims};
