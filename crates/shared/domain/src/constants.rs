//! Domain-level constants.
//!
//! Business rules and defaults shared across the workspace.

// =============================================================================
// Authentication
// =============================================================================

/// Token lifetime in hours
pub const DEFAULT_JWT_EXPIRATION_HOURS: i64 = 2;

/// Minimum JWT secret length (security requirement)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Seconds per hour (for token expiration calculation)
pub const SECONDS_PER_HOUR: i64 = 3600;

/// Authorization header prefix for Bearer tokens
pub const BEARER_TOKEN_PREFIX: &str = "Bearer ";

/// JWT token type identifier
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

// =============================================================================
// Pagination
// =============================================================================

/// Page size used when the requested one is out of range
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest page size a caller may request
pub const MAX_PAGE_SIZE: u64 = 100;

/// First page (1-indexed)
pub const DEFAULT_PAGE_NUMBER: u64 = 1;

// =============================================================================
// Events
// =============================================================================

/// Default topic exchange for identity events
pub const DEFAULT_EVENTS_EXCHANGE: &str = "user.events";

/// Broker connection attempts before startup is abandoned
pub const DEFAULT_BROKER_CONNECT_ATTEMPTS: u32 = 10;

/// Fixed delay between broker connection attempts
pub const DEFAULT_BROKER_RETRY_DELAY_SECONDS: u64 = 3;
