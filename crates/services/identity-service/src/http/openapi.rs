//! OpenAPI documentation.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::http::handlers::auth_handler::{
    LoginRequest, RecoverPasswordRequest, RegisterRequest, UpdatePasswordRequest,
};
use crate::http::handlers::health_handler::{HealthResponse, ServiceHealth, ServiceStatus};
use crate::http::handlers::user_handler::{DeleteUserRequest, UpdateProfileRequest};
use crate::http::handlers::MessageResponse;
use crate::service::TokenResponse;
use domain::{SortDirection, UserResponse};

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::http::handlers::auth_handler::register,
        crate::http::handlers::auth_handler::login,
        crate::http::handlers::auth_handler::recover_password,
        crate::http::handlers::auth_handler::update_password,
        crate::http::handlers::user_handler::get_user,
        crate::http::handlers::user_handler::update_profile,
        crate::http::handlers::user_handler::delete_user,
        crate::http::handlers::user_handler::list_users,
        crate::http::handlers::user_handler::search_users,
        crate::http::handlers::user_handler::paginate_users,
        crate::http::handlers::health_handler::health_check,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            RecoverPasswordRequest,
            UpdatePasswordRequest,
            UpdateProfileRequest,
            DeleteUserRequest,
            TokenResponse,
            UserResponse,
            MessageResponse,
            SortDirection,
            HealthResponse,
            ServiceStatus,
            ServiceHealth,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and password endpoints"),
        (name = "Users", description = "User directory endpoints"),
        (name = "Health", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
