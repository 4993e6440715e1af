//! Registration, login and password handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{patch, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use common::AppResult;
use domain::{Registration, UserResponse};

use super::MessageResponse;
use crate::http::extractors::ValidatedJson;
use crate::http::state::AppState;
use crate::service::TokenResponse;

/// User registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    /// First name
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Ada")]
    pub name: String,
    /// Last name
    #[validate(length(min = 1, message = "Last name is required"))]
    #[schema(example = "Lovelace")]
    pub last_name: String,
    /// Phone number
    #[serde(default)]
    #[schema(example = "555-0100")]
    pub phone: String,
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// User password (minimum 6 characters)
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[schema(example = "analytical", min_length = 6)]
    pub password: String,
}

/// User login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// User password
    #[schema(example = "analytical")]
    pub password: String,
}

/// Password recovery request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecoverPasswordRequest {
    /// Email of the account to recover
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "ada@example.com")]
    pub email: String,
}

/// New password for an account
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePasswordRequest {
    /// Replacement password (minimum 6 characters)
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[schema(example = "difference-engine", min_length = 6)]
    pub password: String,
}

/// Create registration, login and password routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/user", post(register))
        .route("/auth/login", post(login))
        .route("/user/password", patch(recover_password))
        .route("/user/password/:id", put(update_password))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/user",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .service
        .register(Registration {
            name: payload.name,
            last_name: payload.last_name,
            phone_number: payload.phone,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Login and get JWT token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid password"),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = state
        .service
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(token))
}

/// Send a password recovery link
#[utoipa::path(
    patch,
    path = "/user/password",
    tag = "Authentication",
    request_body = RecoverPasswordRequest,
    responses(
        (status = 200, description = "Recovery link sent", body = MessageResponse),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn recover_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RecoverPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.service.recover_password(&payload.email).await?;

    Ok(Json(MessageResponse::new("Password recovery link sent")))
}

/// Set a new password for the account
#[utoipa::path(
    put,
    path = "/user/password/{id}",
    tag = "Authentication",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_password(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdatePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.service.update_password(id, &payload.password).await?;

    Ok(Json(MessageResponse::new("Password updated successfully")))
}
