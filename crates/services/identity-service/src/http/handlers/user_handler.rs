//! User directory handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use common::{AppResult, OptionExt};
use domain::{PageQuery, Paginated, ProfileUpdate, SortDirection, UserResponse};

use super::MessageResponse;
use crate::http::extractors::ValidatedJson;
use crate::http::middleware::CurrentUser;
use crate::http::state::AppState;

/// Profile update request. Omitted fields keep their value.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    /// New first name
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    #[schema(example = "Augusta")]
    pub name: Option<String>,
    /// New last name
    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,
    /// New phone number
    pub phone: Option<String>,
    /// New email address
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    /// Current password, required to authorize the change
    #[schema(example = "analytical")]
    pub password: String,
}

/// Account deletion request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeleteUserRequest {
    /// Email of the authenticated account
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Current password
    pub password: String,
}

/// Search query
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Substring of the name or email, case-insensitive
    #[serde(default)]
    pub q: String,
}

/// Page query. Out-of-range or unparsable values fall back to defaults.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Name or email filter
    pub name: Option<String>,
    /// 1-based page number
    pub page: Option<String>,
    /// Page size, 1 to 100
    pub limit: Option<String>,
    /// `asc` or `desc` on creation date
    pub sort: Option<String>,
}

impl PaginationParams {
    fn into_query(self) -> PageQuery {
        let parse = |value: Option<String>| {
            value
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(0)
        };
        let sort = self
            .sort
            .and_then(|s| s.parse::<SortDirection>().ok())
            .unwrap_or_default();

        PageQuery::new(
            self.name.unwrap_or_default(),
            parse(self.page),
            parse(self.limit),
            sort,
        )
    }
}

/// Create public directory routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/search", get(search_users))
        .route("/users/paginated", get(paginate_users))
}

/// Create routes that act on the authenticated account
pub fn protected_user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/:id", get(get_user))
        .route("/user", put(update_profile).delete(delete_user))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/user/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<UserResponse>> {
    let user = state.service.get_user(id).await?.ok_or_not_found()?;
    Ok(Json(UserResponse::from(user)))
}

/// Update the authenticated user's profile
#[utoipa::path(
    put,
    path = "/user",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized or wrong password"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn update_profile(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .service
        .update_profile(ProfileUpdate {
            id: current_user.id,
            name: payload.name,
            last_name: payload.last_name,
            phone_number: payload.phone,
            email: payload.email,
            current_password: payload.password,
        })
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Delete the authenticated user's account
#[utoipa::path(
    delete,
    path = "/user",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = DeleteUserRequest,
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized, wrong email or wrong password"),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn delete_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<DeleteUserRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .service
        .delete_user(current_user.id, &payload.email, &payload.password)
        .await?;

    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.service.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Search users by name or email
#[utoipa::path(
    get,
    path = "/users/search",
    tag = "Users",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching users", body = Vec<UserResponse>)
    )
)]
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.service.search_users(&params.q).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// One page of users ordered by creation date
#[utoipa::path(
    get,
    path = "/users/paginated",
    tag = "Users",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of users with totals")
    )
)]
pub async fn paginate_users(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<UserResponse>>> {
    let page = state.service.paginate_users(params.into_query()).await?;
    Ok(Json(page.map(UserResponse::from)))
}
