use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::auth::AuthService;
use crate::utils::TokenPair;
use axum::{response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Full name; the first word becomes the first name
    #[validate(length(min = 1, max = 300))]
    pub name: String,
    /// Username (1-150 characters)
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    /// Password
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    /// Refresh token from login
    pub refresh: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    /// New access token
    pub access: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthUserResponse {
    pub id: i32,
    pub name: String,
    pub username: String,
    /// Last successful login
    pub last_login: Option<String>,
    /// Only present on login
    pub token: Option<TokenPair>,
}

impl AuthUserResponse {
    fn new(user: UserModel, token: Option<TokenPair>) -> Self {
        Self {
            id: user.id,
            name: user.name(),
            username: user.username,
            last_login: user.last_login.map(|t| t.to_string()),
            token,
        }
    }
}

impl From<UserModel> for AuthUserResponse {
    fn from(user: UserModel) -> Self {
        Self::new(user, None)
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered"),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "Username already exists", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    service
        .register(&payload.name, &payload.username, &payload.password)
        .await?;

    Ok(ApiResponse::<()>::message("success").created())
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthUserResponse),
        (status = 404, description = "Unknown user or wrong password", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    let (user, tokens) = service.login(&payload.username, &payload.password).await?;

    Ok(ApiResponse::ok(AuthUserResponse::new(user, Some(tokens))))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Invalid or expired refresh token", body = AppError),
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let access = service.refresh(&payload.refresh).await?;
    Ok(ApiResponse::ok(RefreshResponse { access }))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current user", body = AuthUserResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let user = service.get_user_by_id(auth_user.user_id).await?;
    Ok(ApiResponse::ok(AuthUserResponse::from(user)))
}
