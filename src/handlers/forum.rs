use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::forum::TOPIC_MAX_LEN;
use crate::models::{
    ForumModel, ForumParticipantModel, ForumStatus, ParticipantStatus, UserModel,
};
use crate::response::ApiResponse;
use crate::services::forum::ForumService;
use crate::services::user::{ActiveUserLookup, UserService};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateForumRequest {
    /// Forum topic (1-100 characters)
    #[validate(length(min = 1, max = TOPIC_MAX_LEN))]
    pub topic: String,
    /// Optional description
    pub description: Option<String>,
    /// Ids of the users to invite
    pub participants: Vec<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddParticipantRequest {
    /// Id of the user to invite
    pub user_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ForumResponse {
    pub id: i32,
    pub topic: String,
    pub description: Option<String>,
    pub status: ForumStatus,
    pub closed_at: Option<String>,
    pub created_at: String,
}

impl From<ForumModel> for ForumResponse {
    fn from(f: ForumModel) -> Self {
        Self {
            id: f.id,
            topic: f.topic,
            description: f.description,
            status: f.status,
            closed_at: f.closed_at.map(|t| t.to_string()),
            created_at: f.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub name: String,
}

impl From<UserModel> for UserSummary {
    fn from(u: UserModel) -> Self {
        Self {
            id: u.id,
            name: u.name(),
            username: u.username,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipantResponse {
    pub id: i32,
    pub forum_id: i32,
    pub user_id: i32,
    pub initiator: bool,
    pub status: ParticipantStatus,
    pub created_at: String,
    /// Present when listing a forum's participants
    pub user: Option<UserSummary>,
}

impl From<ForumParticipantModel> for ParticipantResponse {
    fn from(p: ForumParticipantModel) -> Self {
        Self {
            id: p.id,
            forum_id: p.forum_id,
            user_id: p.user_id,
            initiator: p.initiator,
            status: p.status,
            created_at: p.created_at.to_string(),
            user: None,
        }
    }
}

impl From<(ForumParticipantModel, UserModel)> for ParticipantResponse {
    fn from((p, u): (ForumParticipantModel, UserModel)) -> Self {
        Self {
            user: Some(UserSummary::from(u)),
            ..Self::from(p)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/forums",
    security(("jwt_token" = [])),
    request_body = CreateForumRequest,
    responses(
        (status = 201, description = "Forum created", body = ForumResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Participant not found", body = AppError),
        (status = 409, description = "Duplicate participant", body = AppError),
    ),
    tag = "forums"
)]
pub async fn create_forum(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateForumRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let users = UserService::new(db.clone());
    let initiator = users.get_active_user(auth_user.user_id).await?;

    let service = ForumService::new(db);
    let forum = service
        .create_forum(
            &payload.topic,
            payload.description,
            &initiator,
            &payload.participants,
            &users,
        )
        .await?;

    Ok(ApiResponse::ok(ForumResponse::from(forum)).created())
}

#[utoipa::path(
    get,
    path = "/api/v1/forums/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Forum id")),
    responses(
        (status = 200, description = "Forum details", body = ForumResponse),
        (status = 404, description = "Forum not found", body = AppError),
    ),
    tag = "forums"
)]
pub async fn get_forum(
    Extension(db): Extension<DatabaseConnection>,
    _auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ForumService::new(db);
    let forum = service.get_by_id(id).await?;
    Ok(ApiResponse::ok(ForumResponse::from(forum)))
}

#[utoipa::path(
    get,
    path = "/api/v1/forums/{id}/participants",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Forum id")),
    responses(
        (status = 200, description = "Participants, newest first", body = Vec<ParticipantResponse>),
        (status = 404, description = "Forum not found", body = AppError),
    ),
    tag = "forums"
)]
pub async fn list_participants(
    Extension(db): Extension<DatabaseConnection>,
    _auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ForumService::new(db);
    let participants: Vec<ParticipantResponse> = service
        .get_participants_with_users(id)
        .await?
        .into_iter()
        .map(ParticipantResponse::from)
        .collect();
    Ok(ApiResponse::ok(participants))
}

#[utoipa::path(
    get,
    path = "/api/v1/forums/{id}/users",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Forum id")),
    responses(
        (status = 200, description = "Users taking part, newest membership first", body = Vec<UserSummary>),
        (status = 404, description = "Forum not found", body = AppError),
    ),
    tag = "forums"
)]
pub async fn list_participant_users(
    Extension(db): Extension<DatabaseConnection>,
    _auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ForumService::new(db);
    let users: Vec<UserSummary> = service
        .get_participant_users(id)
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();
    Ok(ApiResponse::ok(users))
}

#[utoipa::path(
    post,
    path = "/api/v1/forums/{id}/participants",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Forum id")),
    request_body = AddParticipantRequest,
    responses(
        (status = 201, description = "Participant invited", body = ParticipantResponse),
        (status = 400, description = "Forum already closed", body = AppError),
        (status = 404, description = "Forum or user not found", body = AppError),
        (status = 409, description = "Already a participant", body = AppError),
    ),
    tag = "forums"
)]
pub async fn add_participant(
    Extension(db): Extension<DatabaseConnection>,
    _auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<AddParticipantRequest>,
) -> AppResult<impl IntoResponse> {
    let users = UserService::new(db.clone());
    let user = users.get_active_user(payload.user_id).await?;

    let service = ForumService::new(db);
    let participant = service.add_participant(id, &user).await?;

    Ok(ApiResponse::ok(ParticipantResponse::from((participant, user))).created())
}

#[utoipa::path(
    post,
    path = "/api/v1/forums/{id}/close",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Forum id")),
    responses(
        (status = 200, description = "Forum closed", body = ForumResponse),
        (status = 400, description = "Already closed or caller is not the initiator", body = AppError),
        (status = 404, description = "Forum or initiator not found", body = AppError),
    ),
    tag = "forums"
)]
pub async fn close_forum(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ForumService::new(db);
    let forum = service.close_by(id, auth_user.user_id).await?;
    Ok(ApiResponse::ok(ForumResponse::from(forum)))
}
