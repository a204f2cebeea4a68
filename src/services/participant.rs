use crate::{
    error::{AppError, AppResult},
    models::{forum_participant, ForumParticipant, ForumParticipantModel, User, UserModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};

pub const MSG_INITIATOR_NOT_FOUND: &str = "initiator not found";

/// Insert a membership row. An initiator is always stored as accepted.
pub async fn create_participant<C: ConnectionTrait>(
    conn: &C,
    forum_id: i32,
    user_id: i32,
    initiator: bool,
    now: chrono::NaiveDateTime,
) -> AppResult<ForumParticipantModel> {
    ensure_not_participant(conn, forum_id, user_id).await?;

    let participant = forum_participant::ActiveModel::membership(forum_id, user_id, initiator, now)
        .insert(conn)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, already_participant(user_id)))?;

    tracing::debug!(
        forum_id,
        user_id,
        initiator,
        participant_id = participant.id,
        "participant created"
    );
    Ok(participant)
}

/// The user who started the forum.
pub async fn get_initiator<C: ConnectionTrait>(conn: &C, forum_id: i32) -> AppResult<UserModel> {
    let participant = ForumParticipant::find()
        .filter(forum_participant::Column::ForumId.eq(forum_id))
        .filter(forum_participant::Column::Initiator.eq(true))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(MSG_INITIATOR_NOT_FOUND))?;

    participant
        .find_related(User)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(MSG_INITIATOR_NOT_FOUND))
}

/// Participants of a forum, most recently created first.
pub async fn list_participants<C: ConnectionTrait>(
    conn: &C,
    forum_id: i32,
) -> AppResult<Vec<ForumParticipantModel>> {
    let participants = ForumParticipant::find()
        .filter(forum_participant::Column::ForumId.eq(forum_id))
        .order_by_desc(forum_participant::Column::CreatedAt)
        .order_by_desc(forum_participant::Column::Id)
        .all(conn)
        .await?;
    Ok(participants)
}

/// Participants joined with their users, in the same order as
/// [`list_participants`].
pub async fn list_participants_with_users<C: ConnectionTrait>(
    conn: &C,
    forum_id: i32,
) -> AppResult<Vec<(ForumParticipantModel, UserModel)>> {
    let rows = ForumParticipant::find()
        .filter(forum_participant::Column::ForumId.eq(forum_id))
        .order_by_desc(forum_participant::Column::CreatedAt)
        .order_by_desc(forum_participant::Column::Id)
        .find_also_related(User)
        .all(conn)
        .await?;

    // user_id is a restricted foreign key, so the join always matches
    Ok(rows
        .into_iter()
        .filter_map(|(participant, user)| user.map(|u| (participant, u)))
        .collect())
}

async fn ensure_not_participant<C: ConnectionTrait>(
    conn: &C,
    forum_id: i32,
    user_id: i32,
) -> AppResult<()> {
    let existing = ForumParticipant::find()
        .filter(forum_participant::Column::ForumId.eq(forum_id))
        .filter(forum_participant::Column::UserId.eq(user_id))
        .count(conn)
        .await?;

    if existing > 0 {
        return Err(AppError::Conflict(already_participant(user_id)));
    }
    Ok(())
}

fn already_participant(user_id: i32) -> String {
    format!("user with id of {user_id} is already a participant of this forum")
}
