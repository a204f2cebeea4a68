use crate::{
    error::{AppError, AppResult},
    models::{forum, Forum, ForumModel, ForumParticipantModel, UserModel},
    services::{participant, user::ActiveUserLookup},
    utils::{Clock, SystemClock},
};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QuerySelect,
    TransactionTrait,
};
use std::collections::HashSet;
use std::sync::Arc;

pub const MSG_NO_PARTICIPANTS: &str = "cannot create forum with 0 participants";

pub fn forum_not_found(id: i32) -> AppError {
    AppError::not_found(format!("forum with id of {id} not found"))
}

pub struct ForumService {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl ForumService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create a forum started by `initiator` and invite `participant_ids`.
    ///
    /// Every id is resolved through `users` before anything is written, and
    /// the forum plus all memberships are inserted in one transaction, so a
    /// failure leaves nothing behind.
    pub async fn create_forum<U: ActiveUserLookup>(
        &self,
        topic: &str,
        description: Option<String>,
        initiator: &UserModel,
        participant_ids: &[i32],
        users: &U,
    ) -> AppResult<ForumModel> {
        forum::check_topic(topic)?;
        if participant_ids.is_empty() {
            return Err(AppError::validation(MSG_NO_PARTICIPANTS));
        }

        let mut seen = HashSet::from([initiator.id]);
        let mut invitees = Vec::with_capacity(participant_ids.len());
        for &id in participant_ids {
            let user = users.get_active_user(id).await?;
            if !seen.insert(user.id) {
                return Err(AppError::Conflict(format!(
                    "user with id of {id} is already a participant of this forum"
                )));
            }
            invitees.push(user);
        }

        let now = self.clock.now();
        let txn = self.db.begin().await?;

        let forum = forum::ActiveModel::open(topic, description, now)
            .insert(&txn)
            .await?;
        participant::create_participant(&txn, forum.id, initiator.id, true, now).await?;
        for user in &invitees {
            participant::create_participant(&txn, forum.id, user.id, false, now).await?;
        }

        txn.commit().await?;

        tracing::info!(
            forum_id = forum.id,
            initiator_id = initiator.id,
            invited = invitees.len(),
            "forum created"
        );
        Ok(forum)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<ForumModel> {
        Forum::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| forum_not_found(id))
    }

    /// Guard used before any membership or status change.
    pub async fn check_forum_is_closed(&self, forum_id: i32) -> AppResult<()> {
        self.get_by_id(forum_id).await?.check_forum_is_closed()
    }

    /// Invite `user` into an open forum. The new member is waiting.
    pub async fn add_participant(
        &self,
        forum_id: i32,
        user: &UserModel,
    ) -> AppResult<ForumParticipantModel> {
        let txn = self.db.begin().await?;

        let forum = lock_forum(&txn, forum_id).await?;
        forum.check_forum_is_closed()?;
        let participant =
            participant::create_participant(&txn, forum.id, user.id, false, self.clock.now())
                .await?;

        txn.commit().await?;

        tracing::info!(forum_id, user_id = user.id, "participant added");
        Ok(participant)
    }

    /// Close an open forum. Only its initiator may do this.
    pub async fn close_by(&self, forum_id: i32, requester_id: i32) -> AppResult<ForumModel> {
        let txn = self.db.begin().await?;

        let forum = lock_forum(&txn, forum_id).await?;
        forum.check_forum_is_closed()?;
        let initiator = participant::get_initiator(&txn, forum.id).await?;
        let closed = forum
            .close_by(requester_id, initiator.id, self.clock.now())?
            .update(&txn)
            .await?;

        txn.commit().await?;

        tracing::info!(forum_id, requester_id, "forum closed");
        Ok(closed)
    }

    pub async fn get_initiator(&self, forum_id: i32) -> AppResult<UserModel> {
        participant::get_initiator(&self.db, forum_id).await
    }

    /// All membership records, most recently created first.
    pub async fn get_participants(&self, forum_id: i32) -> AppResult<Vec<ForumParticipantModel>> {
        self.get_by_id(forum_id).await?;
        participant::list_participants(&self.db, forum_id).await
    }

    /// Membership records joined with their users, most recently created first.
    pub async fn get_participants_with_users(
        &self,
        forum_id: i32,
    ) -> AppResult<Vec<(ForumParticipantModel, UserModel)>> {
        self.get_by_id(forum_id).await?;
        participant::list_participants_with_users(&self.db, forum_id).await
    }

    /// Users of all participants, in the same order as [`Self::get_participants`].
    pub async fn get_participant_users(&self, forum_id: i32) -> AppResult<Vec<UserModel>> {
        let rows = self.get_participants_with_users(forum_id).await?;
        Ok(rows.into_iter().map(|(_, user)| user).collect())
    }
}

/// Load the forum row and hold it for the rest of the transaction so a
/// concurrent close cannot interleave with the open check.
async fn lock_forum<C: ConnectionTrait>(conn: &C, forum_id: i32) -> AppResult<ForumModel> {
    Forum::find_by_id(forum_id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| forum_not_found(forum_id))
}
