use crate::{
    error::{AppError, AppResult},
    models::{user, User, UserModel},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::future::Future;

/// Resolves a user id to an active user.
///
/// Forum creation and invitation go through this instead of querying the
/// users table directly, so callers can substitute their own directory.
pub trait ActiveUserLookup: Sync {
    fn get_active_user(&self, id: i32) -> impl Future<Output = AppResult<UserModel>> + Send;
}

pub fn user_not_found(id: i32) -> AppError {
    AppError::not_found(format!("user with id of {id} not found"))
}

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_username(&self, username: &str) -> AppResult<UserModel> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user {username} not found")))
    }

    /// Deactivate an account. The row stays so memberships keep their user.
    pub async fn inactivate(&self, user_id: i32) -> AppResult<UserModel> {
        let existing = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| user_not_found(user_id))?;

        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = existing.into();
        active.is_active = sea_orm::ActiveValue::Set(false);
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        tracing::info!(user_id, "user inactivated");
        Ok(updated)
    }
}

impl ActiveUserLookup for UserService {
    async fn get_active_user(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .filter(user::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or_else(|| user_not_found(id))
    }
}
