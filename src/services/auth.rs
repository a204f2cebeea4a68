use crate::{
    config::auth::AuthConfig,
    error::{AppError, AppResult},
    models::{user, User, UserModel},
    utils::{
        encode_access_token, encode_token_pair, hash_password,
        jwt::{decode_jwt, TokenType},
        verify_password, TokenPair,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

const MSG_USERNAME_TAKEN: &str = "Username already exists";

// Same answer for "no such user", "inactive" and "wrong password".
const MSG_LOGIN_FAILED: &str = "Not found.";

pub struct AuthService {
    db: DatabaseConnection,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            config: AuthConfig::from_env(),
        }
    }

    pub fn with_config(mut self, config: AuthConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a new, active user.
    pub async fn register(&self, name: &str, username: &str, password: &str) -> AppResult<UserModel> {
        if self.username_taken(username).await? {
            return Err(AppError::Conflict(MSG_USERNAME_TAKEN.to_string()));
        }

        let password_hash = hash_password(password, self.config.bcrypt_cost)?;
        let now = chrono::Utc::now().naive_utc();

        let mut new_user = user::ActiveModel {
            username: sea_orm::ActiveValue::Set(username.to_string()),
            password_hash: sea_orm::ActiveValue::Set(password_hash),
            is_active: sea_orm::ActiveValue::Set(true),
            last_login: sea_orm::ActiveValue::Set(None),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };
        new_user.set_name(name);

        // A concurrent registration can still win the race to the unique index
        let user = new_user
            .insert(&self.db)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, MSG_USERNAME_TAKEN))?;
        tracing::info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Check credentials of an active user, stamp `last_login` and issue tokens.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(UserModel, TokenPair)> {
        let user = User::find()
            .filter(user::Column::Username.eq(username))
            .filter(user::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found(MSG_LOGIN_FAILED))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::not_found(MSG_LOGIN_FAILED));
        }

        let tokens = encode_token_pair(user.id)?;

        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = user.into();
        active.last_login = sea_orm::ActiveValue::Set(Some(now));
        active.updated_at = sea_orm::ActiveValue::Set(now);
        let user = active.update(&self.db).await?;

        tracing::debug!(user_id = user.id, "user logged in");
        Ok((user, tokens))
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<String> {
        let claims = decode_jwt(refresh_token).map_err(|_| AppError::Unauthorized)?;
        if claims.token_type != TokenType::Refresh {
            return Err(AppError::Unauthorized);
        }
        let user_id = claims.user_id().ok_or(AppError::Unauthorized)?;

        let user = self.get_user_by_id(user_id).await.map_err(|_| AppError::Unauthorized)?;
        if !user.is_active {
            return Err(AppError::Unauthorized);
        }

        Ok(encode_access_token(user.id)?)
    }

    pub async fn get_user_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| crate::services::user::user_not_found(id))
    }

    async fn username_taken(&self, username: &str) -> AppResult<bool> {
        let count = User::find()
            .filter(user::Column::Username.eq(username))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}
