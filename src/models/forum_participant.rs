use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    #[sea_orm(num_value = 1)]
    Accept,
    // Not produced by any operation yet.
    #[sea_orm(num_value = 2)]
    Deny,
    #[sea_orm(num_value = 3)]
    Waiting,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "forum_participants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub forum_id: i32,
    pub user_id: i32,
    pub initiator: bool,
    pub status: ParticipantStatus,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::forum::Entity",
        from = "Column::ForumId",
        to = "super::forum::Column::Id",
        on_delete = "Restrict"
    )]
    Forum,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Restrict"
    )]
    User,
}

impl Related<super::forum::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Forum.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// A membership row for `user_id` in `forum_id`.
    ///
    /// The initiator is always accepted; everyone else starts out waiting.
    pub fn membership(forum_id: i32, user_id: i32, initiator: bool, now: DateTime) -> Self {
        let status = if initiator {
            ParticipantStatus::Accept
        } else {
            ParticipantStatus::Waiting
        };

        Self {
            forum_id: Set(forum_id),
            user_id: Set(user_id),
            initiator: Set(initiator),
            status: Set(status),
            created_at: Set(now),
            ..Default::default()
        }
    }
}
