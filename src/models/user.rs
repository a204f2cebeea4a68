use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub first_name: String,
    pub last_name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub last_login: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::forum_participant::Entity")]
    Participants,
}

impl Related<super::forum_participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Display name: "first last", or just the first name.
    pub fn name(&self) -> String {
        match self.last_name.as_deref() {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

impl ActiveModel {
    pub fn set_name(&mut self, name: &str) {
        let (first_name, last_name) = split_name(name);
        self.first_name = sea_orm::ActiveValue::Set(first_name);
        self.last_name = sea_orm::ActiveValue::Set(last_name);
    }
}

/// Split a full name on single spaces: the first word is the first name and
/// the rest, rejoined with single spaces, is the last name.
pub fn split_name(name: &str) -> (String, Option<String>) {
    let mut words = name.split(' ');
    let first_name = words.next().unwrap_or_default().to_string();
    let rest: Vec<&str> = words.collect();
    let last_name = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };
    (first_name, last_name)
}
