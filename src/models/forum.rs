use crate::error::{AppError, AppResult};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Longest accepted topic, in characters.
pub const TOPIC_MAX_LEN: u64 = 100;

pub const MSG_TOPIC_EMPTY: &str = "topic must not be empty";

pub const MSG_FORUM_CLOSED: &str = "forum already closed";
pub const MSG_ONLY_INITIATOR_CAN_CLOSE: &str = "only initiator user can close this forum";

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(rename_all = "lowercase")]
pub enum ForumStatus {
    #[sea_orm(num_value = 1)]
    Open,
    #[sea_orm(num_value = 2)]
    Closed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "forums")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub topic: String,
    // Lower-casing can lengthen non-ASCII text, so this column is unbounded.
    #[serde(skip_serializing)]
    #[sea_orm(column_type = "Text")]
    pub topic_lowercase: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub status: ForumStatus,
    pub closed_at: Option<DateTime>,
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

/// Reject blank topics and topics longer than [`TOPIC_MAX_LEN`] characters.
pub fn check_topic(topic: &str) -> AppResult<()> {
    if topic.trim().is_empty() {
        return Err(AppError::validation(MSG_TOPIC_EMPTY));
    }
    if topic.chars().count() as u64 > TOPIC_MAX_LEN {
        return Err(AppError::validation(format!(
            "topic must be at most {TOPIC_MAX_LEN} characters"
        )));
    }
    Ok(())
}

impl Model {
    pub fn is_closed(&self) -> bool {
        self.status == ForumStatus::Closed
    }

    pub fn check_forum_is_closed(&self) -> AppResult<()> {
        if self.is_closed() {
            return Err(AppError::validation(MSG_FORUM_CLOSED));
        }
        Ok(())
    }

    /// Compute the closed state of this forum on behalf of `requester_id`.
    ///
    /// The forum must still be open and the requester must be the initiator.
    /// Nothing is written; the caller persists the returned active model.
    pub fn close_by(
        &self,
        requester_id: i32,
        initiator_id: i32,
        now: DateTime,
    ) -> AppResult<ActiveModel> {
        self.check_forum_is_closed()?;
        if requester_id != initiator_id {
            return Err(AppError::validation(MSG_ONLY_INITIATOR_CAN_CLOSE));
        }

        let mut active: ActiveModel = self.clone().into();
        active.status = Set(ForumStatus::Closed);
        active.closed_at = Set(Some(now));
        active.updated_at = Set(now);
        Ok(active)
    }
}

impl ActiveModel {
    /// A new, open forum with no id yet.
    pub fn open(topic: &str, description: Option<String>, now: DateTime) -> Self {
        let mut forum = Self {
            description: Set(description),
            status: Set(ForumStatus::Open),
            closed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        forum.set_topic(topic);
        forum
    }

    pub fn set_topic(&mut self, name: &str) {
        self.topic = Set(name.to_string());
        self.topic_lowercase = Set(name.to_lowercase());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveValue;

    fn at(h: u32) -> DateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn open_forum() -> Model {
        Model {
            id: 1,
            topic: "Testing Topic".to_string(),
            topic_lowercase: "testing topic".to_string(),
            description: Some("d".to_string()),
            status: ForumStatus::Open,
            closed_at: None,
            created_at: at(1),
            updated_at: at(1),
        }
    }

    #[test]
    fn topic_length_is_counted_in_characters() {
        assert!(check_topic(&"x".repeat(100)).is_ok());
        assert!(check_topic(&"é".repeat(100)).is_ok());
        assert!(matches!(
            check_topic(&"x".repeat(101)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn blank_topic_is_rejected() {
        let err = check_topic("   ").unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == MSG_TOPIC_EMPTY));
    }

    #[test]
    fn set_topic_keeps_lowercase_mirror() {
        let mut forum = <ActiveModel as Default>::default();
        forum.set_topic("Testing Topic");
        assert_eq!(forum.topic, Set("Testing Topic".to_string()));
        assert_eq!(forum.topic_lowercase, Set("testing topic".to_string()));
    }

    #[test]
    fn set_topic_on_already_lowercase_is_identity() {
        let mut forum = <ActiveModel as Default>::default();
        forum.set_topic("rust 2024!");
        assert_eq!(forum.topic_lowercase, Set("rust 2024!".to_string()));
    }

    #[test]
    fn new_forum_is_open_without_closed_at() {
        let forum = ActiveModel::open("General", None, at(2));
        assert_eq!(forum.status, Set(ForumStatus::Open));
        assert_eq!(forum.closed_at, Set(None));
        assert_eq!(forum.topic_lowercase, Set("general".to_string()));
        assert!(matches!(forum.id, ActiveValue::NotSet));
    }

    #[test]
    fn open_forum_passes_guard() {
        assert!(open_forum().check_forum_is_closed().is_ok());
    }

    #[test]
    fn closed_forum_fails_guard() {
        let mut forum = open_forum();
        forum.status = ForumStatus::Closed;
        forum.closed_at = Some(at(2));

        let err = forum.check_forum_is_closed().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == MSG_FORUM_CLOSED));
    }

    #[test]
    fn initiator_closes_open_forum() {
        let active = open_forum().close_by(7, 7, at(3)).unwrap();
        assert_eq!(active.status, Set(ForumStatus::Closed));
        assert_eq!(active.closed_at, Set(Some(at(3))));
        // untouched columns stay unchanged so only the transition is written
        assert!(matches!(active.topic, ActiveValue::Unchanged(_)));
        assert!(matches!(active.created_at, ActiveValue::Unchanged(_)));
    }

    #[test]
    fn non_initiator_cannot_close() {
        let err = open_forum().close_by(8, 7, at(3)).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == MSG_ONLY_INITIATOR_CAN_CLOSE));
    }

    #[test]
    fn closed_check_runs_before_initiator_check() {
        let mut forum = open_forum();
        forum.status = ForumStatus::Closed;
        forum.closed_at = Some(at(2));

        let err = forum.close_by(8, 7, at(3)).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == MSG_FORUM_CLOSED));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(ForumStatus::Closed).unwrap(), "closed");
    }
}
