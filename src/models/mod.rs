pub mod forum;
pub mod forum_participant;
pub mod user;

pub use forum::{Entity as Forum, ForumStatus, Model as ForumModel};
pub use forum_participant::{
    Entity as ForumParticipant, Model as ForumParticipantModel, ParticipantStatus,
};
pub use user::{Entity as User, Model as UserModel};
