pub mod auth;
pub mod forum;

pub use auth::*;
