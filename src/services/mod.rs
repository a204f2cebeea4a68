pub mod auth;
pub mod forum;
pub mod participant;
pub mod user;
