pub mod auth;
pub mod auth_session;
pub mod conversation;
pub mod message;
pub mod report;
pub mod typing;
pub mod user;
