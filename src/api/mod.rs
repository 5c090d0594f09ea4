pub mod auth;
pub mod presence;
pub mod room;
pub mod user;
