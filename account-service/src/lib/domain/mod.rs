pub mod auth;
pub mod reset;
pub mod revocation;
pub mod user;
