pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;

pub use domain::auth::errors::AuthError;
pub use domain::auth::ports::AuthServicePort;
pub use domain::auth::service::AuthService;
pub use domain::user;
pub use outbound::repositories;
