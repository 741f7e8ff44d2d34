//! Authentication utilities library
//!
//! Provides the credential and token primitives of the account service:
//! - Password hashing (Argon2id)
//! - JWT signing and verification with an HS256-only allow-list
//! - Access/refresh token issuance with unique token ids
//! - An injectable clock, so expiry can be tested with simulated time
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Session Tokens
//! ```
//! use std::sync::Arc;
//!
//! use auth::{JwtHandler, SystemClock, TokenCodec, TokenKind};
//! use chrono::Duration;
//!
//! let handler = JwtHandler::new(b"secret_key_at_least_32_bytes_long!").unwrap();
//! let codec = TokenCodec::new(handler, Arc::new(SystemClock));
//!
//! let issued = codec.issue("user123", TokenKind::Access, Duration::hours(2)).unwrap();
//! let claims = codec.parse(&issued.token).unwrap();
//! assert_eq!(claims.sub, "user123");
//! assert_eq!(claims.jti, issued.token_id);
//! ```

pub mod clock;
pub mod codec;
pub mod jwt;
pub mod password;

pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use codec::IssuedToken;
pub use codec::TokenCodec;
pub use jwt::Claims;
pub use jwt::ExpiringClaims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenKind;
pub use password::PasswordError;
pub use password::PasswordHasher;
