use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use super::errors::ValidationError;
use crate::domain::user::models::Age;
use crate::domain::user::models::DisplayName;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Password;
use crate::domain::user::models::PhoneNumber;
use crate::domain::user::models::UserId;

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub name: DisplayName,
    pub email: EmailAddress,
    pub password: Password,
    pub age: Option<Age>,
    pub phone: Option<PhoneNumber>,
}

impl RegisterCommand {
    /// Validate raw registration fields.
    ///
    /// # Errors
    /// * `Name` - Name is blank or too long
    /// * `Email` - Email is not a valid address
    /// * `Password` - Password shorter than 8 characters
    /// * `Age` - Age outside 1..=150
    /// * `Phone` - Phone number is not plausible
    pub fn new(
        name: String,
        email: String,
        password: String,
        age: Option<i64>,
        phone: Option<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            name: DisplayName::new(name)?,
            email: EmailAddress::new(email)?,
            password: Password::new(password)?,
            age: age.map(Age::new).transpose()?,
            phone: phone
                .filter(|phone| !phone.trim().is_empty())
                .map(PhoneNumber::new)
                .transpose()?,
        })
    }
}

/// Access and refresh token issued together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Subject of a valid, unrevoked access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Token lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSettings {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub reset_ttl: Duration,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            access_ttl: Duration::hours(2),
            refresh_ttl: Duration::days(7),
            reset_ttl: Duration::minutes(15),
        }
    }
}
