use async_trait::async_trait;

use super::errors::NotificationError;
use super::models::ResetTicket;

/// Out-of-band delivery of reset tokens (email in production, a log line
/// in development).
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    /// Deliver a reset token to the address it was issued for.
    ///
    /// # Errors
    /// * `DeliveryFailed` - The message could not be handed off
    async fn send_password_reset(&self, ticket: &ResetTicket) -> Result<(), NotificationError>;
}
