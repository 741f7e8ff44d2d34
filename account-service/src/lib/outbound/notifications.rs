use async_trait::async_trait;

use crate::domain::reset::errors::NotificationError;
use crate::domain::reset::models::ResetTicket;
use crate::domain::reset::ports::NotificationSink;

/// Notification sink that writes the reset link to the log instead of
/// sending mail.
pub struct LogNotificationSink {
    link_base_url: String,
}

impl LogNotificationSink {
    pub fn new(link_base_url: impl Into<String>) -> Self {
        Self {
            link_base_url: link_base_url.into(),
        }
    }

    fn link(&self, ticket: &ResetTicket) -> String {
        format!(
            "{}?token={}",
            self.link_base_url.trim_end_matches('/'),
            ticket.token
        )
    }
}

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn send_password_reset(&self, ticket: &ResetTicket) -> Result<(), NotificationError> {
        tracing::info!(
            email = %ticket.email,
            expires_at = %ticket.expires_at,
            link = %self.link(ticket),
            "Password reset link"
        );
        Ok(())
    }
}
