use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::auth::errors::AuthError;
use crate::inbound::http::router::AppState;

const ACCEPTED_MESSAGE: &str = "If the email is registered, a password reset link has been sent";

/// Known and unknown emails get the same response.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<ApiSuccess<ForgotPasswordData>, ApiError> {
    let reset_token = match state.auth_service.forgot_password(&body.email).await {
        Ok(ticket) => state.expose_reset_token.then_some(ticket.token),
        Err(AuthError::NotFound) => None,
        Err(e) => return Err(e.into()),
    };

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ForgotPasswordData {
            message: ACCEPTED_MESSAGE.to_string(),
            reset_token,
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForgotPasswordData {
    pub message: String,
    /// Only present when the service runs with `reset.expose_token`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}
