use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

/// Revoke the bearer access token and, if given, the refresh token.
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Option<Json<LogoutRequest>>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    state.auth_service.logout(&user.token).await?;

    if let Some(refresh_token) = body.and_then(|Json(body)| body.refresh_token) {
        state.auth_service.logout(&refresh_token).await?;
    }

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("Logged out"),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogoutRequest {
    refresh_token: Option<String>,
}
