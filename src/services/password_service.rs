use sea_orm::TransactionTrait;
use validator::Validate;

use crate::{
    dto::password::{ForgotPasswordRequest, ResetPasswordRequest},
    error::{AppError, AppResult},
    mailer::EmailMessage,
    response::ApiResponse,
    services::{
        account_service::{build_link, link_token_lifetime},
        identity::{self, PASSWORD_RESET, REFRESH_TOKEN},
    },
    state::AppState,
};

/// Issues a single-use reset token and mails the link; the token itself is never returned.
pub async fn forgot(
    state: &AppState,
    payload: ForgotPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    payload.validate()?;
    let user = identity::find_by_email(&state.orm, &payload.email)
        .await?
        .ok_or_else(|| AppError::bad_request("User not found."))?;

    let token = state.tokens.generate_one_time_token();
    identity::set_token(&state.orm, user.id, PASSWORD_RESET, &token).await?;
    let link = build_link(state, "/api/password/reset", &token, &user.email)?;
    state
        .mailer
        .send(EmailMessage {
            to: user.email.clone(),
            subject: format!("Password Reset {}", state.config.sender_name),
            body: format!("Reset your password by clicking <a href='{link}'>here</a>."),
        })
        .await?;

    tracing::info!(user_id = %user.id, "password reset requested");
    Ok(ApiResponse::message(
        "Password reset link has been sent to your email.",
    ))
}

/// Consumes the reset token, sets the new password and signs the user out everywhere.
pub async fn reset(
    state: &AppState,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    payload.validate()?;
    let user = identity::find_by_email(&state.orm, &payload.email)
        .await?
        .ok_or_else(|| AppError::bad_request("User not found."))?;

    let txn = state.orm.begin().await?;
    let consumed = identity::consume_token(
        &txn,
        user.id,
        PASSWORD_RESET,
        &payload.token,
        link_token_lifetime(),
    )
    .await?;
    if !consumed {
        tracing::warn!(user_id = %user.id, "password reset token rejected");
        return Err(AppError::bad_request("Password reset failed."));
    }
    let user = identity::set_password(&txn, user, &payload.new_password).await?;
    identity::remove_token(&txn, user.id, REFRESH_TOKEN).await?;
    txn.commit().await?;

    tracing::info!(user_id = %user.id, "password reset");
    Ok(ApiResponse::message("Password has been reset successfully."))
}
