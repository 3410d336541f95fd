use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::password::{ForgotPasswordRequest, ResetPasswordRequest},
    error::{AppResult, ErrorData},
    extract::AppJson,
    response::ApiResponse,
    services::password_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/forgot", post(forgot_password))
        .route("/reset", post(reset_password))
}

#[utoipa::path(
    post,
    path = "/api/password/forgot",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link mailed", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Unknown email", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [])),
    tag = "Password"
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ForgotPasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = password_service::forgot(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/password/reset",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Unknown email, invalid token or weak password", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [])),
    tag = "Password"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = password_service::reset(&state, payload).await?;
    Ok(Json(resp))
}
