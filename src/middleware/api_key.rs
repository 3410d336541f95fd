use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{error::AppError, state::AppState};

pub const API_KEY_HEADER: &str = "ApiKey";

/// Rejects requests whose `ApiKey` header is absent or differs from the configured key.
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(presented) = req.headers().get(API_KEY_HEADER) else {
        tracing::warn!(uri = %req.uri(), "api key was not provided");
        return AppError::Unauthorized("Api Key was not provided.").into_response();
    };

    if presented.as_bytes() != state.config.api_key.as_bytes() {
        tracing::warn!(uri = %req.uri(), "unauthorized client");
        return AppError::Unauthorized("Unauthorized client.").into_response();
    }

    next.run(req).await
}
