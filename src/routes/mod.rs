use std::{any::Any, time::Duration};

use axum::{
    Json, Router,
    http::{HeaderName, HeaderValue, Method, Request, Response, StatusCode, Uri, header},
    middleware,
    response::IntoResponse,
    routing::get,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    middleware::api_key::require_api_key,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub mod account;
pub mod car_filter;
pub mod cars;
pub mod doc;
pub mod favorites;
pub mod health;
pub mod params;
pub mod password;

const JSON_BODY_LIMIT: usize = 1024 * 1024;
const MAX_CONCURRENT_REQUESTS: usize = 100;
const REQUEST_ID_HEADER: &str = "x-request-id";

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/account", account::router())
        .nest("/password", password::router())
        .nest("/carfilter", car_filter::router())
        .nest("/favorite", favorites::router())
        .layer(RequestBodyLimitLayer::new(JSON_BODY_LIMIT))
        // Nested after the JSON limit; uploads carry their own limit.
        .nest("/car", cars::router())
}

/// The complete application: API key gate, docs, static car images and the tower stack.
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/api", create_api_router())
        .nest_service("/CarImages", ServeDir::new(state.images.dir()))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        })
        .on_request(|request: &Request<_>, _span: &tracing::Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "request started"
            );
        })
        .on_response(|response: &Response<_>, latency: Duration, _span: &tracing::Span| {
            tracing::info!(
                status = %response.status(),
                ms = %latency.as_millis(),
                "request finished"
            );
        });

    let show_panic_details = state.config.is_development();
    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .merge(protected)
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .layer(trace_layer)
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
            panic_response(panic, show_panic_details)
        }))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
        .with_state(state)
}

/// Credentialed CORS for the configured origins; unparsable origins are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("apikey"),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

fn panic_response(
    panic: Box<dyn Any + Send + 'static>,
    show_details: bool,
) -> axum::response::Response {
    let details = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %details, "handler panicked");

    let data = if show_details {
        serde_json::json!({ "error": "Internal Server Error", "details": details })
    } else {
        serde_json::json!({ "error": "Internal Server Error" })
    };
    let body = ApiResponse::success("Internal Server Error", data, Some(Meta::empty()));
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::success(
        "Not Found",
        serde_json::json!({ "path": uri.path() }),
        Some(Meta::empty()),
    );
    (StatusCode::NOT_FOUND, Json(body))
}

