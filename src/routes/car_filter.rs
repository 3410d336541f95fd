use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::filter::{CarFilter, CarWithPictureUrls, FilterResult},
    error::{AppResult, ErrorData},
    extract::{AppJson, AppPath},
    response::ApiResponse,
    services::filter_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/filter", post(filter_cars))
        .route("/{id}", get(get_car))
}

#[utoipa::path(
    post,
    path = "/api/carfilter/filter",
    request_body = CarFilter,
    responses(
        (status = 200, description = "Matching cars with facet counts", body = ApiResponse<FilterResult>)
    ),
    security(("api_key" = [])),
    tag = "Car Filter"
)]
pub async fn filter_cars(
    State(state): State<AppState>,
    AppJson(criteria): AppJson<CarFilter>,
) -> AppResult<Json<ApiResponse<FilterResult>>> {
    let resp = filter_service::filter_cars(&state, criteria).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/carfilter/{id}",
    params(
        ("id" = Uuid, Path, description = "Car ID")
    ),
    responses(
        (status = 200, description = "Car with its picture URLs", body = ApiResponse<CarWithPictureUrls>),
        (status = 404, description = "Car not found", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [])),
    tag = "Car Filter"
)]
pub async fn get_car(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<CarWithPictureUrls>>> {
    let resp = filter_service::get_car_with_picture_urls(&state, id).await?;
    Ok(Json(resp))
}
