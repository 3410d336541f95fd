use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::favorites::{AddFavoriteQuery, FavoriteList},
    error::{AppResult, ErrorData},
    extract::{AppPath, AppQuery},
    models::Favorite,
    response::ApiResponse,
    services::favorite_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_favorite))
        // GET takes a user id, DELETE a favorite id; axum needs one parameter name per segment.
        .route("/{id}", get(list_favorites).delete(remove_favorite))
}

#[utoipa::path(
    get,
    path = "/api/favorite/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Favorites, most recent first", body = ApiResponse<FavoriteList>),
        (status = 404, description = "No favorites found", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [])),
    tag = "Favorites"
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<FavoriteList>>> {
    let resp = favorite_service::list_favorites(&state, user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/favorite",
    params(AddFavoriteQuery),
    responses(
        (status = 201, description = "Added to favorites", body = ApiResponse<Favorite>),
        (status = 400, description = "Unknown car or user", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [])),
    tag = "Favorites"
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AddFavoriteQuery>,
) -> AppResult<(StatusCode, Json<ApiResponse<Favorite>>)> {
    let resp = favorite_service::add_favorite(&state, query).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/favorite/{id}",
    params(
        ("id" = Uuid, Path, description = "Favorite ID")
    ),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 404, description = "Favorite not found", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [])),
    tag = "Favorites"
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    favorite_service::remove_favorite(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
