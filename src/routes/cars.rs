use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, put},
};
use tower_http::limit::RequestBodyLimitLayer;
use uuid::Uuid;

use crate::{
    dto::cars::{
        CarFields, CarList, CarListQuery, CarUploadForm, CoverImageUrl, ImageUpload, UpdateCarRequest,
    },
    error::{AppError, AppResult, ErrorData},
    extract::{AppJson, AppPath, AppQuery},
    models::CarWithPictures,
    response::ApiResponse,
    services::car_service::{self, IMAGE_TOO_LARGE, MAX_IMAGE_BYTES, MAX_IMAGES, TOO_MANY_IMAGES},
    state::AppState,
};

/// Upper bound on a whole multipart body: every image at its limit plus room for the text fields.
pub const MAX_UPLOAD_BODY_BYTES: usize = MAX_IMAGES * MAX_IMAGE_BYTES + 1024 * 1024;

const IMAGE_FIELD: &str = "imagefiles";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cars).post(create_car))
        .route("/{id}", get(get_car).put(update_car).delete(delete_car))
        .route("/{id}/cover-image", put(set_cover_image))
        .route("/cover-image/{id}", get(get_cover_image_url))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BODY_BYTES))
}

#[utoipa::path(
    get,
    path = "/api/car",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("sort_by" = Option<String>, Query, description = "created_at | price | year | mileage | make"),
        ("sort_order" = Option<String>, Query, description = "asc | desc, default desc")
    ),
    responses(
        (status = 200, description = "Cars", body = ApiResponse<CarList>)
    ),
    security(("api_key" = [])),
    tag = "Cars"
)]
pub async fn list_cars(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CarListQuery>,
) -> AppResult<Json<ApiResponse<CarList>>> {
    let resp = car_service::list_cars(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/car/{id}",
    params(
        ("id" = Uuid, Path, description = "Car ID")
    ),
    responses(
        (status = 200, description = "Car with its pictures", body = ApiResponse<CarWithPictures>),
        (status = 404, description = "Car not found", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [])),
    tag = "Cars"
)]
pub async fn get_car(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<CarWithPictures>>> {
    let resp = car_service::get_car(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/car",
    request_body(content = CarUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Car created", body = ApiResponse<CarWithPictures>),
        (status = 400, description = "Invalid fields or images", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [])),
    tag = "Cars"
)]
pub async fn create_car(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<CarWithPictures>>)> {
    let (fields, images) = read_car_form(multipart).await?;
    let resp = car_service::create_car(&state, fields, images).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/car/{id}",
    params(
        ("id" = Uuid, Path, description = "Car ID")
    ),
    request_body = UpdateCarRequest,
    responses(
        (status = 204, description = "Car updated"),
        (status = 400, description = "Invalid fields, ID mismatch or cover removal", body = ApiResponse<ErrorData>),
        (status = 404, description = "Car not found", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [])),
    tag = "Cars"
)]
pub async fn update_car(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateCarRequest>,
) -> AppResult<StatusCode> {
    car_service::update_car(&state, id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/car/{id}",
    params(
        ("id" = Uuid, Path, description = "Car ID")
    ),
    responses(
        (status = 204, description = "Car deleted"),
        (status = 404, description = "Car not found", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [])),
    tag = "Cars"
)]
pub async fn delete_car(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    car_service::delete_car(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/car/{id}/cover-image",
    params(
        ("id" = Uuid, Path, description = "Car ID")
    ),
    request_body(content = Uuid, description = "Picture ID belonging to the car"),
    responses(
        (status = 204, description = "Cover image set"),
        (status = 400, description = "Picture does not belong to the car", body = ApiResponse<ErrorData>),
        (status = 404, description = "Car not found", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [])),
    tag = "Cars"
)]
pub async fn set_cover_image(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(picture_id): AppJson<Uuid>,
) -> AppResult<StatusCode> {
    car_service::set_cover_image(&state, id, picture_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/car/cover-image/{id}",
    params(
        ("id" = Uuid, Path, description = "Picture ID")
    ),
    responses(
        (status = 200, description = "Picture URL", body = ApiResponse<CoverImageUrl>),
        (status = 404, description = "Picture not found", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [])),
    tag = "Cars"
)]
pub async fn get_cover_image_url(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<CoverImageUrl>>> {
    let resp = car_service::get_cover_image_url(&state, id).await?;
    Ok(Json(resp))
}

/// Reads the text fields and image files of a car upload.
///
/// Field names are matched case-insensitively. Image limits are enforced while
/// streaming so an oversized body is rejected before it is fully buffered.
async fn read_car_form(mut multipart: Multipart) -> AppResult<(CarFields, Vec<ImageUpload>)> {
    let mut fields = CarFields::default();
    let mut images: Vec<ImageUpload> = Vec::new();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_ascii_lowercase();

        if name == IMAGE_FIELD {
            if images.len() == MAX_IMAGES {
                return Err(AppError::field("imageFiles", TOO_MANY_IMAGES));
            }
            let file_name = field.file_name().map(str::to_string);
            let mut bytes = Vec::new();
            while let Some(chunk) = field.chunk().await? {
                if bytes.len() + chunk.len() > MAX_IMAGE_BYTES {
                    return Err(AppError::field("imageFiles", IMAGE_TOO_LARGE));
                }
                bytes.extend_from_slice(&chunk);
            }
            images.push(ImageUpload { file_name, bytes });
            continue;
        }

        let value = field.text().await?;
        let value = value.trim();
        match name.as_str() {
            "make" => fields.make = value.to_string(),
            "model" => fields.model = value.to_string(),
            "mileage" => fields.mileage = parse_optional("mileage", value)?,
            "price" => fields.price = parse_optional("price", value)?,
            "color" => fields.color = non_empty(value),
            "vin" => fields.vin = non_empty(value),
            "averageyearlymaintenancecost" => {
                fields.average_yearly_maintenance_cost =
                    parse_optional("averageYearlyMaintenanceCost", value)?
            }
            "description" => fields.description = non_empty(value),
            "year" => fields.year = parse_optional("year", value)?,
            "isnew" => fields.is_new = parse_bool("isNew", value)?,
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    Ok((fields, images))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_optional<T: FromStr>(field: &str, value: &str) -> AppResult<Option<T>> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| AppError::field(field, format!("The value '{value}' is not valid for {field}.")))
}

fn parse_bool(field: &str, value: &str) -> AppResult<Option<bool>> {
    if value.is_empty() {
        return Ok(None);
    }
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => Ok(Some(true)),
        "false" | "off" | "0" => Ok(Some(false)),
        _ => Err(AppError::field(field, format!("The value '{value}' is not valid for {field}."))),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_bool, parse_optional};

    #[test]
    fn blank_form_values_are_absent() {
        assert_eq!(parse_optional::<i32>("year", "").unwrap(), None);
        assert_eq!(parse_bool("isNew", "").unwrap(), None);
    }

    #[test]
    fn form_values_parse_or_report_the_field() {
        assert_eq!(parse_optional::<f64>("price", "12500.5").unwrap(), Some(12500.5));
        assert_eq!(parse_bool("isNew", "True").unwrap(), Some(true));
        assert!(parse_optional::<i32>("mileage", "lots").is_err());
        assert!(parse_bool("isNew", "maybe").is_err());
    }
}
