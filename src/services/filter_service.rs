use sea_orm::{EntityTrait, ModelTrait, QueryOrder};
use uuid::Uuid;

use crate::{
    dto::filter::{CarFilter, CarWithPictureUrls, FilterResult},
    entity::{
        Cars, Pictures,
        cars::Column as CarCol,
        pictures::Column as PicCol,
    },
    error::{AppError, AppResult},
    filter,
    models::Car,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Loads the whole inventory and runs the in-memory filter over it.
pub async fn filter_cars(state: &AppState, criteria: CarFilter) -> AppResult<ApiResponse<FilterResult>> {
    let inventory: Vec<Car> = Cars::find()
        .order_by_desc(CarCol::CreatedAt)
        .order_by_asc(CarCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Car::from)
        .collect();

    let inventory_size = inventory.len();
    let result = filter::apply(inventory, &criteria);
    tracing::debug!(inventory_size, matched = result.total_car_count, "filtered cars");

    let total = result.total_car_count as i64;
    Ok(ApiResponse::success(
        "Filtered cars",
        result,
        Some(Meta {
            page: None,
            per_page: None,
            total: Some(total),
        }),
    ))
}

pub async fn get_car_with_picture_urls(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<CarWithPictureUrls>> {
    let car = Cars::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Car not found"))?;
    let picture_urls = car
        .find_related(Pictures)
        .order_by_asc(PicCol::Url)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|picture| picture.url)
        .collect();

    Ok(ApiResponse::success(
        "Car",
        CarWithPictureUrls {
            car: Car::from(car),
            picture_urls,
        },
        Some(Meta::empty()),
    ))
}
