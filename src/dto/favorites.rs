use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct AddFavoriteQuery {
    pub user_id: Uuid,
    pub car_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteCar {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub mileage: Option<i32>,
    pub price: Option<f64>,
    pub year: Option<i32>,
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteWithCar {
    pub id: Uuid,
    pub user_id: Uuid,
    pub car_id: Uuid,
    pub date_time: DateTime<Utc>,
    pub car: FavoriteCar,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct FavoriteList {
    #[schema(value_type = Vec<FavoriteWithCar>)]
    pub items: Vec<FavoriteWithCar>,
}
