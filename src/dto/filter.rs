use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Car;

/// Search criteria; every field is optional and present fields are AND-combined.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarFilter {
    pub makes: Option<Vec<String>>,
    pub models: Option<Vec<String>>,
    pub price_from: Option<f64>,
    pub price_to: Option<f64>,
    pub colors: Option<Vec<String>>,
    pub mileage_up_to: Option<i32>,
    pub maintenance_cost_from: Option<f64>,
    pub maintenance_cost_to: Option<f64>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub is_new: Option<bool>,
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FacetCount {
    pub key: Option<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NumberRange<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IsNewOptions {
    pub new: bool,
    pub used: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailableFilters {
    pub makes: Vec<FacetCount>,
    pub models: Vec<FacetCount>,
    pub colors: Vec<FacetCount>,
    pub price_range: NumberRange<f64>,
    pub mileage_range: NumberRange<i32>,
    pub maintenance_cost_range: NumberRange<f64>,
    pub year_range: NumberRange<i32>,
    pub is_new_options: IsNewOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterResult {
    pub total_car_count: usize,
    pub available_filters: AvailableFilters,
    pub cars: Vec<Car>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarWithPictureUrls {
    #[serde(flatten)]
    pub car: Car,
    pub picture_urls: Vec<String>,
}
