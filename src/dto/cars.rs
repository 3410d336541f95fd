use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::routes::params::{CarSortBy, Pagination, SortOrder};

/// Scalar attributes of a car, shared by create and update.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarFields {
    #[validate(length(min = 1, max = 50, message = "Make cannot be longer than 50 characters."))]
    pub make: String,
    #[validate(length(min = 1, max = 50, message = "Model cannot be longer than 50 characters."))]
    pub model: String,
    #[validate(range(min = 0, message = "Mileage must be a positive number."))]
    pub mileage: Option<i32>,
    #[validate(range(min = 0.0, max = 1000000.0, message = "Price must be a positive number."))]
    pub price: Option<f64>,
    #[validate(length(max = 20, message = "Color cannot be longer than 20 characters."))]
    pub color: Option<String>,
    #[validate(length(max = 17, message = "VIN cannot be longer than 17 characters."))]
    pub vin: Option<String>,
    #[validate(range(
        min = 0.0,
        message = "Average Yearly Maintenance Cost must be a positive number."
    ))]
    pub average_yearly_maintenance_cost: Option<f64>,
    #[validate(length(max = 5000, message = "Description cannot be longer than 5000 characters."))]
    pub description: Option<String>,
    #[validate(range(min = 1886, max = 2500, message = "Year must be a valid year."))]
    pub year: Option<i32>,
    pub is_new: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCarRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub car: CarFields,
    /// When present, the car's pictures are reconciled against this list.
    pub list_of_picture_urls: Option<Vec<String>>,
}

/// Image bytes taken from a multipart upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Multipart body accepted by car creation (documentation only).
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct CarUploadForm {
    #[serde(flatten)]
    pub car: CarFields,
    #[schema(value_type = Vec<String>, format = Binary)]
    pub image_files: Vec<Vec<u8>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CoverImageUrl {
    pub url: String,
}

// Pagination fields are inlined: serde_urlencoded cannot parse numbers through `flatten`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CarListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub sort_by: Option<CarSortBy>,
    pub sort_order: Option<SortOrder>,
}

impl CarListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CarList {
    #[schema(value_type = Vec<crate::models::Car>)]
    pub items: Vec<crate::models::Car>,
}
