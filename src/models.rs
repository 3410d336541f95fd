use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{cars, favorites, pictures, users};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub mileage: Option<i32>,
    pub price: Option<f64>,
    pub color: Option<String>,
    pub vin: Option<String>,
    pub average_yearly_maintenance_cost: Option<f64>,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub is_new: Option<bool>,
    pub cover_image_id: Option<Uuid>,
}

impl From<cars::Model> for Car {
    fn from(model: cars::Model) -> Self {
        Self {
            id: model.id,
            make: model.make,
            model: model.model,
            mileage: model.mileage,
            price: model.price,
            color: model.color,
            vin: model.vin,
            average_yearly_maintenance_cost: model.average_yearly_maintenance_cost,
            description: model.description,
            year: model.year,
            is_new: model.is_new,
            cover_image_id: model.cover_image_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Picture {
    pub id: Uuid,
    pub url: String,
}

impl From<pictures::Model> for Picture {
    fn from(model: pictures::Model) -> Self {
        Self {
            id: model.id,
            url: model.url,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarWithPictures {
    #[serde(flatten)]
    pub car: Car,
    pub pictures: Vec<Picture>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub car_id: Uuid,
    pub date_time: DateTime<Utc>,
}

impl From<favorites::Model> for Favorite {
    fn from(model: favorites::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            car_id: model.car_id,
            date_time: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Profile shape shared by the account endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub do_b: Option<NaiveDate>,
    pub is_email_confirmed: bool,
}

impl From<&users::Model> for UserProfile {
    fn from(user: &users::Model) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone_number: user.phone_number.clone(),
            do_b: user.date_of_birth,
            is_email_confirmed: user.email_confirmed,
        }
    }
}
