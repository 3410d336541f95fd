use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{models::UserProfile, validation};

#[derive(Deserialize, Debug, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(custom(function = "validation::validate_email_format"))]
    pub email: String,
    #[validate(custom(function = "validation::validate_password"))]
    pub password: String,
    pub confirm_password: String,
    #[validate(length(
        min = 1,
        max = 50,
        message = "First Name cannot be longer than 50 characters."
    ))]
    pub first_name: String,
    #[validate(length(max = 50, message = "Last Name cannot be longer than 50 characters."))]
    pub last_name: Option<String>,
    #[validate(custom(function = "validation::validate_phone"))]
    pub phone_number: Option<String>,
    #[validate(custom(function = "validation::validate_date_of_birth"))]
    pub do_b: Option<NaiveDate>,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub role: String,
    pub is_email_confirmed: bool,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    #[validate(custom(function = "validation::validate_email_format"))]
    pub email: String,
    #[validate(length(max = 50, message = "Role cannot be longer than 50 characters."))]
    pub role: String,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdEmailRequest {
    pub id: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub email: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    pub token: String,
    pub refresh_token: String,
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct ConfirmEmailQuery {
    pub token: String,
    pub email: String,
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct FindUserQuery {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub is_email_confirmed: bool,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserWithRole {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub roles: Vec<String>,
}

/// Access token claims.
#[derive(Debug, Deserialize, Serialize, ToSchema, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}
