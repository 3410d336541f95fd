use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation;

#[derive(Deserialize, Debug, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    #[validate(custom(function = "validation::validate_email_format"))]
    pub email: String,
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(custom(function = "validation::validate_email_format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Token is required."))]
    pub token: String,
    #[validate(custom(function = "validation::validate_password"))]
    pub new_password: String,
}
