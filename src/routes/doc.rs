use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{account, cars, favorites as favorite_dto, filter, password},
    error::ErrorData,
    middleware::api_key::API_KEY_HEADER,
    models::{Car, CarWithPictures, Favorite, Picture, UserProfile},
    response::{ApiResponse, Meta},
    routes::{
        account as account_routes, car_filter, cars as car_routes, favorites, health,
        password as password_routes,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "api_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        account_routes::register,
        account_routes::login,
        account_routes::logout,
        account_routes::confirm_email,
        account_routes::assign_role,
        account_routes::remove_role,
        account_routes::users_with_roles,
        account_routes::current_user,
        account_routes::find_user_by_email,
        account_routes::list_roles,
        account_routes::refresh_token,
        password_routes::forgot_password,
        password_routes::reset_password,
        car_routes::list_cars,
        car_routes::get_car,
        car_routes::create_car,
        car_routes::update_car,
        car_routes::delete_car,
        car_routes::set_cover_image,
        car_routes::get_cover_image_url,
        car_filter::filter_cars,
        car_filter::get_car,
        favorites::list_favorites,
        favorites::add_favorite,
        favorites::remove_favorite
    ),
    components(
        schemas(
            Car,
            Picture,
            CarWithPictures,
            Favorite,
            UserProfile,
            account::RegisterRequest,
            account::LoginRequest,
            account::LoginResponse,
            account::AssignRoleRequest,
            account::IdEmailRequest,
            account::RefreshTokenRequest,
            account::RefreshTokenResponse,
            account::CurrentUser,
            account::UserWithRole,
            account::UserWithRoles,
            password::ForgotPasswordRequest,
            password::ResetPasswordRequest,
            cars::CarFields,
            cars::UpdateCarRequest,
            cars::CarUploadForm,
            cars::CoverImageUrl,
            cars::CarList,
            filter::CarFilter,
            filter::FacetCount,
            filter::AvailableFilters,
            filter::FilterResult,
            filter::CarWithPictureUrls,
            favorite_dto::FavoriteCar,
            favorite_dto::FavoriteWithCar,
            favorite_dto::FavoriteList,
            ErrorData,
            Meta,
            ApiResponse<account::LoginResponse>,
            ApiResponse<CarWithPictures>,
            ApiResponse<filter::FilterResult>,
            ApiResponse<favorite_dto::FavoriteList>
        )
    ),
    security(
        ("api_key" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Account", description = "Registration, login, tokens and roles"),
        (name = "Password", description = "Password reset"),
        (name = "Cars", description = "Inventory and pictures"),
        (name = "Car Filter", description = "Faceted inventory search"),
        (name = "Favorites", description = "Saved cars per user"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
