use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::account::{
        AssignRoleRequest, ConfirmEmailQuery, CurrentUser, FindUserQuery, IdEmailRequest,
        LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse, RegisterRequest,
        UserWithRole, UserWithRoles,
    },
    error::{AppResult, ErrorData},
    extract::{AppJson, AppQuery},
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::account_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/confirm-email", get(confirm_email))
        .route("/assign-role", post(assign_role))
        .route("/remove-role", post(remove_role))
        .route("/users-with-roles", get(users_with_roles))
        .route("/current-user", get(current_user))
        .route("/find-user-by-email", get(find_user_by_email))
        .route("/roles", get(list_roles))
        .route("/refresh-token", post(refresh_token))
}

#[utoipa::path(
    post,
    path = "/api/account/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid input or email taken", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [])),
    tag = "Account"
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = account_service::register(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/account/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access and refresh tokens", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Unknown email, unconfirmed or bad credentials", body = ApiResponse<ErrorData>),
        (status = 403, description = "Locked out", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [])),
    tag = "Account"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = account_service::login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/account/logout",
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<serde_json::Value>)
    ),
    security(("api_key" = []), ("api_key" = [], "bearer_auth" = [])),
    tag = "Account"
)]
pub async fn logout(
    State(state): State<AppState>,
    user: Option<AuthUser>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = account_service::logout(&state, user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/account/confirm-email",
    params(ConfirmEmailQuery),
    responses(
        (status = 200, description = "Email confirmed", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid user or token", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [])),
    tag = "Account"
)]
pub async fn confirm_email(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ConfirmEmailQuery>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = account_service::confirm_email(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/account/assign-role",
    request_body = AssignRoleRequest,
    responses(
        (status = 200, description = "Role assigned or removed", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Unknown role or nothing to remove", body = ApiResponse<ErrorData>),
        (status = 403, description = "Caller is not a business owner", body = ApiResponse<ErrorData>),
        (status = 404, description = "User not found", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [], "bearer_auth" = [])),
    tag = "Account"
)]
pub async fn assign_role(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<AssignRoleRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = account_service::assign_role(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/account/remove-role",
    request_body = IdEmailRequest,
    responses(
        (status = 200, description = "Role removed", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "User has no role", body = ApiResponse<ErrorData>),
        (status = 403, description = "Caller is not a business owner", body = ApiResponse<ErrorData>),
        (status = 404, description = "User not found", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [], "bearer_auth" = [])),
    tag = "Account"
)]
pub async fn remove_role(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<IdEmailRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = account_service::remove_role(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/account/users-with-roles",
    responses(
        (status = 200, description = "Users holding a role", body = ApiResponse<Vec<UserWithRole>>),
        (status = 403, description = "Caller is not a business owner", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [], "bearer_auth" = [])),
    tag = "Account"
)]
pub async fn users_with_roles(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<UserWithRole>>>> {
    let resp = account_service::users_with_roles(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/account/current-user",
    responses(
        (status = 200, description = "Profile of the bearer", body = ApiResponse<CurrentUser>),
        (status = 400, description = "Missing or invalid token", body = ApiResponse<ErrorData>),
        (status = 404, description = "User not found", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [], "bearer_auth" = [])),
    tag = "Account"
)]
pub async fn current_user(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CurrentUser>>> {
    let resp = account_service::current_user(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/account/find-user-by-email",
    params(FindUserQuery),
    responses(
        (status = 200, description = "User with roles", body = ApiResponse<UserWithRoles>),
        (status = 403, description = "Caller is not a business owner", body = ApiResponse<ErrorData>),
        (status = 404, description = "User not found", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [], "bearer_auth" = [])),
    tag = "Account"
)]
pub async fn find_user_by_email(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<FindUserQuery>,
) -> AppResult<Json<ApiResponse<UserWithRoles>>> {
    let resp = account_service::find_user_by_email(&state, &user, &query.email).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/account/roles",
    responses(
        (status = 200, description = "Role names", body = ApiResponse<Vec<String>>),
        (status = 403, description = "Caller is not a business owner", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [], "bearer_auth" = [])),
    tag = "Account"
)]
pub async fn list_roles(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<String>>>> {
    let resp = account_service::list_roles(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/account/refresh-token",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = ApiResponse<RefreshTokenResponse>),
        (status = 400, description = "Unknown email or refresh token", body = ApiResponse<ErrorData>)
    ),
    security(("api_key" = [])),
    tag = "Account"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshTokenRequest>,
) -> AppResult<Json<ApiResponse<RefreshTokenResponse>>> {
    let resp = account_service::refresh_token(&state, payload).await?;
    Ok(Json(resp))
}
