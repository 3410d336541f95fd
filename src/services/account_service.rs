use chrono::{Duration, Utc};
use sea_orm::TransactionTrait;
use url::Url;
use validator::Validate;

use crate::{
    dto::account::{
        AssignRoleRequest, ConfirmEmailQuery, CurrentUser, IdEmailRequest, LoginRequest,
        LoginResponse, RefreshTokenRequest, RefreshTokenResponse, RegisterRequest, UserWithRole,
        UserWithRoles,
    },
    entity::users,
    error::{AppError, AppResult},
    mailer::EmailMessage,
    middleware::auth::{AuthUser, ensure_business_owner},
    models::UserProfile,
    response::{ApiResponse, Meta},
    services::identity::{self, EMAIL_CONFIRMATION, NewUser, REFRESH_TOKEN},
    state::AppState,
};

/// Role value that strips the user's role instead of assigning one.
pub const REMOVE_ROLE_SENTINEL: &str = "remove";

/// Lifetime of emailed one-time links.
pub fn link_token_lifetime() -> Duration {
    Duration::hours(24)
}

/// Absolute link to `path` on this server carrying `token` and `email` as query parameters.
pub fn build_link(state: &AppState, path: &str, token: &str, email: &str) -> AppResult<String> {
    let base = format!("{}{}", state.config.public_base_url.trim_end_matches('/'), path);
    Url::parse_with_params(&base, &[("token", token), ("email", email)])
        .map(String::from)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid PUBLIC_BASE_URL: {e}")))
}

pub async fn register(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    payload.validate()?;
    if payload.password != payload.confirm_password {
        return Err(AppError::field(
            "confirm_password",
            "The password and confirmation password do not match.",
        ));
    }

    let needs_confirmation = state.config.require_email_confirmation;
    let txn = state.orm.begin().await?;
    let user = identity::create(
        &txn,
        NewUser {
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone_number: payload.phone_number,
            date_of_birth: payload.do_b,
            email_confirmed: !needs_confirmation,
            role: None,
        },
    )
    .await?;

    if !needs_confirmation {
        txn.commit().await?;
        tracing::info!(user_id = %user.id, "user registered");
        return Ok(ApiResponse::message(
            "Registration successful. Your email is confirmed.",
        ));
    }

    let token = state.tokens.generate_one_time_token();
    identity::set_token(&txn, user.id, EMAIL_CONFIRMATION, &token).await?;
    let link = build_link(state, "/api/account/confirm-email", &token, &user.email)?;
    state
        .mailer
        .send(EmailMessage {
            to: user.email.clone(),
            subject: format!("Email Confirmation {}", state.config.sender_name),
            body: format!("Please confirm your email by clicking <a href='{link}'>here</a>."),
        })
        .await?;
    txn.commit().await?;

    tracing::info!(user_id = %user.id, "user registered, confirmation pending");
    Ok(ApiResponse::message(
        "Registration successful. Please check your email to confirm your account.",
    ))
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let Some(user) = identity::find_by_email(&state.orm, &email).await? else {
        return Err(AppError::field("login", "Email not Exist"));
    };
    if !user.email_confirmed {
        return Err(AppError::field("login", "Email not confirmed."));
    }
    if identity::is_locked_out(&user, Utc::now()) {
        tracing::warn!(user_id = %user.id, "login refused, account locked out");
        return Err(AppError::Forbidden);
    }

    if !identity::verify_password(&user, &password) {
        let user = identity::record_failed_login(&state.orm, user).await?;
        if identity::is_locked_out(&user, Utc::now()) {
            tracing::warn!(user_id = %user.id, "account locked out after repeated failures");
            return Err(AppError::Forbidden);
        }
        tracing::info!(user_id = %user.id, failures = user.access_failed_count, "invalid login attempt");
        return Err(AppError::field("login", "Invalid login attempt."));
    }

    let user = identity::reset_access_failures(&state.orm, user).await?;
    let role = user.role.clone().unwrap_or_default();
    let token = state.tokens.generate_access_token(user.id, &user.email, &role)?;
    let refresh_token = state.tokens.generate_refresh_token();
    identity::set_token(&state.orm, user.id, REFRESH_TOKEN, &refresh_token).await?;

    tracing::info!(user_id = %user.id, "user logged in");
    Ok(ApiResponse::success(
        "Login successful",
        LoginResponse {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role,
            is_email_confirmed: user.email_confirmed,
            token,
            refresh_token,
        },
        Some(Meta::empty()),
    ))
}

/// Access tokens are stateless; signing out revokes the stored refresh token.
pub async fn logout(
    state: &AppState,
    user: Option<AuthUser>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if let Some(user) = user {
        identity::remove_token(&state.orm, user.user_id, REFRESH_TOKEN).await?;
        tracing::info!(user_id = %user.user_id, "user logged out");
    }
    Ok(ApiResponse::message("Logged out"))
}

pub async fn confirm_email(
    state: &AppState,
    query: ConfirmEmailQuery,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let Some(user) = identity::find_by_email(&state.orm, &query.email).await? else {
        return Err(AppError::bad_request("Invalid email confirmation request."));
    };

    let txn = state.orm.begin().await?;
    let consumed = identity::consume_token(
        &txn,
        user.id,
        EMAIL_CONFIRMATION,
        &query.token,
        link_token_lifetime(),
    )
    .await?;
    if !consumed {
        return Err(AppError::bad_request("Email confirmation failed."));
    }
    identity::confirm_email(&txn, user).await?;
    txn.commit().await?;

    Ok(ApiResponse::message("Email confirmed successfully."))
}

pub async fn assign_role(
    state: &AppState,
    caller: &AuthUser,
    payload: AssignRoleRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_business_owner(caller)?;
    payload.validate()?;

    let txn = state.orm.begin().await?;
    let user = identity::find_by_email(&txn, &payload.email)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    if !identity::role_exists(&txn, &payload.role).await? {
        if payload.role != REMOVE_ROLE_SENTINEL {
            return Err(AppError::bad_request("Role does not exist."));
        }
        if user.role.is_none() {
            return Err(AppError::bad_request("Failed to remove role from user."));
        }
        let user = identity::set_role(&txn, user, None).await?;
        txn.commit().await?;
        tracing::info!(by = %caller.user_id, user_id = %user.id, "role removed");
        return Ok(ApiResponse::message("Role removed successfully"));
    }

    let user = identity::set_role(&txn, user, Some(payload.role.clone())).await?;
    txn.commit().await?;
    tracing::info!(by = %caller.user_id, user_id = %user.id, role = %payload.role, "role assigned");
    Ok(ApiResponse::message("Role assigned successfully"))
}

pub async fn remove_role(
    state: &AppState,
    caller: &AuthUser,
    payload: IdEmailRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_business_owner(caller)?;

    let user = find_by_id_or_email(state, &payload)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;
    if user.role.is_none() {
        return Err(AppError::bad_request("Failed to remove role from user."));
    }

    let user = identity::set_role(&state.orm, user, None).await?;
    tracing::info!(by = %caller.user_id, user_id = %user.id, "role removed");
    Ok(ApiResponse::message("Role removed successfully"))
}

async fn find_by_id_or_email(
    state: &AppState,
    payload: &IdEmailRequest,
) -> AppResult<Option<users::Model>> {
    if let Some(email) = payload.email.as_deref().filter(|e| !e.is_empty()) {
        return identity::find_by_email(&state.orm, email).await;
    }
    match payload.id.as_deref().map(uuid::Uuid::parse_str) {
        Some(Ok(id)) => identity::find_by_id(&state.orm, id).await,
        Some(Err(_)) => Ok(None),
        None => Err(AppError::field("email", "Email or Id is required.")),
    }
}

pub async fn users_with_roles(
    state: &AppState,
    caller: &AuthUser,
) -> AppResult<ApiResponse<Vec<UserWithRole>>> {
    ensure_business_owner(caller)?;
    let users = identity::users_with_roles(&state.orm)
        .await?
        .into_iter()
        .map(|user| UserWithRole {
            profile: UserProfile::from(&user),
            role: user.role.unwrap_or_default(),
        })
        .collect();
    Ok(ApiResponse::success("Users with roles", users, Some(Meta::empty())))
}

pub async fn current_user(state: &AppState, caller: &AuthUser) -> AppResult<ApiResponse<CurrentUser>> {
    let user = identity::find_by_id(&state.orm, caller.user_id)
        .await?
        .ok_or(AppError::NotFound("User not found."))?;
    Ok(ApiResponse::success(
        "Current user",
        CurrentUser {
            user_id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_email_confirmed: user.email_confirmed,
            role: user.role.unwrap_or_default(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn find_user_by_email(
    state: &AppState,
    caller: &AuthUser,
    email: &str,
) -> AppResult<ApiResponse<UserWithRoles>> {
    ensure_business_owner(caller)?;
    let user = identity::find_by_email(&state.orm, email)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;
    Ok(ApiResponse::success(
        "User",
        UserWithRoles {
            profile: UserProfile::from(&user),
            roles: user.role.into_iter().collect(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_roles(state: &AppState, caller: &AuthUser) -> AppResult<ApiResponse<Vec<String>>> {
    ensure_business_owner(caller)?;
    let roles = identity::role_names(&state.orm).await?;
    Ok(ApiResponse::success("Roles", roles, Some(Meta::empty())))
}

/// Exchanges the stored refresh token for a new token pair, rotating it atomically.
pub async fn refresh_token(
    state: &AppState,
    payload: RefreshTokenRequest,
) -> AppResult<ApiResponse<RefreshTokenResponse>> {
    let user = identity::find_by_email(&state.orm, &payload.email)
        .await?
        .ok_or_else(|| AppError::bad_request("Invalid email."))?;

    let replacement = state.tokens.generate_refresh_token();
    let rotated = identity::rotate_token(
        &state.orm,
        user.id,
        REFRESH_TOKEN,
        &payload.refresh_token,
        &replacement,
    )
    .await?;
    if !rotated {
        tracing::warn!(user_id = %user.id, "refresh token rejected");
        return Err(AppError::bad_request("Invalid refresh token."));
    }

    let role = user.role.unwrap_or_default();
    let token = state.tokens.generate_access_token(user.id, &user.email, &role)?;
    Ok(ApiResponse::success(
        "Token refreshed",
        RefreshTokenResponse {
            token,
            refresh_token: replacement,
        },
        Some(Meta::empty()),
    ))
}
