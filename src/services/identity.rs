//! User credential store: accounts, password hashes, roles and stored tokens.

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use crate::{
    entity::{
        Roles, UserTokens, Users,
        roles::Column as RoleCol,
        user_tokens::{self, Column as TokenCol},
        users::{self, Column as UserCol},
    },
    error::{AppError, AppResult},
    services::token_service::hash_secret,
};

/// Provider under which this application stores its own tokens.
pub const LOGIN_PROVIDER: &str = "DealerAdapt";
pub const REFRESH_TOKEN: &str = "RefreshToken";
pub const EMAIL_CONFIRMATION: &str = "EmailConfirmation";
pub const PASSWORD_RESET: &str = "PasswordReset";

pub const MAX_FAILED_ACCESS_ATTEMPTS: i32 = 5;
pub const LOCKOUT_MINUTES: i64 = 5;

pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub email_confirmed: bool,
    pub role: Option<String>,
}

/// Lookup key for an email: addresses differing only in case or surrounding space are one identity.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_uppercase()
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_password(user: &users::Model, password: &str) -> bool {
    PasswordHash::new(&user.password_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

pub async fn create<C: ConnectionTrait>(db: &C, new_user: NewUser) -> AppResult<users::Model> {
    if find_by_email(db, &new_user.email).await?.is_some() {
        return Err(AppError::field(
            "email",
            format!("Email '{}' is already taken.", new_user.email),
        ));
    }

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        normalized_email: Set(normalize_email(&new_user.email)),
        email: Set(new_user.email.trim().to_string()),
        password_hash: Set(hash_password(&new_user.password)?),
        first_name: Set(new_user.first_name),
        last_name: Set(new_user.last_name),
        phone_number: Set(new_user.phone_number),
        date_of_birth: Set(new_user.date_of_birth),
        email_confirmed: Set(new_user.email_confirmed),
        role: Set(new_user.role),
        access_failed_count: Set(0),
        lockout_end: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await?;
    Ok(user)
}

pub async fn find_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> AppResult<Option<users::Model>> {
    Ok(Users::find()
        .filter(UserCol::NormalizedEmail.eq(normalize_email(email)))
        .one(db)
        .await?)
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<Option<users::Model>> {
    Ok(Users::find_by_id(id).one(db).await?)
}

/// Users holding any role, grouped by role name.
pub async fn users_with_roles<C: ConnectionTrait>(db: &C) -> AppResult<Vec<users::Model>> {
    Ok(Users::find()
        .filter(UserCol::Role.is_not_null())
        .order_by_asc(UserCol::Role)
        .order_by_asc(UserCol::Email)
        .all(db)
        .await?)
}

pub async fn role_names<C: ConnectionTrait>(db: &C) -> AppResult<Vec<String>> {
    Ok(Roles::find()
        .order_by_asc(RoleCol::Name)
        .all(db)
        .await?
        .into_iter()
        .map(|role| role.name)
        .collect())
}

pub async fn role_exists<C: ConnectionTrait>(db: &C, name: &str) -> AppResult<bool> {
    Ok(Roles::find()
        .filter(RoleCol::Name.eq(name))
        .one(db)
        .await?
        .is_some())
}

/// Replaces whatever role the user holds; `None` leaves them without one.
pub async fn set_role<C: ConnectionTrait>(
    db: &C,
    user: users::Model,
    role: Option<String>,
) -> AppResult<users::Model> {
    let mut active = user.into_active_model();
    active.role = Set(role);
    Ok(active.update(db).await?)
}

pub async fn set_password<C: ConnectionTrait>(
    db: &C,
    user: users::Model,
    password: &str,
) -> AppResult<users::Model> {
    let mut active = user.into_active_model();
    active.password_hash = Set(hash_password(password)?);
    active.access_failed_count = Set(0);
    active.lockout_end = Set(None);
    Ok(active.update(db).await?)
}

pub async fn confirm_email<C: ConnectionTrait>(
    db: &C,
    user: users::Model,
) -> AppResult<users::Model> {
    let mut active = user.into_active_model();
    active.email_confirmed = Set(true);
    Ok(active.update(db).await?)
}

pub fn is_locked_out(user: &users::Model, now: DateTime<Utc>) -> bool {
    user.lockout_end
        .is_some_and(|end| end.with_timezone(&Utc) > now)
}

/// Counts a failed sign-in; the threshold-th failure locks the account.
pub async fn record_failed_login<C: ConnectionTrait>(
    db: &C,
    user: users::Model,
) -> AppResult<users::Model> {
    let failures = user.access_failed_count + 1;
    let mut active = user.into_active_model();
    if failures >= MAX_FAILED_ACCESS_ATTEMPTS {
        let until = Utc::now() + Duration::minutes(LOCKOUT_MINUTES);
        active.lockout_end = Set(Some(until.into()));
        active.access_failed_count = Set(0);
    } else {
        active.access_failed_count = Set(failures);
    }
    Ok(active.update(db).await?)
}

pub async fn reset_access_failures<C: ConnectionTrait>(
    db: &C,
    user: users::Model,
) -> AppResult<users::Model> {
    if user.access_failed_count == 0 && user.lockout_end.is_none() {
        return Ok(user);
    }
    let mut active = user.into_active_model();
    active.access_failed_count = Set(0);
    active.lockout_end = Set(None);
    Ok(active.update(db).await?)
}

fn token_key(user_id: Uuid, name: &str) -> Condition {
    Condition::all()
        .add(TokenCol::UserId.eq(user_id))
        .add(TokenCol::LoginProvider.eq(LOGIN_PROVIDER))
        .add(TokenCol::Name.eq(name))
}

/// Stores the digest of `secret` in the user's `name` slot, overwriting any prior value.
pub async fn set_token<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    name: &str,
    secret: &str,
) -> AppResult<()> {
    let row = user_tokens::ActiveModel {
        user_id: Set(user_id),
        login_provider: Set(LOGIN_PROVIDER.to_string()),
        name: Set(name.to_string()),
        value: Set(hash_secret(secret)),
        created_at: Set(Utc::now().into()),
    };
    UserTokens::insert(row)
        .on_conflict(
            OnConflict::columns([TokenCol::UserId, TokenCol::LoginProvider, TokenCol::Name])
                .update_columns([TokenCol::Value, TokenCol::CreatedAt])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

pub async fn find_token<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    name: &str,
) -> AppResult<Option<user_tokens::Model>> {
    Ok(UserTokens::find()
        .filter(token_key(user_id, name))
        .one(db)
        .await?)
}

/// Deletes the slot if it holds `secret` and is younger than `max_age`; true when it did.
pub async fn consume_token<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    name: &str,
    secret: &str,
    max_age: Duration,
) -> AppResult<bool> {
    let Some(stored) = find_token(db, user_id, name).await? else {
        return Ok(false);
    };
    let digest = hash_secret(secret);
    let fresh = stored.created_at.with_timezone(&Utc) + max_age > Utc::now();
    if !fresh || stored.value != digest {
        return Ok(false);
    }
    let result = UserTokens::delete_many()
        .filter(token_key(user_id, name).add(TokenCol::Value.eq(digest)))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Swaps `expected` for `replacement` only if `expected` is still the stored value.
pub async fn rotate_token<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    name: &str,
    expected: &str,
    replacement: &str,
) -> AppResult<bool> {
    let result = UserTokens::update_many()
        .col_expr(TokenCol::Value, Expr::value(hash_secret(replacement)))
        .col_expr(
            TokenCol::CreatedAt,
            Expr::value(DateTime::<FixedOffset>::from(Utc::now())),
        )
        .filter(token_key(user_id, name).add(TokenCol::Value.eq(hash_secret(expected))))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

pub async fn remove_token<C: ConnectionTrait>(db: &C, user_id: Uuid, name: &str) -> AppResult<()> {
    UserTokens::delete_many()
        .filter(token_key(user_id, name))
        .exec(db)
        .await?;
    Ok(())
}
