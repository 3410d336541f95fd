use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::favorites::{AddFavoriteQuery, FavoriteCar, FavoriteList, FavoriteWithCar},
    entity::{
        Cars, Favorites, Pictures, Users,
        favorites::{self, Column as FavCol},
        pictures::Column as PicCol,
    },
    error::{AppError, AppResult},
    models::Favorite,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Most recent first, each with a summary of the car and its cover image URL.
pub async fn list_favorites(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<ApiResponse<FavoriteList>> {
    let rows = Favorites::find()
        .filter(FavCol::UserId.eq(user_id))
        .order_by_desc(FavCol::CreatedAt)
        .find_also_related(Cars)
        .all(&state.orm)
        .await?;
    if rows.is_empty() {
        return Err(AppError::NotFound("No favorites found"));
    }

    let cover_ids: Vec<Uuid> = rows
        .iter()
        .filter_map(|(_, car)| car.as_ref().and_then(|car| car.cover_image_id))
        .collect();
    let cover_urls: HashMap<Uuid, String> = if cover_ids.is_empty() {
        HashMap::new()
    } else {
        Pictures::find()
            .filter(PicCol::Id.is_in(cover_ids))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|picture| (picture.id, picture.url))
            .collect()
    };

    let items: Vec<FavoriteWithCar> = rows
        .into_iter()
        .filter_map(|(favorite, car)| {
            let car = car?;
            Some(FavoriteWithCar {
                id: favorite.id,
                user_id: favorite.user_id,
                car_id: favorite.car_id,
                date_time: favorite.created_at.with_timezone(&Utc),
                car: FavoriteCar {
                    cover_image_url: car
                        .cover_image_id
                        .and_then(|id| cover_urls.get(&id).cloned()),
                    id: car.id,
                    make: car.make,
                    model: car.model,
                    mileage: car.mileage,
                    price: car.price,
                    year: car.year,
                },
            })
        })
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Favorites",
        FavoriteList { items },
        Some(Meta {
            page: None,
            per_page: None,
            total: Some(total),
        }),
    ))
}

/// Duplicate (user, car) pairs are accepted; each call adds a new entry.
pub async fn add_favorite(
    state: &AppState,
    query: AddFavoriteQuery,
) -> AppResult<ApiResponse<Favorite>> {
    if Cars::find_by_id(query.car_id).one(&state.orm).await?.is_none() {
        return Err(AppError::bad_request("Car not found."));
    }
    if Users::find_by_id(query.user_id).one(&state.orm).await?.is_none() {
        return Err(AppError::bad_request("User not found."));
    }

    let favorite = favorites::ActiveModel {
        id: Set(Uuid::new_v4()),
        car_id: Set(query.car_id),
        user_id: Set(query.user_id),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(user_id = %favorite.user_id, car_id = %favorite.car_id, "favorite added");
    Ok(ApiResponse::success(
        "Added to favorites",
        Favorite::from(favorite),
        Some(Meta::empty()),
    ))
}

pub async fn remove_favorite(state: &AppState, id: Uuid) -> AppResult<()> {
    let result = Favorites::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Favorite not found"));
    }
    Ok(())
}
