use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, IntoActiveModel, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::cars::{CarFields, CarList, CarListQuery, CoverImageUrl, ImageUpload, UpdateCarRequest},
    entity::{
        Cars, Pictures,
        cars::{self, Column as CarCol},
        pictures::{self, Column as PicCol},
    },
    error::{AppError, AppResult},
    models::{Car, CarWithPictures, Picture},
    response::{ApiResponse, Meta},
    routes::params::{CarSortBy, SortOrder},
    state::AppState,
    validation::validate_picture_url,
};

pub const MAX_IMAGES: usize = 25;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub const TOO_MANY_IMAGES: &str = "You can upload up to 25 images.";
pub const IMAGE_TOO_LARGE: &str = "Each image file must be up to 5MB in size.";

/// Checks every upload before anything is persisted.
pub fn validate_images(images: &[ImageUpload]) -> AppResult<()> {
    if images.len() > MAX_IMAGES {
        return Err(AppError::field("imageFiles", TOO_MANY_IMAGES));
    }
    if images
        .iter()
        .any(|image| image.bytes.is_empty() || image.bytes.len() > MAX_IMAGE_BYTES)
    {
        return Err(AppError::field("imageFiles", IMAGE_TOO_LARGE));
    }
    Ok(())
}

pub async fn list_cars(state: &AppState, query: CarListQuery) -> AppResult<ApiResponse<CarList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let sort_col = match query.sort_by.unwrap_or(CarSortBy::CreatedAt) {
        CarSortBy::CreatedAt => CarCol::CreatedAt,
        CarSortBy::Price => CarCol::Price,
        CarSortBy::Year => CarCol::Year,
        CarSortBy::Mileage => CarCol::Mileage,
        CarSortBy::Make => CarCol::Make,
    };
    let mut finder = Cars::find();
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };
    finder = finder.order_by_asc(CarCol::Id);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Car::from)
        .collect();

    Ok(ApiResponse::success(
        "Cars",
        CarList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_car(state: &AppState, id: Uuid) -> AppResult<ApiResponse<CarWithPictures>> {
    let car = Cars::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Car not found"))?;
    let pictures = car
        .find_related(Pictures)
        .order_by_asc(PicCol::Url)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Picture::from)
        .collect();

    Ok(ApiResponse::success(
        "Car",
        CarWithPictures {
            car: Car::from(car),
            pictures,
        },
        Some(Meta::empty()),
    ))
}

/// Inserts the car and one picture per image in a single transaction.
///
/// Nothing is written when any image is rejected; if a write fails part-way the
/// files already on disk are removed and the transaction is rolled back.
pub async fn create_car(
    state: &AppState,
    fields: CarFields,
    images: Vec<ImageUpload>,
) -> AppResult<ApiResponse<CarWithPictures>> {
    fields.validate()?;
    validate_images(&images)?;

    let txn = state.orm.begin().await?;
    let mut written: Vec<String> = Vec::with_capacity(images.len());
    let outcome = insert_car_with_images(state, &txn, &fields, &images, &mut written).await;

    let committed = match outcome {
        Ok(created) => txn.commit().await.map(|_| created).map_err(AppError::from),
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    };

    match committed {
        Ok(created) => {
            tracing::info!(car_id = %created.car.id, images = written.len(), "car created");
            Ok(ApiResponse::success("Car created", created, Some(Meta::empty())))
        }
        Err(err) => {
            state.images.remove_all(&written).await;
            Err(err)
        }
    }
}

async fn insert_car_with_images(
    state: &AppState,
    txn: &DatabaseTransaction,
    fields: &CarFields,
    images: &[ImageUpload],
    written: &mut Vec<String>,
) -> AppResult<CarWithPictures> {
    let mut active = cars::ActiveModel {
        id: Set(Uuid::new_v4()),
        cover_image_id: Set(None),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };
    apply_fields(&mut active, fields);
    let car = active.insert(txn).await?;

    let mut pictures = Vec::with_capacity(images.len());
    for image in images {
        let file_name = state
            .images
            .build_file_name(fields, image.file_name.as_deref());
        state
            .images
            .write(&file_name, &image.bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to store image: {e}")))?;
        let url = state.images.url_for(&file_name);
        written.push(file_name);

        let picture = pictures::ActiveModel {
            id: Set(Uuid::new_v4()),
            url: Set(url),
            car_id: Set(Some(car.id)),
        }
        .insert(txn)
        .await?;
        pictures.push(Picture::from(picture));
    }

    Ok(CarWithPictures {
        car: Car::from(car),
        pictures,
    })
}

fn apply_fields(active: &mut cars::ActiveModel, fields: &CarFields) {
    active.make = Set(fields.make.clone());
    active.model = Set(fields.model.clone());
    active.mileage = Set(fields.mileage);
    active.price = Set(fields.price);
    active.color = Set(fields.color.clone());
    active.vin = Set(fields.vin.clone());
    active.average_yearly_maintenance_cost = Set(fields.average_yearly_maintenance_cost);
    active.description = Set(fields.description.clone());
    active.year = Set(fields.year);
    active.is_new = Set(fields.is_new);
}

/// Replaces every scalar field and, when a non-empty URL list is given, reconciles pictures.
pub async fn update_car(state: &AppState, id: Uuid, payload: UpdateCarRequest) -> AppResult<()> {
    if payload.id != id {
        return Err(AppError::bad_request("Car ID mismatch"));
    }
    payload.car.validate()?;
    let urls: Vec<String> = payload
        .list_of_picture_urls
        .unwrap_or_default()
        .into_iter()
        .map(|url| url.trim().to_string())
        .collect();
    for url in &urls {
        if validate_picture_url(url).is_err() {
            return Err(AppError::field(
                "list_of_picture_urls",
                format!("'{url}' is not a valid picture URL."),
            ));
        }
    }

    let txn = state.orm.begin().await?;
    let car = Cars::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Car not found"))?;
    let cover_image_id = car.cover_image_id;

    let mut active = car.into_active_model();
    apply_fields(&mut active, &payload.car);
    active.update(&txn).await?;

    let mut removed = Vec::new();
    if !urls.is_empty() {
        let wanted: HashSet<&str> = urls.iter().map(String::as_str).collect();
        let stale: Vec<pictures::Model> = Pictures::find()
            .filter(PicCol::CarId.eq(id))
            .all(&txn)
            .await?
            .into_iter()
            .filter(|picture| !wanted.contains(picture.url.as_str()))
            .collect();

        if stale.iter().any(|picture| Some(picture.id) == cover_image_id) {
            return Err(AppError::bad_request(
                "The cover image cannot be removed; choose another cover image first.",
            ));
        }
        if !stale.is_empty() {
            Pictures::delete_many()
                .filter(PicCol::Id.is_in(stale.iter().map(|picture| picture.id)))
                .exec(&txn)
                .await?;
        }

        let mut seen = HashSet::new();
        for url in urls.iter().filter(|url| seen.insert(url.as_str())) {
            let known = Pictures::find()
                .filter(PicCol::Url.eq(url.as_str()))
                .one(&txn)
                .await?
                .is_some();
            if !known {
                pictures::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    url: Set(url.clone()),
                    car_id: Set(Some(id)),
                }
                .insert(&txn)
                .await?;
            }
        }
        removed = stale;
    }
    txn.commit().await?;

    remove_picture_files(state, &removed).await;
    tracing::info!(car_id = %id, removed = removed.len(), "car updated");
    Ok(())
}

/// Deletes the car; its pictures and favorites go with it.
pub async fn delete_car(state: &AppState, id: Uuid) -> AppResult<()> {
    let txn = state.orm.begin().await?;
    let car = Cars::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Car not found"))?;
    let pictures = car.find_related(Pictures).all(&txn).await?;

    // The cover reference restricts picture deletion, so drop it first.
    if car.cover_image_id.is_some() {
        let mut active = car.into_active_model();
        active.cover_image_id = Set(None);
        active.update(&txn).await?;
    }
    Cars::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    remove_picture_files(state, &pictures).await;
    tracing::info!(car_id = %id, pictures = pictures.len(), "car deleted");
    Ok(())
}

async fn remove_picture_files(state: &AppState, pictures: &[pictures::Model]) {
    let names: Vec<&str> = pictures
        .iter()
        .filter_map(|picture| state.images.file_name_from_url(&picture.url))
        .collect();
    state.images.remove_all(names).await;
}

pub async fn set_cover_image(state: &AppState, id: Uuid, picture_id: Uuid) -> AppResult<()> {
    let car = Cars::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Car not found"))?;

    let picture = Pictures::find_by_id(picture_id).one(&state.orm).await?;
    if !picture.is_some_and(|picture| picture.car_id == Some(id)) {
        return Err(AppError::bad_request("Invalid cover image ID"));
    }

    let mut active = car.into_active_model();
    active.cover_image_id = Set(Some(picture_id));
    active.update(&state.orm).await?;
    Ok(())
}

pub async fn get_cover_image_url(
    state: &AppState,
    picture_id: Uuid,
) -> AppResult<ApiResponse<CoverImageUrl>> {
    let picture = Pictures::find_by_id(picture_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Picture not found"))?;
    Ok(ApiResponse::success(
        "Cover image",
        CoverImageUrl { url: picture.url },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(len: usize) -> ImageUpload {
        ImageUpload {
            file_name: Some("a.jpg".into()),
            bytes: vec![0u8; len],
        }
    }

    #[test]
    fn image_limits() {
        assert!(validate_images(&[]).is_ok());
        assert!(validate_images(&vec![image(1); MAX_IMAGES]).is_ok());
        assert!(validate_images(&vec![image(1); MAX_IMAGES + 1]).is_err());
        assert!(validate_images(&[image(MAX_IMAGE_BYTES)]).is_ok());
        assert!(validate_images(&[image(1), image(MAX_IMAGE_BYTES + 1)]).is_err());
        assert!(validate_images(&[image(0)]).is_err());
    }
}
