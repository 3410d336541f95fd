//! Startup data: the role catalog, the owner account and a sample inventory.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, PaginatorTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    config::SeedSettings,
    entity::{Cars, cars, roles},
    middleware::auth::PRIVILEGED_ROLE,
    services::identity::{self, NewUser},
};

pub const ROLE_NAMES: [&str; 3] = ["Customer", "Salesman", PRIVILEGED_ROLE];
pub const SAMPLE_CAR_COUNT: i32 = 100;

pub async fn seed_roles<C: ConnectionTrait>(db: &C) -> anyhow::Result<()> {
    for name in ROLE_NAMES {
        if identity::role_exists(db, name).await? {
            continue;
        }
        roles::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
        }
        .insert(db)
        .await?;
        tracing::info!(role = name, "seeded role");
    }
    Ok(())
}

/// Creates the owner account unless a user with that email already exists.
pub async fn seed_owner<C: ConnectionTrait>(db: &C, settings: &SeedSettings) -> anyhow::Result<Uuid> {
    if let Some(existing) = identity::find_by_email(db, &settings.owner_email).await? {
        return Ok(existing.id);
    }
    let owner = identity::create(
        db,
        NewUser {
            email: settings.owner_email.clone(),
            password: settings.owner_password.clone(),
            first_name: "Owner".to_string(),
            last_name: None,
            phone_number: None,
            date_of_birth: None,
            email_confirmed: true,
            role: Some(PRIVILEGED_ROLE.to_string()),
        },
    )
    .await?;
    tracing::info!(user_id = %owner.id, email = %owner.email, "seeded owner account");
    Ok(owner.id)
}

/// Fills an empty inventory with `SAMPLE_CAR_COUNT` cars; prices run 10100..=20000 in steps of 100.
pub async fn seed_sample_cars<C>(db: &C) -> anyhow::Result<u64>
where
    C: ConnectionTrait + TransactionTrait,
{
    if Cars::find().count(db).await? > 0 {
        return Ok(0);
    }

    let txn = db.begin().await?;
    let now = Utc::now();
    for i in 1..=SAMPLE_CAR_COUNT {
        cars::ActiveModel {
            id: Set(Uuid::new_v4()),
            make: Set(format!("Make{}", i % 10)),
            model: Set(format!("Model{}", i % 20)),
            year: Set(Some(2000 + (i % 21))),
            color: Set(Some(format!("Color{}", i % 5))),
            price: Set(Some(f64::from(10000 + i * 100))),
            created_at: Set(now.into()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }
    txn.commit().await?;
    tracing::info!(count = SAMPLE_CAR_COUNT, "seeded sample cars");
    Ok(SAMPLE_CAR_COUNT as u64)
}

/// Everything the server needs before it accepts requests.
pub async fn run<C>(db: &C, settings: &SeedSettings) -> anyhow::Result<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    seed_roles(db).await?;
    seed_owner(db, settings).await?;
    seed_sample_cars(db).await?;
    Ok(())
}
