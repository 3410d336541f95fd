use dealer_adapt_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    seed,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url, 1).await?;
    run_migrations(&orm).await?;

    seed::seed_roles(&orm).await?;
    let owner_id = seed::seed_owner(&orm, &config.seed).await?;
    let cars = seed::seed_sample_cars(&orm).await?;

    println!("Seed completed. Owner ID: {owner_id}, cars added: {cars}");
    Ok(())
}
