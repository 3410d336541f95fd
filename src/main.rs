use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dealer_adapt_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    mailer::LogEmailSender,
    routes::create_app,
    seed,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dealer_adapt_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url, config.database_max_connections).await?;
    run_migrations(&orm).await?;
    seed::run(&orm, &config.seed).await?;

    tokio::fs::create_dir_all(config.car_images_dir()).await?;
    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    let mailer = Arc::new(LogEmailSender::new(config.sender_name.clone()));
    let state = AppState::new(orm, config, mailer)?;
    let app = create_app(state);

    tracing::info!("listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
