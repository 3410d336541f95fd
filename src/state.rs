use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::OrmConn,
    mailer::EmailSender,
    services::token_service::TokenService,
    storage::ImageStore,
};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub mailer: Arc<dyn EmailSender>,
    pub images: ImageStore,
}

impl AppState {
    /// Builds the shared state; fails when the token settings are unusable.
    pub fn new(
        orm: OrmConn,
        config: AppConfig,
        mailer: Arc<dyn EmailSender>,
    ) -> anyhow::Result<Self> {
        let tokens = TokenService::new(&config.jwt)?;
        let images = ImageStore::new(config.car_images_dir(), "/CarImages");
        Ok(Self {
            orm,
            config: Arc::new(config),
            tokens,
            mailer,
            images,
        })
    }
}
