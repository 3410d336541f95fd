use std::{env, path::PathBuf};

use anyhow::{Context, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "development" | "dev" => AppEnv::Development,
            _ => AppEnv::Production,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub key: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct SeedSettings {
    pub owner_email: String,
    pub owner_password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub env: AppEnv,
    pub jwt: JwtSettings,
    pub api_key: String,
    pub cors_allowed_origins: Vec<String>,
    pub content_dir: PathBuf,
    pub public_base_url: String,
    pub require_email_confirmation: bool,
    pub sender_name: String,
    pub seed: SeedSettings,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let env_name = env::var("APP_ENV").unwrap_or_else(|_| "production".to_string());

        let jwt = JwtSettings {
            key: required("JWT_KEY")?,
            issuer: required("JWT_ISSUER")?,
            audience: required("JWT_AUDIENCE")?,
            access_token_minutes: env::var("JWT_ACCESS_TOKEN_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(60),
        };

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            database_url,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            host,
            port,
            env: AppEnv::parse(&env_name),
            jwt,
            api_key: required("API_KEY")?,
            cors_allowed_origins,
            content_dir: env::var("CONTENT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("wwwroot")),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{port}")),
            require_email_confirmation: env::var("REQUIRE_EMAIL_CONFIRMATION")
                .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes"))
                .unwrap_or(false),
            sender_name: env::var("SMTP_SENDER_NAME")
                .unwrap_or_else(|_| "Dealer Adapt".to_string()),
            seed: SeedSettings {
                owner_email: env::var("SEED_OWNER_EMAIL")
                    .unwrap_or_else(|_| "user@example.com".to_string()),
                owner_password: env::var("SEED_OWNER_PASSWORD")
                    .unwrap_or_else(|_| "sS!1tring".to_string()),
            },
        })
    }

    pub fn is_development(&self) -> bool {
        self.env == AppEnv::Development
    }

    /// Directory uploaded car images are written to.
    pub fn car_images_dir(&self) -> PathBuf {
        self.content_dir.join("CarImages")
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    let value = env::var(name).with_context(|| format!("{name} is not set"))?;
    if value.trim().is_empty() {
        bail!("{name} must not be empty");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::AppEnv;

    #[test]
    fn unknown_environment_names_fall_back_to_production() {
        assert_eq!(AppEnv::parse("Development"), AppEnv::Development);
        assert_eq!(AppEnv::parse("dev"), AppEnv::Development);
        assert_eq!(AppEnv::parse("staging"), AppEnv::Production);
    }
}
