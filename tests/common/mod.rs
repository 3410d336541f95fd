#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use dealer_adapt_api::{
    config::{AppConfig, AppEnv, JwtSettings, SeedSettings},
    db::{create_orm_conn, run_migrations},
    error::AppError,
    mailer::{EmailMessage, EmailSender},
    middleware::api_key::API_KEY_HEADER,
    routes::create_app,
    seed,
    state::AppState,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_API_KEY: &str = "test-api-key";
pub const OWNER_EMAIL: &str = "owner@example.com";
pub const OWNER_PASSWORD: &str = "Owner!234";
pub const PASSWORD: &str = "Passw0rd!";

/// Keeps every message instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("mailer lock").clone()
    }

    /// `token` query parameter of the link in the last message sent to `to`.
    pub fn last_token_for(&self, to: &str) -> String {
        let message = self
            .sent()
            .into_iter()
            .rev()
            .find(|message| message.to == to)
            .expect("no mail for recipient");
        let link = link_in(&message.body);
        let url = url::Url::parse(&link).expect("link is a url");
        url.query_pairs()
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
            .expect("link carries a token")
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), AppError> {
        self.sent.lock().expect("mailer lock").push(message);
        Ok(())
    }
}

/// The href of the first anchor in a mail body.
pub fn link_in(body: &str) -> String {
    let start = body.find("href='").expect("mail has a link") + "href='".len();
    let end = body[start..].find('\'').expect("link is terminated") + start;
    body[start..end].to_string()
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    _content_dir: TempDir,
}

pub fn test_config(content_dir: &std::path::Path, require_email_confirmation: bool) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        database_max_connections: 1,
        host: "127.0.0.1".to_string(),
        port: 0,
        env: AppEnv::Development,
        jwt: JwtSettings {
            key: "a-test-signing-key-that-is-long-enough-for-hs256".to_string(),
            issuer: "dealer-adapt-tests".to_string(),
            audience: "dealer-adapt-tests".to_string(),
            access_token_minutes: 15,
        },
        api_key: TEST_API_KEY.to_string(),
        cors_allowed_origins: vec!["http://localhost:5173".to_string()],
        content_dir: content_dir.to_path_buf(),
        public_base_url: "http://localhost:3000".to_string(),
        require_email_confirmation,
        sender_name: "Dealer Adapt Tests".to_string(),
        seed: SeedSettings {
            owner_email: OWNER_EMAIL.to_string(),
            owner_password: OWNER_PASSWORD.to_string(),
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::build(false).await
    }

    pub async fn spawn_with_email_confirmation() -> Self {
        Self::build(true).await
    }

    async fn build(require_email_confirmation: bool) -> Self {
        let content_dir = tempfile::tempdir().expect("temp content dir");
        let config = test_config(content_dir.path(), require_email_confirmation);

        // One connection: every pooled connection to `sqlite::memory:` is a separate database.
        let orm = create_orm_conn(&config.database_url, 1)
            .await
            .expect("sqlite connection");
        run_migrations(&orm).await.expect("migrations");
        seed::seed_roles(&orm).await.expect("roles");
        seed::seed_owner(&orm, &config.seed).await.expect("owner");

        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(orm, config, mailer.clone()).expect("state");
        let router = create_app(state.clone());

        Self {
            router,
            state,
            mailer,
            _content_dir: content_dir,
        }
    }

    /// Runs a request through the full router and decodes the JSON body (`Null` when empty).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("response body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(API_KEY_HEADER, TEST_API_KEY);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), None).await
    }

    pub async fn register(&self, email: &str) -> (StatusCode, Value) {
        self.post_json(
            "/api/account/register",
            json!({
                "email": email,
                "password": PASSWORD,
                "confirmPassword": PASSWORD,
                "firstName": "Test",
                "lastName": "User"
            }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post_json(
            "/api/account/login",
            json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Registers `email` and returns the login payload.
    pub async fn registered_user(&self, email: &str) -> Value {
        let (status, body) = self.register(email).await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        let (status, body) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"].clone()
    }

    pub async fn owner_token(&self) -> String {
        let (status, body) = self.login(OWNER_EMAIL, OWNER_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "owner login failed: {body}");
        body["data"]["token"]
            .as_str()
            .expect("owner token")
            .to_string()
    }

    /// Creates a car through the multipart endpoint and returns its JSON.
    pub async fn create_car(&self, make: &str, images: usize) -> Value {
        let files: Vec<(String, Vec<u8>)> = (0..images)
            .map(|i| (format!("photo{i}.jpg"), vec![0xFF, 0xD8, i as u8, 0xD9]))
            .collect();
        let (status, body) = self
            .upload_car(&[("make", make), ("model", "Civic"), ("year", "2020"), ("price", "15000")], &files)
            .await;
        assert_eq!(status, StatusCode::CREATED, "create car failed: {body}");
        body["data"].clone()
    }

    pub async fn upload_car(
        &self,
        fields: &[(&str, &str)],
        files: &[(String, Vec<u8>)],
    ) -> (StatusCode, Value) {
        let (content_type, body) = multipart_body(fields, files);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/car")
            .header(API_KEY_HEADER, TEST_API_KEY)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .expect("request");
        self.send(request).await
    }
}

const BOUNDARY: &str = "----dealer-adapt-test-boundary";

/// A `multipart/form-data` body with text fields followed by `imageFiles` parts.
pub fn multipart_body(fields: &[(&str, &str)], files: &[(String, Vec<u8>)]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"imageFiles\"; filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}
