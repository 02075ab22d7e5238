use crate::db::DbPool;
use anyhow::Context;
use chrono::Duration;
use oauth2::basic::BasicClient;
use std::{str::FromStr, sync::Arc};
use tokio::sync::broadcast;

use crate::{
    auth::{
        auth_repository::{ApiKeyRepository, RefreshTokenRepository},
        auth_service::AuthService,
        create_oauth_client,
        jwt::TokenSettings,
    },
    feature_request::{FeatureRequestRepository, FeatureRequestService},
    file::{file_repository::FileRepository, file_service::FileService},
    message::{MessageRepository, MessageService},
    note::NoteRepository,
    notification::{Mailer, NotificationRepository, NotificationService},
    room::{room_repository::RoomRepository, room_service::RoomService},
    search::SearchService,
    storage::FileStorage,
    task::{
        task_repository::{CommentRepository, TaskRepository},
        task_service::TaskService,
    },
    user::{user_repository::UserRepository, user_service::UserService},
    websocket::ConnectionManager,
};

const NOTIFICATION_CHANNEL_CAPACITY: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub oauth_client: BasicClient,
    pub http_client: reqwest::Client,
    pub ws_connections: ConnectionManager,
    pub storage: FileStorage,
    pub user_repository: UserRepository,
    pub note_repository: NoteRepository,
    pub auth_service: AuthService,
    pub room_service: RoomService,
    pub task_service: TaskService,
    pub user_service: UserService,
    pub notification_service: NotificationService,
    pub message_service: MessageService,
    pub file_service: FileService,
    pub feature_request_service: FeatureRequestService,
    pub search_service: SearchService,
}

impl AppState {
    /// Wires repositories and services on top of a pool.
    pub fn build(db: DbPool, config: Config) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let oauth_client = create_oauth_client(
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.google_redirect_uri.clone(),
        )?;
        let mailer = Mailer::from_config(&config.email)?;
        let storage = FileStorage::new(&config.media_root);
        let ws_connections = ConnectionManager::new();
        let (notification_tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);

        // Repositories
        let user_repository = UserRepository::new(db.clone());
        let room_repository = RoomRepository::new(db.clone());
        let note_repository = NoteRepository::new(db.clone());

        // Services
        let room_service = RoomService::new(db.clone(), room_repository.clone());
        let notification_service = NotificationService::new(
            NotificationRepository::new(db.clone()),
            room_repository.clone(),
            mailer,
            notification_tx,
        );
        let task_service = TaskService::new(
            db.clone(),
            TaskRepository::new(db.clone()),
            CommentRepository::new(db.clone()),
            room_service.clone(),
            room_repository.clone(),
            user_repository.clone(),
            notification_service.clone(),
        );
        let user_service = UserService::new(
            user_repository.clone(),
            room_service.clone(),
            task_service.clone(),
        );
        let auth_service = AuthService::new(
            db.clone(),
            user_repository.clone(),
            RefreshTokenRepository::new(db.clone()),
            ApiKeyRepository::new(db.clone()),
            config.token_settings(),
        );
        let message_service = MessageService::new(
            MessageRepository::new(db.clone()),
            room_service.clone(),
            storage.clone(),
            ws_connections.clone(),
        );
        let file_service = FileService::new(
            FileRepository::new(db.clone()),
            room_service.clone(),
            storage.clone(),
        );
        let feature_request_service = FeatureRequestService::new(
            FeatureRequestRepository::new(db.clone()),
            room_service.clone(),
        );
        let search_service = SearchService::new(room_repository);

        Ok(Self {
            config,
            oauth_client,
            http_client: reqwest::Client::new(),
            ws_connections,
            storage,
            user_repository,
            note_repository,
            auth_service,
            room_service,
            task_service,
            user_service,
            notification_service,
            message_service,
            file_service,
            feature_request_service,
            search_service,
        })
    }
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    /// `console` or `smtp`
    pub backend: String,
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            backend: "console".to_string(),
            host: None,
            port: 587,
            user: None,
            password: None,
            from: "noreply@coloby.local".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_redirect_uri: String,
    pub media_root: String,
    pub max_upload_bytes: usize,
    pub cookie_secure: bool,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
    pub email: EmailConfig,
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn required_env(key: &str) -> anyhow::Result<String> {
    optional_env(key).with_context(|| format!("{} must be set", key))
}

fn parsed_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}

impl Config {
    /// Local defaults for everything but the database and the signing key.
    pub fn with_defaults(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            jwt_secret: jwt_secret.into(),
            access_token_minutes: 15,
            refresh_token_days: 7,
            google_client_id: String::new(),
            google_client_secret: String::new(),
            google_redirect_uri: "http://localhost:3000/api/google-login/callback".to_string(),
            media_root: "./media".to_string(),
            max_upload_bytes: 25 * 1024 * 1024,
            cookie_secure: false,
            cors_allowed_origins: Vec::new(),
            email: EmailConfig::default(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::with_defaults(required_env("DATABASE_URL")?, required_env("JWT_SECRET")?);

        let email_user = optional_env("EMAIL_HOST_USER");
        let email = EmailConfig {
            backend: optional_env("EMAIL_BACKEND").unwrap_or(defaults.email.backend),
            host: optional_env("EMAIL_HOST"),
            port: parsed_env("EMAIL_PORT", defaults.email.port)?,
            password: optional_env("EMAIL_HOST_PASSWORD"),
            from: optional_env("EMAIL_FROM")
                .or_else(|| email_user.clone())
                .unwrap_or(defaults.email.from),
            user: email_user,
        };

        Ok(Self {
            host: optional_env("HOST").unwrap_or(defaults.host),
            port: parsed_env("PORT", defaults.port)?,
            access_token_minutes: parsed_env("ACCESS_TOKEN_MINUTES", defaults.access_token_minutes)?,
            refresh_token_days: parsed_env("REFRESH_TOKEN_DAYS", defaults.refresh_token_days)?,
            google_client_id: required_env("GOOGLE_CLIENT_ID")?,
            google_client_secret: required_env("GOOGLE_CLIENT_SECRET")?,
            google_redirect_uri: required_env("GOOGLE_REDIRECT_URI")?,
            media_root: optional_env("MEDIA_ROOT").unwrap_or(defaults.media_root),
            max_upload_bytes: parsed_env("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            cookie_secure: parsed_env("COOKIE_SECURE", defaults.cookie_secure)?,
            cors_allowed_origins: optional_env("CORS_ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            email,
            ..defaults
        })
    }

    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            secret: self.jwt_secret.clone(),
            access_ttl: Duration::minutes(self.access_token_minutes),
            refresh_ttl: Duration::days(self.refresh_token_days),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_settings_follow_config() {
        let mut config = Config::with_defaults("postgres://localhost/coloby", "secret");
        config.access_token_minutes = 5;
        let settings = config.token_settings();
        assert_eq!(settings.access_ttl, Duration::minutes(5));
        assert_eq!(settings.refresh_ttl, Duration::days(7));
        assert_eq!(settings.secret, "secret");
    }

    #[test]
    fn test_defaults() {
        let config = Config::with_defaults("postgres://localhost/coloby", "secret");
        assert_eq!(config.addr(), "127.0.0.1:3000");
        assert_eq!(config.max_upload_bytes, 26_214_400);
        assert_eq!(config.email.backend, "console");
        assert!(config.cors_allowed_origins.is_empty());
    }
}
