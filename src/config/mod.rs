use serde::Deserialize;
use std::env;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    /// `text` или `json`.
    pub log_format: String,
    /// `*` разрешает любой origin.
    pub cors_allow_origin: String,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub acquire_timeout_secs: u64,
}

// Настройки JWT. Токены выпускает внешний identity provider, здесь только проверка.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub leeway_secs: u64,
}

impl Config {
    /// Читает конфигурацию из окружения процесса.
    ///
    /// Имена переменных плоские, как в деплое (`PORT`, `DATABASE_URL`, ...).
    /// `DATABASE_URL` и `JWT_SECRET` обязательны.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 8000)?
            .set_default("app.environment", "development")?
            .set_default("app.rust_log", "cinema_booking=debug,tower_http=debug")?
            .set_default("app.log_format", "text")?
            .set_default("app.cors_allow_origin", "*")?
            .set_default("database.pool_size", 20)?
            .set_default("database.acquire_timeout_secs", 5)?
            .set_default("jwt.leeway_secs", 30)?
            .set_override_option("app.host", env::var("HOST").ok())?
            .set_override_option("app.port", env::var("PORT").ok())?
            .set_override_option("app.environment", env::var("ENVIRONMENT").ok())?
            .set_override_option("app.rust_log", env::var("RUST_LOG").ok())?
            .set_override_option("app.log_format", env::var("LOG_FORMAT").ok())?
            .set_override_option("app.cors_allow_origin", env::var("CORS_ALLOW_ORIGIN").ok())?
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("database.pool_size", env::var("DB_POOL_SIZE").ok())?
            .set_override_option(
                "database.acquire_timeout_secs",
                env::var("DB_ACQUIRE_TIMEOUT_SECS").ok(),
            )?
            .set_override_option("jwt.secret", env::var("JWT_SECRET").ok())?
            .set_override_option("jwt.leeway_secs", env::var("JWT_LEEWAY_SECS").ok())?
            .build()?
            .try_deserialize()
    }

    pub fn is_json_logging(&self) -> bool {
        self.app.log_format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Конфигурация без чтения окружения, для тестов на хранилище в памяти.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Config {
            app: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                environment: "test".to_string(),
                rust_log: "cinema_booking=debug".to_string(),
                log_format: "text".to_string(),
                cors_allow_origin: "*".to_string(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/unused".to_string(),
                pool_size: 1,
                acquire_timeout_secs: 1,
            },
            jwt: JwtConfig {
                secret: jwt_secret.to_string(),
                leeway_secs: 0,
            },
        }
    }
}
