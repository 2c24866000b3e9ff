/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, SECRET, timeouts など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;

use crate::middleware::http::HttpSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Where the signing secret came from. Logged at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    Env,
    Generated,
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub database_url: String,
    pub database_max_connections: u32,

    // HS256 signing key for bearer tokens. Immutable once the process is up.
    pub secret: Vec<u8>,
    pub secret_source: SecretSource,

    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the secret or credentials embedded in the database url
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("database_max_connections", &self.database_max_connections)
            .field("secret_source", &self.secret_source)
            .field("request_timeout", &self.request_timeout)
            .field("shutdown_grace", &self.shutdown_grace)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let database_max_connections = parse_or("DATABASE_MAX_CONNECTIONS", 16)?;

        let (secret, secret_source) = match std::env::var("SECRET") {
            Ok(s) if !s.is_empty() => (s.into_bytes(), SecretSource::Env),
            _ if app_env.is_production() => return Err(ConfigError::Missing("SECRET")),
            _ => (generate_secret()?, SecretSource::Generated),
        };

        let request_timeout = Duration::from_secs(parse_or("REQUEST_TIMEOUT_SECONDS", 60)?);
        let shutdown_grace = Duration::from_secs(parse_or("SHUTDOWN_GRACE_SECONDS", 10)?);

        Ok(Self {
            addr,
            app_env,
            database_url,
            database_max_connections,
            secret,
            secret_source,
            request_timeout,
            shutdown_grace,
        })
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            request_timeout: self.request_timeout,
            ..HttpSettings::default()
        }
    }
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

// Tokens signed with a generated secret do not survive a restart.
fn generate_secret() -> Result<Vec<u8>, ConfigError> {
    let mut bytes = [0u8; 20];
    getrandom::fill(&mut bytes).map_err(|_| ConfigError::Invalid("SECRET"))?;
    Ok(URL_SAFE.encode(bytes).into_bytes())
}
