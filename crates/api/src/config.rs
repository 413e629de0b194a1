use std::path::PathBuf;
use std::str::FromStr;

use roomvid_core::access::{ListScope, VideoAccessPolicy};
use roomvid_core::upload::DEFAULT_MAX_UPLOAD_BYTES;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins; a single `*` allows any origin.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`, long enough for uploads).
    pub request_timeout_secs: u64,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub upload: UploadConfig,
    pub access: VideoAccessPolicy,
    /// Create the default admin and sample rooms on an empty database.
    pub seed_defaults: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Root directory for stored video files.
    pub dir: PathBuf,
    /// Largest accepted video file in bytes.
    pub max_file_size: u64,
}

impl UploadConfig {
    /// Request body limit for the upload route: the file plus multipart framing.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_file_size.saturating_add(MULTIPART_OVERHEAD_BYTES))
            .unwrap_or(usize::MAX)
    }
}

/// Slack allowed on top of `max_file_size` for multipart headers and fields.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT` (`text` or `json`, default `text`).
    ///
    /// Read separately from [`ServerConfig`] because logging is initialised
    /// before the rest of the configuration.
    pub fn from_env() -> Self {
        match env_or("LOG_FORMAT", "text").to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                              |
    /// |------------------------|--------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                            |
    /// | `PORT`                 | `8080`                               |
    /// | `CORS_ORIGINS`         | `*`                                  |
    /// | `REQUEST_TIMEOUT_SECS` | `300`                                |
    /// | `DATABASE_URL`         | built from `DB_*` (see below)        |
    /// | `DB_MAX_CONNECTIONS`   | `20`                                 |
    /// | `UPLOAD_DIR`           | `./uploads`                          |
    /// | `MAX_FILE_SIZE`        | `1073741824`                         |
    /// | `VIDEO_LIST_SCOPE`     | `all`                                |
    /// | `STREAM_REQUIRES_AUTH` | `false`                              |
    /// | `SEED_DEFAULTS`        | `true`                               |
    ///
    /// When `DATABASE_URL` is unset the URL is assembled from `DB_HOST`
    /// (`localhost`), `DB_PORT` (`5432`), `DB_USER` (`postgres`),
    /// `DB_PASSWORD` (`password`), `DB_NAME` (`roomvid`) and `DB_SSLMODE`
    /// (`disable`).
    ///
    /// # Panics
    ///
    /// Panics on values that do not parse; misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = env_or("HOST", "0.0.0.0");
        let port: u16 = env_parse("PORT", "8080");

        let cors_origins = parse_origins(&env_or("CORS_ORIGINS", "*"));

        let request_timeout_secs: u64 = env_parse("REQUEST_TIMEOUT_SECS", "300");

        let database = DatabaseConfig {
            url: database_url_from_env(),
            max_connections: env_parse("DB_MAX_CONNECTIONS", "20"),
        };

        let upload = UploadConfig {
            dir: PathBuf::from(env_or("UPLOAD_DIR", "./uploads")),
            max_file_size: env_parse("MAX_FILE_SIZE", &DEFAULT_MAX_UPLOAD_BYTES.to_string()),
        };

        let access = VideoAccessPolicy {
            list_scope: env_parse::<ListScope>("VIDEO_LIST_SCOPE", "all"),
            stream_requires_auth: env_parse("STREAM_REQUIRES_AUTH", "false"),
        };

        let seed_defaults: bool = env_parse("SEED_DEFAULTS", "true");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database,
            jwt: JwtConfig::from_env(),
            upload,
            access,
            seed_defaults,
        }
    }

    /// Whether CORS should accept any origin.
    pub fn cors_allows_any(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

fn database_url_from_env() -> String {
    if let Some(url) = env_opt("DATABASE_URL") {
        return url;
    }
    format!(
        "postgres://{user}:{password}@{host}:{port}/{name}?sslmode={sslmode}",
        user = env_or("DB_USER", "postgres"),
        password = env_or("DB_PASSWORD", "password"),
        host = env_or("DB_HOST", "localhost"),
        port = env_or("DB_PORT", "5432"),
        name = env_or("DB_NAME", "roomvid"),
        sslmode = env_or("DB_SSLMODE", "disable"),
    )
}

/// An environment variable, treating an empty value as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_parse<T>(key: &str, default: &str) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env_or(key, default);
    raw.trim()
        .parse()
        .unwrap_or_else(|e| panic!("{key} has an invalid value '{raw}': {e}"))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a duration such as `90`, `45s`, `15m`, `24h` or `7d` into seconds.
pub fn parse_duration_secs(raw: &str) -> Result<i64, String> {
    let raw = raw.trim();
    let (digits, multiplier) = match raw.char_indices().last() {
        Some((idx, 's')) => (&raw[..idx], 1),
        Some((idx, 'm')) => (&raw[..idx], 60),
        Some((idx, 'h')) => (&raw[..idx], 60 * 60),
        Some((idx, 'd')) => (&raw[..idx], 24 * 60 * 60),
        Some(_) => (raw, 1),
        None => return Err("duration is empty".into()),
    };
    let value: i64 = digits
        .parse()
        .map_err(|_| format!("'{raw}' is not a duration (expected e.g. 30m, 24h, 7d)"))?;
    if value <= 0 {
        return Err(format!("'{raw}' must be greater than zero"));
    }
    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("'{raw}' is too large"))
}
