//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{
    CliArgs, Command, DatabaseOverride, MigrateArgs, NotionOverrides, ServeArgs, ServeOverrides,
};

use std::{net::SocketAddr, num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::retry::RetryPolicy;
use crate::domain::types::BodyFormat;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "folio";
const ENV_PREFIX: &str = "FOLIO";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_NOTION_API_BASE_URL: &str = "https://api.notion.com/v1/";
const DEFAULT_NOTION_API_VERSION: &str = "2022-06-28";
const DEFAULT_NOTION_TIMEOUT_SECS: u64 = 15;
const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 250;
const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 2_000;
const DEFAULT_VIEW_COOKIE_MAX_AGE_SECS: i64 = 86_400;
const DEFAULT_SITE_PUBLIC_URL: &str = "http://localhost:3000/";
const DEFAULT_SITE_TITLE: &str = "Folio";
const DEFAULT_ABOUT_FILE: &str = "content/about.toml";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub notion: NotionSettings,
    pub retry: RetrySettings,
    pub views: ViewsSettings,
    pub site: SiteSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// `None` selects the in-process counter store.
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct NotionSettings {
    pub token: Option<String>,
    pub posts_database_id: Option<String>,
    pub projects_database_id: Option<String>,
    pub api_base_url: Url,
    pub api_version: String,
    pub timeout: Duration,
    pub body_format: BodyFormat,
}

#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub max_attempts: NonZeroU32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.base_delay, self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct ViewsSettings {
    pub cookie_max_age: time::Duration,
    pub secure_cookies: bool,
}

impl Default for ViewsSettings {
    fn default() -> Self {
        Self {
            cookie_max_age: time::Duration::seconds(DEFAULT_VIEW_COOKIE_MAX_AGE_SECS),
            secure_cookies: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub public_url: Url,
    pub title: String,
    pub about_file: PathBuf,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Migrate(args)) => raw.apply_database_override(&args.database),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    notion: RawNotionSettings,
    retry: RawRetrySettings,
    views: RawViewsSettings,
    site: RawSiteSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(secure) = overrides.views_secure_cookies {
            self.views.secure_cookies = Some(secure);
        }
        if let Some(url) = overrides.site_public_url.as_ref() {
            self.site.public_url = Some(url.clone());
        }
        if let Some(path) = overrides.site_about_file.as_ref() {
            self.site.about_file = Some(path.clone());
        }

        self.apply_notion_overrides(&overrides.notion);
    }

    fn apply_notion_overrides(&mut self, overrides: &NotionOverrides) {
        if let Some(token) = overrides.token.as_ref() {
            self.notion.token = Some(token.clone());
        }
        if let Some(id) = overrides.posts_database_id.as_ref() {
            self.notion.posts_database_id = Some(id.clone());
        }
        if let Some(id) = overrides.projects_database_id.as_ref() {
            self.notion.projects_database_id = Some(id.clone());
        }
        if let Some(format) = overrides.body_format.as_ref() {
            self.notion.body_format = Some(format.clone());
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            notion,
            retry,
            views,
            site,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            notion: build_notion_settings(notion)?,
            retry: build_retry_settings(retry)?,
            views: build_views_settings(views)?,
            site: build_site_settings(site)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr =
        parse_socket_addr(&host, port).map_err(|reason| LoadError::invalid("server.host", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url);
    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_notion_settings(notion: RawNotionSettings) -> Result<NotionSettings, LoadError> {
    let base = notion
        .api_base_url
        .unwrap_or_else(|| DEFAULT_NOTION_API_BASE_URL.to_string());
    let api_base_url = parse_base_url(&base)
        .map_err(|reason| LoadError::invalid("notion.api_base_url", reason))?;

    let api_version = non_blank(notion.api_version)
        .unwrap_or_else(|| DEFAULT_NOTION_API_VERSION.to_string());

    let timeout_secs = notion.timeout_seconds.unwrap_or(DEFAULT_NOTION_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "notion.timeout_seconds",
            "must be greater than zero",
        ));
    }

    let body_format = match non_blank(notion.body_format) {
        Some(value) => BodyFormat::from_str(&value)
            .map_err(|reason| LoadError::invalid("notion.body_format", reason))?,
        None => BodyFormat::default(),
    };

    Ok(NotionSettings {
        token: non_blank(notion.token),
        posts_database_id: non_blank(notion.posts_database_id),
        projects_database_id: non_blank(notion.projects_database_id),
        api_base_url,
        api_version,
        timeout: Duration::from_secs(timeout_secs),
        body_format,
    })
}

fn build_retry_settings(retry: RawRetrySettings) -> Result<RetrySettings, LoadError> {
    let max_attempts = non_zero_u32(
        retry
            .max_attempts
            .unwrap_or(DEFAULT_RETRY_MAX_ATTEMPTS)
            .into(),
        "retry.max_attempts",
    )?;
    let base_delay =
        Duration::from_millis(retry.base_delay_ms.unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS));
    let max_delay = Duration::from_millis(retry.max_delay_ms.unwrap_or(DEFAULT_RETRY_MAX_DELAY_MS));
    if max_delay < base_delay {
        return Err(LoadError::invalid(
            "retry.max_delay_ms",
            "must not be smaller than retry.base_delay_ms",
        ));
    }

    Ok(RetrySettings {
        max_attempts,
        base_delay,
        max_delay,
    })
}

fn build_views_settings(views: RawViewsSettings) -> Result<ViewsSettings, LoadError> {
    let max_age = views
        .cookie_max_age_seconds
        .unwrap_or(DEFAULT_VIEW_COOKIE_MAX_AGE_SECS);
    if max_age <= 0 {
        return Err(LoadError::invalid(
            "views.cookie_max_age_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ViewsSettings {
        cookie_max_age: time::Duration::seconds(max_age),
        secure_cookies: views.secure_cookies.unwrap_or(false),
    })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let raw_url = non_blank(site.public_url).unwrap_or_else(|| DEFAULT_SITE_PUBLIC_URL.to_string());
    let public_url =
        parse_base_url(&raw_url).map_err(|reason| LoadError::invalid("site.public_url", reason))?;

    let about_file = site
        .about_file
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ABOUT_FILE));
    if about_file.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "site.about_file",
            "path must not be empty",
        ));
    }

    Ok(SiteSettings {
        public_url,
        title: non_blank(site.title).unwrap_or_else(|| DEFAULT_SITE_TITLE.to_string()),
        about_file,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawNotionSettings {
    token: Option<String>,
    posts_database_id: Option<String>,
    projects_database_id: Option<String>,
    api_base_url: Option<String>,
    api_version: Option<String>,
    timeout_seconds: Option<u64>,
    body_format: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRetrySettings {
    max_attempts: Option<u32>,
    base_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawViewsSettings {
    cookie_max_age_seconds: Option<i64>,
    secure_cookies: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    public_url: Option<String>,
    title: Option<String>,
    about_file: Option<PathBuf>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

/// Parse a base URL, making sure relative joins keep its last path segment.
fn parse_base_url(value: &str) -> Result<Url, String> {
    let trimmed = value.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&normalized).map_err(|err| format!("invalid url `{trimmed}`: {err}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme `{}`", url.scheme()));
    }
    Ok(url)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
