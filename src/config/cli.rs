use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the Folio binary.
#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Folio blog and portfolio server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FOLIO_CONFIG_FILE", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Apply pending database migrations and exit.
    Migrate(MigrateArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct NotionOverrides {
    /// Override the Notion integration token.
    #[arg(long = "notion-token", env = "NOTION_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Override the posts database id.
    #[arg(long = "notion-posts-database-id", env = "NOTION_DATABASE_ID", value_name = "ID")]
    pub posts_database_id: Option<String>,

    /// Override the projects database id.
    #[arg(
        long = "notion-projects-database-id",
        env = "NOTION_PROJECTS_DATABASE_ID",
        value_name = "ID"
    )]
    pub projects_database_id: Option<String>,

    /// Override how entry bodies are delivered (markdown|blocks).
    #[arg(long = "notion-body-format", value_name = "FORMAT")]
    pub body_format: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub notion: NotionOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Mark visitor cookies `Secure`.
    #[arg(
        long = "views-secure-cookies",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub views_secure_cookies: Option<bool>,

    /// Override the public site URL used in canonical links.
    #[arg(long = "site-public-url", value_name = "URL")]
    pub site_public_url: Option<String>,

    /// Override the about page data file.
    #[arg(long = "site-about-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub site_about_file: Option<PathBuf>,
}
