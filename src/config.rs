//! Application configuration management.
//!
//! Configuration is read from environment variables with the `envy` crate
//! (a `.env` file is honoured through `dotenvy`), then command line flags
//! parsed with `clap` override individual values.

use clap::Parser;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (optional): PostgreSQL connection string; when set it wins
///   over the individual `DB_*` variables
/// - `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER`, `DB_PASSWORD`: connection
///   parts, defaulting to `localhost`, `5432`, `psdb`, `postgres`, `postgres`
/// - `DB_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `HTTP_PORT` (optional): HTTP server port, defaults to 8000
/// - `HTTP_ADDR` (optional): full listen address, overrides `HTTP_PORT`
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: Option<String>,

    #[serde(default = "default_db_host")]
    pub db_host: String,

    #[serde(default = "default_db_port")]
    pub db_port: u16,

    #[serde(default = "default_db_name")]
    pub db_name: String,

    #[serde(default = "default_db_user")]
    pub db_user: String,

    #[serde(default = "default_db_password")]
    pub db_password: String,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    pub http_addr: Option<String>,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "psdb".to_string()
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_password() -> String {
    "postgres".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_http_port() -> u16 {
    8000
}

/// Command line flags. Every flag overrides its environment variable.
#[derive(Debug, Default, Parser)]
#[command(name = "payment-system", about = "Account balances, payment history and transfers")]
pub struct Cli {
    /// HTTP listen address, e.g. 0.0.0.0:8000
    #[arg(long)]
    pub http_addr: Option<String>,

    /// PostgreSQL host
    #[arg(long)]
    pub db_host: Option<String>,

    /// PostgreSQL port
    #[arg(long)]
    pub db_port: Option<u16>,

    /// PostgreSQL database name
    #[arg(long)]
    pub db_name: Option<String>,

    /// PostgreSQL user
    #[arg(long)]
    pub db_user: Option<String>,

    /// PostgreSQL password
    #[arg(long)]
    pub db_password: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed into its expected type.
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        envy::from_env::<Config>()
    }

    /// Load configuration from explicit key/value pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }

    /// Apply command line overrides.
    pub fn with_cli(mut self, cli: Cli) -> Self {
        if let Some(addr) = cli.http_addr {
            self.http_addr = Some(addr);
        }
        if let Some(host) = cli.db_host {
            self.db_host = host;
        }
        if let Some(port) = cli.db_port {
            self.db_port = port;
        }
        if let Some(name) = cli.db_name {
            self.db_name = name;
        }
        if let Some(user) = cli.db_user {
            self.db_user = user;
        }
        if let Some(password) = cli.db_password {
            self.db_password = password;
        }
        self
    }

    /// Address the HTTP server binds to.
    pub fn listen_addr(&self) -> String {
        self.http_addr
            .clone()
            .unwrap_or_else(|| format!("0.0.0.0:{}", self.http_port))
    }

    /// PostgreSQL connection options.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is set but is not a valid URL.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        if let Some(url) = &self.database_url {
            return url.parse();
        }

        Ok(PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .database(&self.db_name)
            .username(&self.db_user)
            .password(&self.db_password))
    }
}
