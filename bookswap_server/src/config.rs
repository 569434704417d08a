use std::{env, io::Write};

use bsw_common::{helpers::parse_boolean_flag, Secret};
use log::*;
use rand::{thread_rng, RngCore};
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_BSW_HOST: &str = "127.0.0.1";
const DEFAULT_BSW_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/bookswap.db";
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 25;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_db_connections: u32,
    /// The number of order events that may queue up for the notification hooks before publishers have to wait.
    pub event_buffer_size: usize,
    /// If true, pending database migrations are applied when the server starts.
    pub run_migrations: bool,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BSW_HOST.to_string(),
            port: DEFAULT_BSW_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_db_connections: DEFAULT_MAX_DB_CONNECTIONS,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            run_migrations: true,
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("BSW_HOST").ok().unwrap_or_else(|| DEFAULT_BSW_HOST.into());
        let port = parse_env_or("BSW_PORT", DEFAULT_BSW_PORT);
        let database_url = env::var("BSW_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ BSW_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_db_connections = parse_env_or("BSW_MAX_DB_CONNECTIONS", DEFAULT_MAX_DB_CONNECTIONS);
        let event_buffer_size = parse_env_or("BSW_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let run_migrations = parse_boolean_flag(env::var("BSW_RUN_MIGRATIONS").ok(), true);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        Self { host, port, database_url, max_db_connections, event_buffer_size, run_migrations, auth }
    }
}

/// Reads and parses `name` from the environment. A missing value quietly becomes `default`. A value that does not
/// parse also becomes `default`, with an error in the log.
fn parse_env_or<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
    T::Err: std::fmt::Display,
{
    env::var(name)
        .map(|s| {
            s.parse::<T>().unwrap_or_else(|e| {
                error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
                default
            })
        })
        .ok()
        .unwrap_or(default)
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The shared HS256 secret used by the identity provider to sign access tokens.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this since no token issued by your identity provider will be accepted. 🚨️🚨️🚨️"
        );
        let mut key = [0u8; 32];
        thread_rng().fill_bytes(&mut key);
        let secret = key.iter().map(|b| format!("{b:02x}")).collect::<String>();
        match &mut tmpfile {
            Some((f, p)) => match writeln!(f, "BSW_JWT_SECRET={secret}") {
                Ok(()) => warn!(
                    "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, you \
                     are doing it wrong! Set the BSW_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                    p.to_str().unwrap_or("???")
                ),
                Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret. ");
            },
        }
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("BSW_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [BSW_JWT_SECRET]")))?;
        if secret.len() < 16 {
            return Err(ServerError::ConfigurationError(
                "BSW_JWT_SECRET is too short. Use at least 16 characters.".to_string(),
            ));
        }
        Ok(Self::new(secret))
    }
}
