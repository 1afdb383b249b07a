//! Startup settings read from the process environment.
//!
//! A local `.env` file, when present, is loaded into the environment first.

use crate::error::DbError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

pub const DATABASE_URL_VAR: &str = "TURSO_DATABASE_URL";
pub const AUTH_TOKEN_VAR: &str = "TURSO_AUTH_TOKEN";
pub const LOGLEVEL_VAR: &str = "LOGLEVEL";
pub const INITIAL_ADMIN_EMAIL_VAR: &str = "INITIAL_ADMIN_EMAIL";

const ENV_VARS: [&str; 4] = [
    DATABASE_URL_VAR,
    AUTH_TOKEN_VAR,
    LOGLEVEL_VAR,
    INITIAL_ADMIN_EMAIL_VAR,
];

#[derive(Debug, Deserialize)]
struct RawSettings {
    turso_database_url: Option<String>,
    turso_auth_token: Option<String>,
    #[serde(default = "default_loglevel")]
    loglevel: String,
    initial_admin_email: Option<String>,
}

fn default_loglevel() -> String {
    "info".to_string()
}

/// Locator URL and auth token for the remote database.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    locator: String,
    auth_token: String,
}

impl ConnectionDescriptor {
    pub fn new(
        locator: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Result<Self, DbError> {
        let locator = non_empty(DATABASE_URL_VAR, Some(locator.into()))?;
        let auth_token = non_empty(AUTH_TOKEN_VAR, Some(auth_token.into()))?;
        Ok(Self {
            locator,
            auth_token,
        })
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("locator", &self.locator)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database: ConnectionDescriptor,
    pub loglevel: String,
    /// User granted admin rights at startup when no admin exists yet.
    pub initial_admin_email: Option<String>,
}

impl Settings {
    /// Environment-backed figment restricted to the variables this crate reads.
    ///
    /// Values are kept as raw strings: a token like `123456` or `true` must
    /// not be parsed into a number or bool.
    pub fn figment() -> Figment {
        let vars: BTreeMap<String, String> = Env::raw()
            .only(&ENV_VARS)
            .iter()
            .map(|(key, value)| (key.as_str().to_ascii_lowercase(), value))
            .collect();
        Figment::from(Serialized::defaults(vars))
    }

    /// Load `.env` (if any) into the environment, then read settings from it.
    pub fn load() -> Result<Self, DbError> {
        dotenvy::dotenv().ok();
        Self::from_figment(&Self::figment())
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, DbError> {
        let raw: RawSettings = figment.extract()?;
        let locator = non_empty(DATABASE_URL_VAR, raw.turso_database_url)?;
        let auth_token = non_empty(AUTH_TOKEN_VAR, raw.turso_auth_token)?;
        Ok(Self {
            database: ConnectionDescriptor {
                locator,
                auth_token,
            },
            loglevel: raw.loglevel,
            initial_admin_email: raw.initial_admin_email.filter(|v| !v.trim().is_empty()),
        })
    }
}

fn non_empty(name: &'static str, value: Option<String>) -> Result<String, DbError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(DbError::MissingVar(name))
}
