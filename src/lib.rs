pub mod config;
pub mod db;
pub mod error;
pub mod locator;

pub use config::{ConnectionDescriptor, Settings};
pub use db::{
    Engine, EngineOptions, SchemaRegistry, SeedOutcome, Session, initialize_schema,
    seed_initial_admin,
};
pub use error::DbError;

use figment::Figment;
use tracing::info;

/// Build the process engine from loaded settings. Call once at startup and
/// pass the returned engine to whatever needs a session.
pub async fn bootstrap(settings: &Settings) -> Result<Engine, DbError> {
    let driver_url = locator::DriverUrl::from_descriptor(&settings.database)?;
    info!(connection = %driver_url.redacted(), "resolved database connection string");
    Engine::from_driver_url(&driver_url, EngineOptions::default()).await
}

/// Read settings from `figment` and bootstrap. Settings errors return
/// before any engine is built.
pub async fn bootstrap_from_figment(figment: &Figment) -> Result<Engine, DbError> {
    let settings = Settings::from_figment(figment)?;
    bootstrap(&settings).await
}
