use mimalloc::MiMalloc;
use reader_db::db::models;
use reader_db::{Settings, bootstrap, seed_initial_admin};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("startup aborted: {e}");
            return Err(e.into());
        }
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(database = ?settings.database, loglevel = %settings.loglevel);

    let engine = bootstrap(&settings).await?;
    let registry = models::registry();
    if let Err(e) = engine.initialize_schema(&registry).await {
        error!(error = %e, connection = %engine.target(), "schema initialization failed");
        return Err(e.into());
    }

    match settings.initial_admin_email.as_deref() {
        Some(email) => {
            if let Err(e) = seed_initial_admin(&engine, email).await {
                warn!(error = %e, "failed to create initial admin");
            }
        }
        None => info!("no INITIAL_ADMIN_EMAIL set; skipping admin setup"),
    }

    info!(
        tables = registry.len(),
        connection = %engine.target(),
        "database ready"
    );
    Ok(())
}
