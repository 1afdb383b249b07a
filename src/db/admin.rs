//! First-administrator seeding run once at startup.

use crate::db::engine::Engine;
use crate::db::models::{AdminPrivilege, User};
use crate::error::DbError;
use chrono::Utc;
use tracing::{info, warn};

pub const INITIAL_ADMIN_REASON: &str = "Initial system administrator (environment configuration)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// A privilege row was created for this user id.
    Created(i64),
    /// Some privilege row already exists; nothing was written.
    AdminsExist,
    /// No user has the configured email.
    UserNotFound,
}

/// Grant admin rights to the user with `email`, unless any admin already exists.
pub async fn seed_initial_admin(engine: &Engine, email: &str) -> Result<SeedOutcome, DbError> {
    engine
        .with_session(async |session| -> Result<SeedOutcome, DbError> {
            if AdminPrivilege::any_exists(session).await? {
                info!("admins already exist; skipping initial admin setup");
                return Ok(SeedOutcome::AdminsExist);
            }

            let Some(user) = User::find_by_email(session, email).await? else {
                warn!(email = %email, "initial admin email not found in users");
                return Ok(SeedOutcome::UserNotFound);
            };
            let user_id = user
                .id
                .ok_or_else(|| DbError::Decode("user row without id".to_string()))?;

            AdminPrivilege {
                id: None,
                user_id,
                granted_by_id: None,
                granted_at: Utc::now(),
                grant_reason: INITIAL_ADMIN_REASON.to_string(),
                is_active: true,
            }
            .insert(session)
            .await?;
            info!(email = %user.email, user_id, "created initial admin");
            Ok(SeedOutcome::Created(user_id))
        })
        .await
}
