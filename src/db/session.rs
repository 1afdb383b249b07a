use crate::db::engine::EngineInner;
use crate::error::DbError;
use libsql::params::IntoParams;
use libsql::{Connection, Rows};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{debug, info};

/// Unit-of-work handle bound to one engine.
///
/// Dropping the session releases its connection; [`Engine::with_session`]
/// does this for the caller on every exit path.
///
/// [`Engine::with_session`]: crate::db::Engine::with_session
pub struct Session {
    id: u64,
    conn: Connection,
    engine: Arc<EngineInner>,
}

impl Session {
    pub(crate) fn new(id: u64, conn: Connection, engine: Arc<EngineInner>) -> Self {
        engine.open_sessions.fetch_add(1, Ordering::AcqRel);
        debug!(session_id = id, "session opened");
        Self { id, conn, engine }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Underlying libsql connection. Statements issued on it directly are
    /// not echoed.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub async fn execute(&self, sql: &str, params: impl IntoParams) -> Result<u64, DbError> {
        self.echo(sql);
        Ok(self.conn.execute(sql, params).await?)
    }

    pub async fn query(&self, sql: &str, params: impl IntoParams) -> Result<Rows, DbError> {
        self.echo(sql);
        Ok(self.conn.query(sql, params).await?)
    }

    /// Run several `;`-separated statements without parameters.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), DbError> {
        self.echo(sql);
        self.conn.execute_batch(sql).await?;
        Ok(())
    }

    fn echo(&self, sql: &str) {
        if self.engine.options.echo {
            info!(target: "reader_db::echo", session_id = self.id, sql = %sql.trim());
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.engine.open_sessions.fetch_sub(1, Ordering::AcqRel);
        debug!(session_id = self.id, "session released");
    }
}
