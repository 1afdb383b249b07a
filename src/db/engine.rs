use crate::db::schema::{self, SchemaRegistry};
use crate::db::session::Session;
use crate::error::DbError;
use crate::locator::{self, DRIVER_SCHEME, DriverUrl, LOCAL_SCHEME};
use libsql::{Builder, Database};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, ThreadId};
use tracing::info;
use url::Url;

/// Behavioral flags fixed at engine construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Only open sessions on the thread that built the engine.
    pub same_thread_only: bool,
    /// Log every statement issued through a session.
    pub echo: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            same_thread_only: false,
            echo: true,
        }
    }
}

pub(crate) struct EngineInner {
    db: Database,
    target: String,
    owner: ThreadId,
    next_session_id: AtomicU64,
    pub(crate) options: EngineOptions,
    pub(crate) open_sessions: AtomicUsize,
}

/// Shared handle to one database target; clones share the same engine.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Build an engine from a driver connection string.
    ///
    /// No connection is made here; an unreachable host or a rejected token
    /// surfaces on the first statement.
    pub async fn connect(conn_str: &str, options: EngineOptions) -> Result<Self, DbError> {
        let url = Url::parse(conn_str)?;
        match url.scheme() {
            DRIVER_SCHEME => Self::from_driver_url(&DriverUrl::parse(conn_str)?, options).await,
            LOCAL_SCHEME => Self::local(&locator::local_path(conn_str)?, options).await,
            other => Err(DbError::InvalidConnectionString(format!(
                "unsupported scheme {other:?}"
            ))),
        }
    }

    /// Build a remote engine; the token reaches the client exactly as held by `url`.
    pub async fn from_driver_url(url: &DriverUrl, options: EngineOptions) -> Result<Self, DbError> {
        let db = Builder::new_remote(url.remote_endpoint(), url.auth_token().to_string())
            .build()
            .await?;
        Ok(Self::from_database(db, url.redacted(), options))
    }

    /// Build an engine over a local database file.
    pub async fn local(path: &str, options: EngineOptions) -> Result<Self, DbError> {
        let db = Builder::new_local(path).build().await?;
        Ok(Self::from_database(db, format!("{LOCAL_SCHEME}:///{path}"), options))
    }

    fn from_database(db: Database, target: String, options: EngineOptions) -> Self {
        info!(
            connection = %target,
            same_thread_only = options.same_thread_only,
            echo = options.echo,
            "database engine built"
        );
        Self {
            inner: Arc::new(EngineInner {
                db,
                target,
                owner: thread::current().id(),
                next_session_id: AtomicU64::new(1),
                options,
                open_sessions: AtomicUsize::new(0),
            }),
        }
    }

    /// Connection target with credentials masked.
    pub fn target(&self) -> &str {
        &self.inner.target
    }

    pub fn options(&self) -> EngineOptions {
        self.inner.options
    }

    /// Sessions currently alive.
    pub fn open_sessions(&self) -> usize {
        self.inner.open_sessions.load(Ordering::Acquire)
    }

    /// Open a session. The caller owns its release; prefer [`Engine::with_session`].
    pub fn session(&self) -> Result<Session, DbError> {
        if self.inner.options.same_thread_only && thread::current().id() != self.inner.owner {
            return Err(DbError::ThreadAffinity);
        }
        let conn = self.inner.db.connect()?;
        let id = self.inner.next_session_id.fetch_add(1, Ordering::Relaxed);
        Ok(Session::new(id, conn, self.inner.clone()))
    }

    /// Run one unit of work inside a fresh session.
    ///
    /// The session is released before the result is returned, whether `work`
    /// succeeded, failed, or panicked.
    pub async fn with_session<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: AsyncFnOnce(&Session) -> Result<T, E>,
        E: From<DbError>,
    {
        let session = self.session()?;
        let outcome = work(&session).await;
        drop(session);
        outcome
    }

    /// Create every registered table that does not exist yet.
    pub async fn initialize_schema(&self, registry: &SchemaRegistry) -> Result<(), DbError> {
        schema::initialize_schema(self, registry).await
    }
}
