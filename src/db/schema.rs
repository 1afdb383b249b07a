//! Schema registry and the one-shot initializer that materializes it.
//!
//! Every DDL registered here must be `CREATE ... IF NOT EXISTS` so that
//! initializing twice is a no-op.

use crate::db::engine::Engine;
use crate::error::DbError;
use tracing::info;

/// One table known to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    /// One or more `;`-separated statements.
    pub ddl: &'static str,
}

/// An entity persisted in its own table.
pub trait Model {
    const TABLE: TableDef;
}

#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: Vec<TableDef>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M: Model>(&mut self) -> &mut Self {
        self.register_table(M::TABLE)
    }

    /// Registration order is creation order; a repeated name replaces the earlier entry in place.
    pub fn register_table(&mut self, table: TableDef) -> &mut Self {
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
        self
    }

    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

pub async fn initialize_schema(engine: &Engine, registry: &SchemaRegistry) -> Result<(), DbError> {
    engine
        .with_session(async |session| {
            for table in registry.tables() {
                session.execute_batch(table.ddl).await?;
                info!(table = table.name, "table ensured");
            }
            Ok::<_, DbError>(())
        })
        .await?;
    info!(tables = registry.len(), "schema initialized");
    Ok(())
}
