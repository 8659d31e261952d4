//! Sessions over SeaORM connections.
//!
//! A [`Session`] is one unit of work. It begins a transaction lazily on first
//! use; `commit` and `rollback` end that transaction and the next use begins a
//! new one, so a single session can carry several consecutive operations.
//! Whatever is still open when a session is closed or dropped is rolled back.

use sea_orm::{
    ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    Schema, TransactionTrait,
};

use crate::config::DatabaseConfig;
use crate::error::{AssistantError, Result};

/// Opens sessions against one connection pool.
#[derive(Debug, Clone)]
pub struct SessionFactory {
    conn: DatabaseConnection,
}

impl SessionFactory {
    /// Connect using the pool settings from `config`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let conn = Database::connect(config.connect_options()).await?;
        Ok(Self { conn })
    }

    /// Wrap a connection the caller already established.
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub fn open(&self) -> Session {
        Session {
            conn: self.conn.clone(),
            txn: None,
        }
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.conn.get_database_backend()
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub(crate) fn is_connected(&self) -> bool {
        !matches!(self.conn, DatabaseConnection::Disconnected)
    }
}

/// One unit of work against the database.
pub struct Session {
    conn: DatabaseConnection,
    txn: Option<DatabaseTransaction>,
}

impl Session {
    /// The open transaction, beginning one if none is active.
    ///
    /// Callers can run their own SeaORM queries on it to share the unit of
    /// work with the helpers.
    pub async fn transaction(&mut self) -> std::result::Result<&DatabaseTransaction, DbErr> {
        let txn = match self.txn.take() {
            Some(txn) => txn,
            None => self.conn.begin().await?,
        };
        let txn: &DatabaseTransaction = self.txn.insert(txn);
        Ok(txn)
    }

    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    pub async fn commit(&mut self) -> std::result::Result<(), DbErr> {
        match self.txn.take() {
            Some(txn) => txn.commit().await,
            None => Ok(()),
        }
    }

    pub async fn rollback(&mut self) -> std::result::Result<(), DbErr> {
        match self.txn.take() {
            Some(txn) => txn.rollback().await,
            None => Ok(()),
        }
    }

    /// Roll back anything still open and release the connection.
    pub async fn close(mut self) -> std::result::Result<(), DbErr> {
        self.rollback().await
    }
}

/// The declarative base the caller's entities belong to.
///
/// Records the backend the entities are declared for, so the helper can
/// check it against the session factory, and creates caller tables on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaBase {
    backend: DatabaseBackend,
}

impl SchemaBase {
    pub fn new(backend: DatabaseBackend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    /// `CREATE TABLE IF NOT EXISTS` for entity `E`, including its unique
    /// columns and foreign keys.
    pub async fn create_table<E>(&self, factory: &SessionFactory, entity: E) -> Result<()>
    where
        E: EntityTrait,
    {
        if !factory.is_connected() {
            return Err(AssistantError::Config(
                "session factory is not connected to a database".to_string(),
            ));
        }
        if factory.backend() != self.backend {
            return Err(AssistantError::Config(format!(
                "schema base targets {:?} but the session factory is connected to {:?}",
                self.backend,
                factory.backend()
            )));
        }

        let schema = Schema::new(self.backend);
        let mut statement = schema.create_table_from_entity(entity);
        statement.if_not_exists();
        factory.connection().execute(self.backend.build(&statement)).await?;
        Ok(())
    }
}
