//! Database layer for the clinic core.

mod schema;
mod appointments;
mod catalog;
mod clinicians;
mod patients;
mod prescriptions;

pub use schema::*;
#[allow(unused_imports)]
pub use appointments::*;
#[allow(unused_imports)]
pub use catalog::*;
#[allow(unused_imports)]
pub use clinicians::*;
#[allow(unused_imports)]
pub use patients::*;
#[allow(unused_imports)]
pub use prescriptions::*;

use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a write transaction. IMMEDIATE takes the SQLite write lock at
    /// begin, so a check-then-act sequence inside observes no concurrent
    /// writer between the check and the commit.
    pub fn write_transaction(&mut self) -> DbResult<rusqlite::Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}
