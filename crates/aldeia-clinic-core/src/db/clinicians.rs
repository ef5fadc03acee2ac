//! Clinician database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Clinician;

fn clinician_from_row(row: &Row<'_>) -> rusqlite::Result<Clinician> {
    Ok(Clinician {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl Database {
    /// Insert a new clinician.
    pub fn insert_clinician(&self, clinician: &Clinician) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO clinicians (id, full_name, email, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                clinician.id,
                clinician.full_name,
                clinician.email,
                clinician.role,
                clinician.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a clinician by ID.
    pub fn get_clinician(&self, id: &str) -> DbResult<Option<Clinician>> {
        self.conn
            .query_row(
                "SELECT id, full_name, email, role, created_at FROM clinicians WHERE id = ?",
                [id],
                clinician_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all clinicians.
    pub fn list_clinicians(&self) -> DbResult<Vec<Clinician>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, full_name, email, role, created_at FROM clinicians ORDER BY full_name",
        )?;

        let rows = stmt.query_map([], clinician_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
