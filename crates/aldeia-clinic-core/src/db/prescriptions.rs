//! Prescription and prescription-item operations.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{ActiveTreatment, ItemKind, Prescription, PrescriptionItem, PrescriptionItemDetail};

fn prescription_from_row(row: &Row<'_>) -> rusqlite::Result<Prescription> {
    Ok(Prescription {
        id: row.get(0)?,
        appointment_id: row.get(1)?,
        doctor_id: row.get(2)?,
        notes: row.get(3)?,
        diagnosis: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Intermediate row struct for item mapping.
struct ItemRow {
    id: String,
    prescription_id: String,
    kind: String,
    name: String,
    dosage: String,
    frequency: String,
    duration: Option<String>,
    end_date: Option<String>,
    is_ongoing: bool,
    plant_id: Option<String>,
    treatment_id: Option<String>,
}

impl ItemRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            prescription_id: row.get(1)?,
            kind: row.get(2)?,
            name: row.get(3)?,
            dosage: row.get(4)?,
            frequency: row.get(5)?,
            duration: row.get(6)?,
            end_date: row.get(7)?,
            is_ongoing: row.get(8)?,
            plant_id: row.get(9)?,
            treatment_id: row.get(10)?,
        })
    }
}

impl TryFrom<ItemRow> for PrescriptionItem {
    type Error = DbError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let kind = ItemKind::parse(&row.kind)
            .ok_or_else(|| DbError::Constraint(format!("Unknown item kind: {}", row.kind)))?;
        let end_date = row
            .end_date
            .map(|d| {
                NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                    .map_err(|e| DbError::Constraint(format!("Invalid stored end date '{}': {}", d, e)))
            })
            .transpose()?;

        Ok(PrescriptionItem {
            id: row.id,
            prescription_id: row.prescription_id,
            kind,
            name: row.name,
            dosage: row.dosage,
            frequency: row.frequency,
            duration: row.duration,
            end_date,
            is_ongoing: row.is_ongoing,
            plant_id: row.plant_id,
            treatment_id: row.treatment_id,
        })
    }
}

const ITEM_COLUMNS: &str = "id, prescription_id, kind, name, dosage, frequency, duration, \
     end_date, is_ongoing, plant_id, treatment_id";

const ITEM_COLUMNS_QUALIFIED: &str = "pi.id, pi.prescription_id, pi.kind, pi.name, pi.dosage, \
     pi.frequency, pi.duration, pi.end_date, pi.is_ongoing, pi.plant_id, pi.treatment_id";

/// Insert a prescription row. Connection-level: the finalizer calls this
/// inside its transaction.
pub(crate) fn insert_prescription(conn: &Connection, prescription: &Prescription) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO prescriptions (id, appointment_id, doctor_id, notes, diagnosis, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            prescription.id,
            prescription.appointment_id,
            prescription.doctor_id,
            prescription.notes,
            prescription.diagnosis,
            prescription.created_at,
        ],
    )?;
    Ok(())
}

/// Insert one prescription item, preserving caller order via rowid.
pub(crate) fn insert_prescription_item(conn: &Connection, item: &PrescriptionItem) -> DbResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO prescription_items ({ITEM_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params![
            item.id,
            item.prescription_id,
            item.kind.as_str(),
            item.name,
            item.dosage,
            item.frequency,
            item.duration,
            item.end_date.map(|d| d.to_string()),
            item.is_ongoing,
            item.plant_id,
            item.treatment_id,
        ],
    )?;
    Ok(())
}

impl Database {
    /// Get the prescription for an appointment, if the visit was finalized.
    pub fn get_prescription_for_appointment(
        &self,
        appointment_id: &str,
    ) -> DbResult<Option<Prescription>> {
        self.conn
            .query_row(
                "SELECT id, appointment_id, doctor_id, notes, diagnosis, created_at
                 FROM prescriptions WHERE appointment_id = ?",
                [appointment_id],
                prescription_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List the items of a prescription in insertion order.
    pub fn list_prescription_items(&self, prescription_id: &str) -> DbResult<Vec<PrescriptionItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM prescription_items
             WHERE prescription_id = ?
             ORDER BY rowid"
        ))?;

        let rows = stmt.query_map([prescription_id], ItemRow::from_row)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?.try_into()?);
        }
        Ok(items)
    }

    /// Items of a prescription with the linked catalog entry name, for the
    /// detail/reprint view.
    pub fn list_prescription_items_with_catalog(
        &self,
        prescription_id: &str,
    ) -> DbResult<Vec<PrescriptionItemDetail>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {ITEM_COLUMNS_QUALIFIED}, COALESCE(mp.name, tt.name)
            FROM prescription_items pi
            LEFT JOIN medicinal_plants mp ON pi.plant_id = mp.id
            LEFT JOIN traditional_treatments tt ON pi.treatment_id = tt.id
            WHERE pi.prescription_id = ?
            ORDER BY pi.rowid
            "#
        ))?;

        let rows = stmt.query_map([prescription_id], |row| {
            let item = ItemRow::from_row(row)?;
            let catalog_name: Option<String> = row.get(11)?;
            Ok((item, catalog_name))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (item, catalog_name) = row?;
            items.push(PrescriptionItemDetail {
                item: item.try_into()?,
                catalog_name,
            });
        }
        Ok(items)
    }

    /// Items still in effect for a patient on `today`: explicit end date not
    /// yet passed, or flagged open-ended. Ordered by end date descending,
    /// open-ended items last.
    pub fn list_active_items_for_patient(
        &self,
        patient_id: &str,
        today: NaiveDate,
    ) -> DbResult<Vec<ActiveTreatment>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {ITEM_COLUMNS_QUALIFIED}, pr.created_at, c.full_name
            FROM prescription_items pi
            JOIN prescriptions pr ON pi.prescription_id = pr.id
            JOIN appointments a ON pr.appointment_id = a.id
            LEFT JOIN clinicians c ON pr.doctor_id = c.id
            WHERE a.patient_id = ?1
              AND (pi.end_date >= ?2 OR pi.is_ongoing = 1)
            ORDER BY pi.end_date IS NULL, pi.end_date DESC
            "#
        ))?;

        let rows = stmt.query_map(params![patient_id, today.to_string()], |row| {
            let item = ItemRow::from_row(row)?;
            let started: String = row.get(11)?;
            let doctor_name: Option<String> = row.get(12)?;
            Ok((item, started, doctor_name))
        })?;

        let mut treatments = Vec::new();
        for row in rows {
            let (item, started, doctor_name) = row?;
            treatments.push(ActiveTreatment {
                item: item.try_into()?,
                started,
                doctor_name,
            });
        }
        Ok(treatments)
    }
}
