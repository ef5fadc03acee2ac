//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Patient;

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        mother_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        village: row.get(4)?,
        ethnicity: row.get(5)?,
        indigenous_name: row.get(6)?,
        cns: row.get(7)?,
        cpf: row.get(8)?,
        allergies: row.get(9)?,
        conditions: row.get(10)?,
        blood_type: row.get(11)?,
        status: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

const PATIENT_COLUMNS: &str = "id, name, mother_name, date_of_birth, village, ethnicity, \
     indigenous_name, cns, cpf, allergies, conditions, blood_type, status, \
     created_at, updated_at";

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, name, mother_name, date_of_birth, village, ethnicity,
                indigenous_name, cns, cpf, allergies, conditions, blood_type,
                status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                patient.id,
                patient.name,
                patient.mother_name,
                patient.date_of_birth,
                patient.village,
                patient.ethnicity,
                patient.indigenous_name,
                patient.cns,
                patient.cpf,
                patient.allergies,
                patient.conditions,
                patient.blood_type,
                patient.status,
                patient.created_at,
                patient.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing patient.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                name = ?2,
                mother_name = ?3,
                date_of_birth = ?4,
                village = ?5,
                ethnicity = ?6,
                indigenous_name = ?7,
                cns = ?8,
                cpf = ?9,
                allergies = ?10,
                conditions = ?11,
                blood_type = ?12,
                status = ?13,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.name,
                patient.mother_name,
                patient.date_of_birth,
                patient.village,
                patient.ethnicity,
                patient.indigenous_name,
                patient.cns,
                patient.cpf,
                patient.allergies,
                patient.conditions,
                patient.blood_type,
                patient.status,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?"),
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Search patients by name or CNS number (substring match).
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let pattern = format!("%{}%", query);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients
             WHERE name LIKE ?1 OR cns LIKE ?1
             ORDER BY name
             LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![pattern, limit as i64], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List all patients.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY name"))?;

        let rows = stmt.query_map([], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let mut patient = Patient::new("Iracema Tukano".into(), "Aldeia São João".into());
        patient.mother_name = Some("Maria Tukano".into());
        patient.cns = Some("700000000000001".into());
        patient.blood_type = Some("O+".into());

        db.insert_patient(&patient).unwrap();

        let retrieved = db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(retrieved.name, "Iracema Tukano");
        assert_eq!(retrieved.village, "Aldeia São João");
        assert_eq!(retrieved.cns, Some("700000000000001".into()));
        assert_eq!(retrieved.blood_type, Some("O+".into()));
    }

    #[test]
    fn test_get_missing_patient() {
        let db = setup_db();
        assert!(db.get_patient("no-such-id").unwrap().is_none());
    }

    #[test]
    fn test_update_patient() {
        let db = setup_db();

        let mut patient = Patient::new("Iracema".into(), "São João".into());
        db.insert_patient(&patient).unwrap();

        patient.allergies = Some("Dipirona".into());
        patient.status = "Em Tratamento".into();
        assert!(db.update_patient(&patient).unwrap());

        let retrieved = db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(retrieved.allergies, Some("Dipirona".into()));
        assert_eq!(retrieved.status, "Em Tratamento");
    }

    #[test]
    fn test_search_by_name_and_cns() {
        let db = setup_db();

        let mut p1 = Patient::new("Iracema Tukano".into(), "São João".into());
        p1.cns = Some("700000000000001".into());
        let p2 = Patient::new("Raoni Kayapó".into(), "Mebengokre".into());

        db.insert_patient(&p1).unwrap();
        db.insert_patient(&p2).unwrap();

        let by_name = db.search_patients("Tukano", 20).unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, p1.id);

        let by_cns = db.search_patients("70000000", 20).unwrap();
        assert_eq!(by_cns.len(), 1);
        assert_eq!(by_cns[0].id, p1.id);
    }

    #[test]
    fn test_list_patients_ordered() {
        let db = setup_db();

        db.insert_patient(&Patient::new("Raoni".into(), "Mebengokre".into()))
            .unwrap();
        db.insert_patient(&Patient::new("Iracema".into(), "São João".into()))
            .unwrap();

        let all = db.list_patients().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Iracema");
        assert_eq!(all[1].name, "Raoni");
    }
}
