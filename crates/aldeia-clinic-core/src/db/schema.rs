//! SQLite schema definition.

/// Complete database schema for the clinic core.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    mother_name TEXT,
    date_of_birth TEXT,
    village TEXT NOT NULL,
    ethnicity TEXT,
    indigenous_name TEXT,
    cns TEXT,
    cpf TEXT,
    allergies TEXT,
    conditions TEXT,
    blood_type TEXT,
    status TEXT NOT NULL DEFAULT 'Triagem',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);
CREATE INDEX IF NOT EXISTS idx_patients_cns ON patients(cns);

-- ============================================================================
-- Clinicians
-- ============================================================================

CREATE TABLE IF NOT EXISTS clinicians (
    id TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL DEFAULT 'doctor',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    doctor_id TEXT REFERENCES clinicians(id),
    date TEXT NOT NULL,                          -- RFC 3339 instant (UTC)
    reason TEXT NOT NULL,
    notes TEXT,
    status TEXT NOT NULL DEFAULT 'scheduled'
        CHECK (status IN ('scheduled', 'completed', 'cancelled')),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);
CREATE INDEX IF NOT EXISTS idx_appointments_date ON appointments(date);
CREATE INDEX IF NOT EXISTS idx_appointments_status ON appointments(status);

-- ============================================================================
-- Herbal Pharmacy Catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS medicinal_plants (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    scientific_name TEXT,
    indigenous_name TEXT,
    main_use TEXT,
    usage_parts TEXT NOT NULL DEFAULT '[]',      -- JSON array of strings
    indications TEXT,
    description TEXT,
    preparation TEXT,
    dosage TEXT,
    contraindications TEXT,
    cultivation TEXT,                            -- JSON object
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_plants_name ON medicinal_plants(name);

CREATE TABLE IF NOT EXISTS traditional_treatments (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    origin TEXT,
    indications TEXT,
    ingredients TEXT NOT NULL DEFAULT '[]',      -- JSON array of {name, quantity}
    preparation_method TEXT,
    frequency TEXT,
    duration TEXT,
    contraindications TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_treatments_name ON traditional_treatments(name);

-- ============================================================================
-- Prescriptions
-- ============================================================================

-- appointment_id is UNIQUE: at most one prescription per appointment. The
-- finalizer checks the appointment state inside its transaction; this
-- constraint backstops the same invariant at the storage level.
CREATE TABLE IF NOT EXISTS prescriptions (
    id TEXT PRIMARY KEY,
    appointment_id TEXT NOT NULL UNIQUE REFERENCES appointments(id),
    doctor_id TEXT REFERENCES clinicians(id),
    notes TEXT NOT NULL DEFAULT '',
    diagnosis TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS prescription_items (
    id TEXT PRIMARY KEY,
    prescription_id TEXT NOT NULL REFERENCES prescriptions(id),
    kind TEXT NOT NULL CHECK (kind IN ('allopathic', 'traditional')),
    name TEXT NOT NULL,
    dosage TEXT NOT NULL,
    frequency TEXT NOT NULL,
    duration TEXT,
    end_date TEXT,                               -- ISO date
    is_ongoing INTEGER NOT NULL DEFAULT 0,
    plant_id TEXT REFERENCES medicinal_plants(id),
    treatment_id TEXT REFERENCES traditional_treatments(id)
);

CREATE INDEX IF NOT EXISTS idx_items_prescription ON prescription_items(prescription_id);
CREATE INDEX IF NOT EXISTS idx_items_end_date ON prescription_items(end_date);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_status_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO patients (id, name, village) VALUES ('p1', 'Iracema', 'São João')",
            [],
        )
        .unwrap();

        // Valid status
        let result = conn.execute(
            "INSERT INTO appointments (id, patient_id, date, reason, status)
             VALUES ('a1', 'p1', '2024-06-01T09:00:00+00:00', 'Consulta', 'scheduled')",
            [],
        );
        assert!(result.is_ok());

        // Unknown status rejected
        let result = conn.execute(
            "INSERT INTO appointments (id, patient_id, date, reason, status)
             VALUES ('a2', 'p1', '2024-06-01T09:00:00+00:00', 'Consulta', 'archived')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_one_prescription_per_appointment() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO patients (id, name, village) VALUES ('p1', 'Iracema', 'São João')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO appointments (id, patient_id, date, reason)
             VALUES ('a1', 'p1', '2024-06-01T09:00:00+00:00', 'Consulta')",
            [],
        )
        .unwrap();

        conn.execute(
            "INSERT INTO prescriptions (id, appointment_id) VALUES ('rx1', 'a1')",
            [],
        )
        .unwrap();

        // A second prescription for the same appointment violates UNIQUE
        let result = conn.execute(
            "INSERT INTO prescriptions (id, appointment_id) VALUES ('rx2', 'a1')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_item_kind_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO patients (id, name, village) VALUES ('p1', 'Iracema', 'São João')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO appointments (id, patient_id, date, reason)
             VALUES ('a1', 'p1', '2024-06-01T09:00:00+00:00', 'Consulta')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO prescriptions (id, appointment_id) VALUES ('rx1', 'a1')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO prescription_items (id, prescription_id, kind, name, dosage, frequency)
             VALUES ('i1', 'rx1', 'homeopathic', 'Arnica', '5 gotas', '1x/dia')",
            [],
        );
        assert!(result.is_err());
    }
}
