//! Clinician models.

use serde::{Deserialize, Serialize};

/// A clinician (doctor, nurse, health agent) who attends appointments and
/// signs prescriptions. Authentication lives outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clinician {
    /// UUID, generated locally
    pub id: String,
    pub full_name: String,
    pub email: String,
    /// Role label (e.g. "doctor", "nurse")
    pub role: String,
    /// Creation timestamp
    pub created_at: String,
}

impl Clinician {
    /// Create a new clinician record.
    pub fn new(full_name: String, email: String, role: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            full_name,
            email,
            role,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clinician() {
        let doc = Clinician::new("Dra. Ana Souza".into(), "ana@clinic.org".into(), "doctor".into());
        assert_eq!(doc.full_name, "Dra. Ana Souza");
        assert_eq!(doc.role, "doctor");
        assert_eq!(doc.id.len(), 36);
    }
}
