//! Patient models.

use serde::{Deserialize, Serialize};

/// Resting status label assigned to new patients. The daily queue override
/// ("Aguardando" while a scheduled appointment exists today) is derived at
/// read time and never stored.
pub const DEFAULT_PATIENT_STATUS: &str = "Triagem";

/// Label shown for a patient with a scheduled appointment today.
pub const WAITING_LABEL: &str = "Aguardando";

/// A patient demographic record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// UUID, generated locally
    pub id: String,
    /// Patient name
    pub name: String,
    /// Mother's name (primary disambiguator in the community registry)
    pub mother_name: Option<String>,
    /// Date of birth (ISO date)
    pub date_of_birth: Option<String>,
    /// Home village
    pub village: String,
    /// Ethnic group
    pub ethnicity: Option<String>,
    /// Name in the patient's own language
    pub indigenous_name: Option<String>,
    /// CNS card number (national health registry)
    pub cns: Option<String>,
    /// CPF document number
    pub cpf: Option<String>,
    /// Known allergies, free text
    pub allergies: Option<String>,
    /// Chronic conditions, free text
    pub conditions: Option<String>,
    /// Blood type
    pub blood_type: Option<String>,
    /// Stored (resting) status label; superseded by the derived queue status
    /// for display
    pub status: String,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(name: String, village: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            mother_name: None,
            date_of_birth: None,
            village,
            ethnicity: None,
            indigenous_name: None,
            cns: None,
            cpf: None,
            allergies: None,
            conditions: None,
            blood_type: None,
            status: DEFAULT_PATIENT_STATUS.into(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
