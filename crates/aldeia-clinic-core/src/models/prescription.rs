//! Prescription models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Duration descriptors that mark a treatment as open-ended, matched
/// case-insensitively as substrings ("Uso Contínuo", "contínua", ...).
const ONGOING_SYNONYMS: &[&str] = &["contínuo", "continuo", "contínua", "continua"];

/// Kind of prescribed item: conventional pharmaceutical or traditional
/// (herbal) remedy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ItemKind {
    Allopathic,
    Traditional,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Allopathic => "allopathic",
            ItemKind::Traditional => "traditional",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "allopathic" => Some(ItemKind::Allopathic),
            "traditional" => Some(ItemKind::Traditional),
            _ => None,
        }
    }
}

/// The clinical outcome record of one appointment: diagnosis and care notes
/// plus a list of prescribed items. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    /// UUID, generated at creation
    pub id: String,
    /// Owning appointment; exactly one prescription per appointment
    pub appointment_id: String,
    pub doctor_id: Option<String>,
    /// Free-text care instructions
    pub notes: String,
    /// Free-text complaint/diagnosis
    pub diagnosis: Option<String>,
    /// Creation timestamp
    pub created_at: String,
}

impl Prescription {
    pub fn new(
        appointment_id: String,
        doctor_id: Option<String>,
        notes: String,
        diagnosis: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            appointment_id,
            doctor_id,
            notes,
            diagnosis,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// One line of a prescription: a medication or traditional remedy with its
/// regimen. Order among items is insertion order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionItem {
    pub id: String,
    pub prescription_id: String,
    pub kind: ItemKind,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    /// Free-text duration descriptor (e.g. "7 dias", "Uso Contínuo")
    pub duration: Option<String>,
    /// Explicit treatment end date
    pub end_date: Option<NaiveDate>,
    /// Open-ended treatment flag, computed from `duration` at write time
    pub is_ongoing: bool,
    /// Informational link to a medicinal plant catalog entry
    pub plant_id: Option<String>,
    /// Informational link to a compound traditional treatment
    pub treatment_id: Option<String>,
}

/// Caller-supplied input for one prescription line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionItemInput {
    pub kind: ItemKind,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: Option<String>,
    /// ISO date (`YYYY-MM-DD`)
    pub end_date: Option<String>,
    pub plant_id: Option<String>,
    pub treatment_id: Option<String>,
}

/// An item from the details read model, with the linked catalog entry name
/// denormalized for display.
#[derive(Debug, Clone)]
pub struct PrescriptionItemDetail {
    pub item: PrescriptionItem,
    pub catalog_name: Option<String>,
}

/// An item still in effect for a patient, with its provenance.
#[derive(Debug, Clone)]
pub struct ActiveTreatment {
    pub item: PrescriptionItem,
    /// When the prescription was issued
    pub started: String,
    pub doctor_name: Option<String>,
}

/// Follow-up visit requested alongside a prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowUpRequest {
    /// ISO date (`YYYY-MM-DD`)
    pub date: String,
    /// Local time of day (`HH:MM`)
    pub time: String,
}

/// Decide whether a free-text duration describes an open-ended treatment.
///
/// Compatibility shim for records written before the structured flag: the
/// result is stored on the item at write time, never re-derived at read time.
pub fn classify_ongoing(duration: Option<&str>) -> bool {
    let Some(duration) = duration else {
        return false;
    };
    let lower = duration.to_lowercase();
    ONGOING_SYNONYMS.iter().any(|syn| lower.contains(syn))
}
