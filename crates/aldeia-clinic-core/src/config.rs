//! Clinic configuration.

use serde::{Deserialize, Serialize};

/// Values injected into the service at construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClinicConfig {
    /// Clinician attributed to appointments and prescriptions created without
    /// an explicit `doctor_id`. Absent both, the record stores no clinician.
    pub default_clinician_id: Option<String>,
}
