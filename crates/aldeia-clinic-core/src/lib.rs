//! Aldeia Clinic Core Library
//!
//! Appointment lifecycle and prescription engine for a small community
//! clinic, with a herbal pharmacy catalog on the side.
//!
//! # Architecture
//!
//! ```text
//!       createAppointment ──────────────► [Scheduled]
//!                                          │   │   │
//!                        cancel ───────────┘   │   └─────── bringToNow
//!                           │                  │             (date only)
//!                           ▼                  │
//!                      [Cancelled]             │ finalizePrescription
//!                                              │  ┌───────────────────────┐
//!                                              └─►│ one transaction:      │
//!                                                 │  prescription + items │
//!                                                 │  appointment → done   │
//!                                                 └──────────┬────────────┘
//!                                                            │
//!                                       [Completed]          │ best effort
//!                                                            ▼
//!                                                  follow-up [Scheduled]
//! ```
//!
//! "Waiting" is never stored: the status deriver answers it from today's
//! scheduled appointments at read time.
//!
//! # Modules
//!
//! - [`db`]: SQLite storage layer
//! - [`models`]: Domain types (Patient, Appointment, Prescription, catalog)
//! - [`scheduling`]: Date normalizer, state transitions, status deriver
//! - [`finalize`]: The transactional prescription finalizer
//! - [`config`]: Injected clinic configuration

pub mod config;
pub mod db;
pub mod finalize;
pub mod models;
pub mod scheduling;

// Re-export commonly used types
pub use config::ClinicConfig;
pub use db::Database;
pub use finalize::{FinalizeOutcome, FinalizeRequest, Finalizer, FollowUpOutcome};
pub use models::{
    Appointment, AppointmentStatus, FollowUpRequest, ItemKind, Patient, Prescription,
    PrescriptionItem, PrescriptionItemInput,
};
pub use scheduling::{
    AppointmentUpdate, NewAppointment, Scheduler, SchedulingError, StatusDeriver,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Already finalized: {0}")]
    AlreadyFinalized(String),

    #[error("Empty prescription: {0}")]
    EmptyPrescription(String),
}

impl From<db::DbError> for ClinicError {
    fn from(e: db::DbError) -> Self {
        ClinicError::DatabaseError(e.to_string())
    }
}

impl From<SchedulingError> for ClinicError {
    fn from(e: SchedulingError) -> Self {
        match &e {
            SchedulingError::Validation(msg) => ClinicError::InvalidInput(msg.clone()),
            SchedulingError::InvalidTransition { .. } => ClinicError::InvalidTransition(e.to_string()),
            SchedulingError::AlreadyFinalized(id) => ClinicError::AlreadyFinalized(id.clone()),
            SchedulingError::EmptyPrescription => ClinicError::EmptyPrescription(e.to_string()),
            SchedulingError::NotFound(what) => ClinicError::NotFound(what.clone()),
            SchedulingError::StoreUnavailable(_) => ClinicError::DatabaseError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for ClinicError {
    fn from(e: serde_json::Error) -> Self {
        ClinicError::DatabaseError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a clinic database at the given path.
#[uniffi::export]
pub fn open_clinic(
    path: String,
    default_clinician_id: Option<String>,
) -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(ClinicCore {
        db: Arc::new(Mutex::new(db)),
        config: ClinicConfig {
            default_clinician_id,
        },
    }))
}

/// Create an in-memory clinic (for testing).
#[uniffi::export]
pub fn open_clinic_in_memory(
    default_clinician_id: Option<String>,
) -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(ClinicCore {
        db: Arc::new(Mutex::new(db)),
        config: ClinicConfig {
            default_clinician_id,
        },
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe service boundary for the excluded UI layer.
#[derive(uniffi::Object)]
pub struct ClinicCore {
    db: Arc<Mutex<Database>>,
    config: ClinicConfig,
}

#[uniffi::export]
impl ClinicCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a new patient.
    pub fn create_patient(&self, input: FfiPatientInput) -> Result<FfiPatient, ClinicError> {
        let db = self.db.lock()?;
        let patient = input.into_patient();
        db.insert_patient(&patient)?;
        let status = patient.status.clone();
        Ok(to_ffi_patient(patient, status))
    }

    /// Get a patient with the derived (effective) status label.
    pub fn get_patient(&self, id: String) -> Result<Option<FfiPatient>, ClinicError> {
        let db = self.db.lock()?;
        let Some(patient) = db.get_patient(&id)? else {
            return Ok(None);
        };
        let status = StatusDeriver::new(&db).effective_status(&patient)?;
        Ok(Some(to_ffi_patient(patient, status)))
    }

    /// Search patients by name or CNS; statuses are derived.
    pub fn search_patients(
        &self,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiPatient>, ClinicError> {
        let db = self.db.lock()?;
        let deriver = StatusDeriver::new(&db);
        let mut out = Vec::new();
        for patient in db.search_patients(&query, limit as usize)? {
            let status = deriver.effective_status(&patient)?;
            out.push(to_ffi_patient(patient, status));
        }
        Ok(out)
    }

    /// Update patient demographics; the stored status label is kept as sent.
    pub fn update_patient(&self, id: String, input: FfiPatientInput) -> Result<bool, ClinicError> {
        let db = self.db.lock()?;
        let Some(existing) = db.get_patient(&id)? else {
            return Err(ClinicError::NotFound(format!("patient {id}")));
        };
        let mut patient = input.into_patient();
        patient.id = existing.id;
        patient.created_at = existing.created_at;
        Ok(db.update_patient(&patient)?)
    }

    // =========================================================================
    // Clinician Operations
    // =========================================================================

    /// Register a clinician.
    pub fn create_clinician(
        &self,
        full_name: String,
        email: String,
        role: String,
    ) -> Result<FfiClinician, ClinicError> {
        let db = self.db.lock()?;
        let clinician = models::Clinician::new(full_name, email, role);
        db.insert_clinician(&clinician)?;
        Ok(clinician.into())
    }

    /// List all clinicians.
    pub fn list_clinicians(&self) -> Result<Vec<FfiClinician>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.list_clinicians()?.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    /// Create an appointment; the initial status is always `scheduled`.
    pub fn create_appointment(
        &self,
        input: FfiNewAppointment,
    ) -> Result<FfiAppointment, ClinicError> {
        let db = self.db.lock()?;
        let scheduler = Scheduler::new(&db, &self.config);
        let appointment = scheduler.create_appointment(NewAppointment {
            patient_id: input.patient_id,
            doctor_id: input.doctor_id,
            date: input.date,
            reason: input.reason,
            notes: input.notes,
        })?;
        Ok(appointment.into())
    }

    /// Partially update status and/or date. Terminal appointments and direct
    /// completion are rejected.
    pub fn update_appointment(
        &self,
        id: String,
        status: Option<String>,
        date: Option<String>,
    ) -> Result<FfiAppointment, ClinicError> {
        let db = self.db.lock()?;
        let scheduler = Scheduler::new(&db, &self.config);
        let appointment = scheduler.update_appointment(&id, AppointmentUpdate { status, date })?;
        Ok(appointment.into())
    }

    /// Cancel a scheduled appointment.
    pub fn cancel_appointment(&self, id: String) -> Result<FfiAppointment, ClinicError> {
        let db = self.db.lock()?;
        let scheduler = Scheduler::new(&db, &self.config);
        Ok(scheduler.cancel_appointment(&id)?.into())
    }

    /// Rewrite a scheduled appointment's date to now (status unchanged).
    pub fn bring_appointment_to_now(&self, id: String) -> Result<FfiAppointment, ClinicError> {
        let db = self.db.lock()?;
        let scheduler = Scheduler::new(&db, &self.config);
        Ok(scheduler.bring_to_now(&id)?.into())
    }

    /// Agenda view: appointments in a date range with patient names.
    pub fn list_appointments(
        &self,
        start: String,
        end: String,
    ) -> Result<Vec<FfiAgendaEntry>, ClinicError> {
        let db = self.db.lock()?;
        let scheduler = Scheduler::new(&db, &self.config);
        Ok(scheduler
            .agenda(&start, &end)?
            .into_iter()
            .map(|entry| FfiAgendaEntry {
                appointment: entry.appointment.into(),
                patient_name: entry.patient_name,
            })
            .collect())
    }

    /// Patient history, newest first, with prescription annotations.
    pub fn get_patient_appointments(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiHistoryEntry>, ClinicError> {
        let db = self.db.lock()?;
        let scheduler = Scheduler::new(&db, &self.config);
        Ok(scheduler
            .patient_history(&patient_id)?
            .into_iter()
            .map(|entry| FfiHistoryEntry {
                appointment: entry.appointment.into(),
                doctor_name: entry.doctor_name,
                has_prescription: entry.has_prescription,
                diagnosis: entry.diagnosis,
            })
            .collect())
    }

    /// Detail view joining appointment → prescription → items.
    pub fn get_appointment_details(
        &self,
        id: String,
    ) -> Result<FfiAppointmentDetails, ClinicError> {
        let db = self.db.lock()?;
        let scheduler = Scheduler::new(&db, &self.config);
        let details = scheduler.appointment_details(&id)?;
        Ok(FfiAppointmentDetails {
            appointment: details.appointment.into(),
            doctor_name: details.doctor_name,
            prescription: details.prescription.map(Into::into),
            items: details
                .items
                .into_iter()
                .map(|detail| FfiPrescriptionItemDetail {
                    item: detail.item.into(),
                    catalog_name: detail.catalog_name,
                })
                .collect(),
        })
    }

    // =========================================================================
    // Prescription Finalizer
    // =========================================================================

    /// Issue a prescription, completing the appointment atomically. A failed
    /// follow-up booking is reported in the outcome, not as an error.
    pub fn finalize_prescription(
        &self,
        request: FfiFinalizeRequest,
    ) -> Result<FfiFinalizeOutcome, ClinicError> {
        let mut items = Vec::with_capacity(request.items.len());
        for item in request.items {
            items.push(item.try_into()?);
        }

        let mut db = self.db.lock()?;
        let mut finalizer = Finalizer::new(&mut db, &self.config);
        let outcome = finalizer.finalize(FinalizeRequest {
            appointment_id: request.appointment_id,
            doctor_id: request.doctor_id,
            items,
            notes: request.notes,
            diagnosis: request.diagnosis,
            follow_up: request.follow_up.map(|f| FollowUpRequest {
                date: f.date,
                time: f.time,
            }),
        })?;
        Ok(outcome.into())
    }

    // =========================================================================
    // Derived Status
    // =========================================================================

    /// Whether the patient has a scheduled appointment today.
    pub fn is_waiting_today(&self, patient_id: String) -> Result<bool, ClinicError> {
        let db = self.db.lock()?;
        Ok(StatusDeriver::new(&db).is_waiting_today(&patient_id)?)
    }

    /// Treatments still in effect for the patient.
    pub fn get_active_treatments(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiActiveTreatment>, ClinicError> {
        let db = self.db.lock()?;
        Ok(StatusDeriver::new(&db)
            .active_treatments(&patient_id)?
            .into_iter()
            .map(|treatment| FfiActiveTreatment {
                item: treatment.item.into(),
                started: treatment.started,
                doctor_name: treatment.doctor_name,
            })
            .collect())
    }

    // =========================================================================
    // Herbal Pharmacy Catalog
    // =========================================================================

    /// Add or update a medicinal plant; absent ID creates a new entry.
    pub fn upsert_plant(&self, input: FfiPlantInput) -> Result<FfiPlant, ClinicError> {
        let db = self.db.lock()?;
        let plant = input.into_plant();
        db.upsert_plant(&plant)?;
        Ok(plant.into())
    }

    /// Get a plant by ID.
    pub fn get_plant(&self, id: String) -> Result<Option<FfiPlant>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.get_plant(&id)?.map(Into::into))
    }

    /// List plants.
    pub fn list_plants(&self, active_only: bool) -> Result<Vec<FfiPlant>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.list_plants(active_only)?.into_iter().map(Into::into).collect())
    }

    /// Soft-delete a plant.
    pub fn deactivate_plant(&self, id: String) -> Result<bool, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.deactivate_plant(&id)?)
    }

    /// Add or update a compound traditional treatment.
    pub fn upsert_treatment(&self, input: FfiTreatmentInput) -> Result<FfiTreatment, ClinicError> {
        let db = self.db.lock()?;
        let treatment = input.into_treatment();
        db.upsert_treatment(&treatment)?;
        Ok(treatment.into())
    }

    /// List compound treatments.
    pub fn list_treatments(&self, active_only: bool) -> Result<Vec<FfiTreatment>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db
            .list_treatments(active_only)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Soft-delete a compound treatment.
    pub fn deactivate_treatment(&self, id: String) -> Result<bool, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.deactivate_treatment(&id)?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientInput {
    pub name: String,
    pub village: String,
    pub mother_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub ethnicity: Option<String>,
    pub indigenous_name: Option<String>,
    pub cns: Option<String>,
    pub cpf: Option<String>,
    pub allergies: Option<String>,
    pub conditions: Option<String>,
    pub blood_type: Option<String>,
    pub status: Option<String>,
}

impl FfiPatientInput {
    fn into_patient(self) -> Patient {
        let mut patient = Patient::new(self.name, self.village);
        patient.mother_name = self.mother_name;
        patient.date_of_birth = self.date_of_birth;
        patient.ethnicity = self.ethnicity;
        patient.indigenous_name = self.indigenous_name;
        patient.cns = self.cns;
        patient.cpf = self.cpf;
        patient.allergies = self.allergies;
        patient.conditions = self.conditions;
        patient.blood_type = self.blood_type;
        if let Some(status) = self.status {
            patient.status = status;
        }
        patient
    }
}

/// FFI-safe patient with the derived status label.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub village: String,
    pub mother_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub ethnicity: Option<String>,
    pub indigenous_name: Option<String>,
    pub cns: Option<String>,
    pub cpf: Option<String>,
    pub allergies: Option<String>,
    pub conditions: Option<String>,
    pub blood_type: Option<String>,
    /// Effective status: the waiting override while the patient is in
    /// today's queue, the stored label otherwise
    pub status: String,
}

fn to_ffi_patient(patient: Patient, status: String) -> FfiPatient {
    FfiPatient {
        id: patient.id,
        name: patient.name,
        village: patient.village,
        mother_name: patient.mother_name,
        date_of_birth: patient.date_of_birth,
        ethnicity: patient.ethnicity,
        indigenous_name: patient.indigenous_name,
        cns: patient.cns,
        cpf: patient.cpf,
        allergies: patient.allergies,
        conditions: patient.conditions,
        blood_type: patient.blood_type,
        status,
    }
}

/// FFI-safe clinician.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClinician {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
}

impl From<models::Clinician> for FfiClinician {
    fn from(clinician: models::Clinician) -> Self {
        Self {
            id: clinician.id,
            full_name: clinician.full_name,
            email: clinician.email,
            role: clinician.role,
        }
    }
}

/// FFI-safe appointment input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewAppointment {
    pub patient_id: String,
    pub doctor_id: Option<String>,
    /// Calendar day or timestamp; absent means now
    pub date: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: Option<String>,
    /// RFC 3339 instant
    pub date: String,
    pub reason: String,
    pub notes: Option<String>,
    pub status: String,
}

impl From<Appointment> for FfiAppointment {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            date: appointment.date.to_rfc3339(),
            reason: appointment.reason,
            notes: appointment.notes,
            status: appointment.status.as_str().into(),
        }
    }
}

/// FFI-safe agenda entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAgendaEntry {
    pub appointment: FfiAppointment,
    pub patient_name: String,
}

/// FFI-safe history entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHistoryEntry {
    pub appointment: FfiAppointment,
    pub doctor_name: Option<String>,
    pub has_prescription: bool,
    pub diagnosis: Option<String>,
}

/// FFI-safe prescription.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescription {
    pub id: String,
    pub appointment_id: String,
    pub doctor_id: Option<String>,
    pub notes: String,
    pub diagnosis: Option<String>,
    pub created_at: String,
}

impl From<Prescription> for FfiPrescription {
    fn from(prescription: Prescription) -> Self {
        Self {
            id: prescription.id,
            appointment_id: prescription.appointment_id,
            doctor_id: prescription.doctor_id,
            notes: prescription.notes,
            diagnosis: prescription.diagnosis,
            created_at: prescription.created_at,
        }
    }
}

/// FFI-safe prescription item.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescriptionItem {
    pub id: String,
    pub kind: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: Option<String>,
    /// ISO date
    pub end_date: Option<String>,
    pub is_ongoing: bool,
    pub plant_id: Option<String>,
    pub treatment_id: Option<String>,
}

impl From<PrescriptionItem> for FfiPrescriptionItem {
    fn from(item: PrescriptionItem) -> Self {
        Self {
            id: item.id,
            kind: item.kind.as_str().into(),
            name: item.name,
            dosage: item.dosage,
            frequency: item.frequency,
            duration: item.duration,
            end_date: item.end_date.map(|d| d.to_string()),
            is_ongoing: item.is_ongoing,
            plant_id: item.plant_id,
            treatment_id: item.treatment_id,
        }
    }
}

/// FFI-safe item with the denormalized catalog name.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescriptionItemDetail {
    pub item: FfiPrescriptionItem,
    pub catalog_name: Option<String>,
}

/// FFI-safe appointment detail view.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointmentDetails {
    pub appointment: FfiAppointment,
    pub doctor_name: Option<String>,
    pub prescription: Option<FfiPrescription>,
    pub items: Vec<FfiPrescriptionItemDetail>,
}

/// FFI-safe prescription item input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiItemInput {
    /// "allopathic" or "traditional"
    pub kind: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: Option<String>,
    /// ISO date
    pub end_date: Option<String>,
    pub plant_id: Option<String>,
    pub treatment_id: Option<String>,
}

impl TryFrom<FfiItemInput> for PrescriptionItemInput {
    type Error = ClinicError;

    fn try_from(input: FfiItemInput) -> Result<Self, Self::Error> {
        let kind = ItemKind::parse(&input.kind)
            .ok_or_else(|| ClinicError::InvalidInput(format!("Unknown item kind: '{}'", input.kind)))?;
        Ok(PrescriptionItemInput {
            kind,
            name: input.name,
            dosage: input.dosage,
            frequency: input.frequency,
            duration: input.duration,
            end_date: input.end_date,
            plant_id: input.plant_id,
            treatment_id: input.treatment_id,
        })
    }
}

/// FFI-safe follow-up request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFollowUp {
    /// ISO date
    pub date: String,
    /// Local time of day (`HH:MM`)
    pub time: String,
}

/// FFI-safe finalize request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFinalizeRequest {
    pub appointment_id: String,
    pub doctor_id: Option<String>,
    pub items: Vec<FfiItemInput>,
    pub notes: String,
    pub diagnosis: Option<String>,
    pub follow_up: Option<FfiFollowUp>,
}

/// FFI-safe finalize outcome. A failed follow-up booking surfaces as a
/// warning here; the prescription itself committed.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFinalizeOutcome {
    pub prescription_id: String,
    pub appointment_id: String,
    pub follow_up_appointment_id: Option<String>,
    pub follow_up_warning: Option<String>,
}

impl From<FinalizeOutcome> for FfiFinalizeOutcome {
    fn from(outcome: FinalizeOutcome) -> Self {
        let (follow_up_appointment_id, follow_up_warning) = match outcome.follow_up {
            FollowUpOutcome::NotRequested => (None, None),
            FollowUpOutcome::Scheduled { appointment_id } => (Some(appointment_id), None),
            FollowUpOutcome::Failed { reason } => (None, Some(reason)),
        };
        Self {
            prescription_id: outcome.prescription_id,
            appointment_id: outcome.appointment_id,
            follow_up_appointment_id,
            follow_up_warning,
        }
    }
}

/// FFI-safe active treatment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiActiveTreatment {
    pub item: FfiPrescriptionItem,
    /// When the prescription was issued
    pub started: String,
    pub doctor_name: Option<String>,
}

/// FFI-safe cultivation info.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCultivation {
    pub climate: Option<String>,
    pub water: Option<String>,
    pub harvest: Option<String>,
    pub soil: Option<String>,
}

/// FFI-safe medicinal plant input; absent ID creates a new entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPlantInput {
    pub id: Option<String>,
    pub name: String,
    pub scientific_name: Option<String>,
    pub indigenous_name: Option<String>,
    pub main_use: Option<String>,
    pub usage_parts: Vec<String>,
    pub indications: Option<String>,
    pub description: Option<String>,
    pub preparation: Option<String>,
    pub dosage: Option<String>,
    pub contraindications: Option<String>,
    pub cultivation: Option<FfiCultivation>,
}

impl FfiPlantInput {
    fn into_plant(self) -> models::MedicinalPlant {
        let mut plant = models::MedicinalPlant::new(self.name);
        if let Some(id) = self.id {
            plant.id = id;
        }
        plant.scientific_name = self.scientific_name;
        plant.indigenous_name = self.indigenous_name;
        plant.main_use = self.main_use;
        plant.usage_parts = self.usage_parts;
        plant.indications = self.indications;
        plant.description = self.description;
        plant.preparation = self.preparation;
        plant.dosage = self.dosage;
        plant.contraindications = self.contraindications;
        plant.cultivation = self.cultivation.map(|c| models::CultivationInfo {
            climate: c.climate,
            water: c.water,
            harvest: c.harvest,
            soil: c.soil,
        });
        plant
    }
}

/// FFI-safe medicinal plant.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPlant {
    pub id: String,
    pub name: String,
    pub scientific_name: Option<String>,
    pub indigenous_name: Option<String>,
    pub main_use: Option<String>,
    pub usage_parts: Vec<String>,
    pub indications: Option<String>,
    pub description: Option<String>,
    pub preparation: Option<String>,
    pub dosage: Option<String>,
    pub contraindications: Option<String>,
    pub cultivation: Option<FfiCultivation>,
    pub active: bool,
}

impl From<models::MedicinalPlant> for FfiPlant {
    fn from(plant: models::MedicinalPlant) -> Self {
        Self {
            id: plant.id,
            name: plant.name,
            scientific_name: plant.scientific_name,
            indigenous_name: plant.indigenous_name,
            main_use: plant.main_use,
            usage_parts: plant.usage_parts,
            indications: plant.indications,
            description: plant.description,
            preparation: plant.preparation,
            dosage: plant.dosage,
            contraindications: plant.contraindications,
            cultivation: plant.cultivation.map(|c| FfiCultivation {
                climate: c.climate,
                water: c.water,
                harvest: c.harvest,
                soil: c.soil,
            }),
            active: plant.active,
        }
    }
}

/// FFI-safe ingredient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiIngredient {
    pub name: String,
    pub quantity: Option<String>,
}

/// FFI-safe compound treatment input; absent ID creates a new entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTreatmentInput {
    pub id: Option<String>,
    pub name: String,
    pub origin: Option<String>,
    pub indications: Option<String>,
    pub ingredients: Vec<FfiIngredient>,
    pub preparation_method: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub contraindications: Option<String>,
}

impl FfiTreatmentInput {
    fn into_treatment(self) -> models::TraditionalTreatment {
        let mut treatment = models::TraditionalTreatment::new(self.name);
        if let Some(id) = self.id {
            treatment.id = id;
        }
        treatment.origin = self.origin;
        treatment.indications = self.indications;
        treatment.ingredients = self
            .ingredients
            .into_iter()
            .map(|i| models::Ingredient {
                name: i.name,
                quantity: i.quantity,
            })
            .collect();
        treatment.preparation_method = self.preparation_method;
        treatment.frequency = self.frequency;
        treatment.duration = self.duration;
        treatment.contraindications = self.contraindications;
        treatment
    }
}

/// FFI-safe compound treatment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTreatment {
    pub id: String,
    pub name: String,
    pub origin: Option<String>,
    pub indications: Option<String>,
    pub ingredients: Vec<FfiIngredient>,
    pub preparation_method: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub contraindications: Option<String>,
    pub active: bool,
}

impl From<models::TraditionalTreatment> for FfiTreatment {
    fn from(treatment: models::TraditionalTreatment) -> Self {
        Self {
            id: treatment.id,
            name: treatment.name,
            origin: treatment.origin,
            indications: treatment.indications,
            ingredients: treatment
                .ingredients
                .into_iter()
                .map(|i| FfiIngredient {
                    name: i.name,
                    quantity: i.quantity,
                })
                .collect(),
            preparation_method: treatment.preparation_method,
            frequency: treatment.frequency,
            duration: treatment.duration,
            contraindications: treatment.contraindications,
            active: treatment.active,
        }
    }
}
