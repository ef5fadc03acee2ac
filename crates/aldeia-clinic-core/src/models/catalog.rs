//! Herbal pharmacy catalog models.
//!
//! Prescription items may reference these entries; the link is informational
//! only and carries no lifecycle coupling.

use serde::{Deserialize, Serialize};

/// Growing conditions for a medicinal plant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CultivationInfo {
    pub climate: Option<String>,
    pub water: Option<String>,
    pub harvest: Option<String>,
    pub soil: Option<String>,
}

/// A medicinal plant known to the clinic pharmacy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicinalPlant {
    /// UUID, generated locally
    pub id: String,
    pub name: String,
    pub scientific_name: Option<String>,
    /// Name in the community's language
    pub indigenous_name: Option<String>,
    /// Primary therapeutic use (e.g. "Expectorante")
    pub main_use: Option<String>,
    /// Parts of the plant used (e.g. ["Folhas", "Flores"])
    pub usage_parts: Vec<String>,
    pub indications: Option<String>,
    pub description: Option<String>,
    /// Preparation instructions (infusion, cataplasm, ...)
    pub preparation: Option<String>,
    pub dosage: Option<String>,
    pub contraindications: Option<String>,
    pub cultivation: Option<CultivationInfo>,
    /// Soft-delete flag
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl MedicinalPlant {
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            scientific_name: None,
            indigenous_name: None,
            main_use: None,
            usage_parts: Vec::new(),
            indications: None,
            description: None,
            preparation: None,
            dosage: None,
            contraindications: None,
            cultivation: None,
            active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// One ingredient of a compound treatment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub name: String,
    pub quantity: Option<String>,
}

/// A compound traditional treatment (recipe) from community knowledge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraditionalTreatment {
    /// UUID, generated locally
    pub id: String,
    pub name: String,
    /// Community of origin (e.g. "Povo Tukano")
    pub origin: Option<String>,
    pub indications: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub preparation_method: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub contraindications: Option<String>,
    /// Soft-delete flag
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl TraditionalTreatment {
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            origin: None,
            indications: None,
            ingredients: Vec::new(),
            preparation_method: None,
            frequency: None,
            duration: None,
            contraindications: None,
            active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_plant() {
        let plant = MedicinalPlant::new("Guaco".into());
        assert_eq!(plant.name, "Guaco");
        assert!(plant.active);
        assert!(plant.usage_parts.is_empty());
    }

    #[test]
    fn test_new_treatment() {
        let mut t = TraditionalTreatment::new("Chá de Casca de Jatobá".into());
        t.ingredients.push(Ingredient {
            name: "Casca de Jatobá".into(),
            quantity: Some("3 lascas".into()),
        });
        assert_eq!(t.ingredients.len(), 1);
        assert!(t.active);
    }
}
