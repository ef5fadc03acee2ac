//! Herbal pharmacy catalog operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Ingredient, MedicinalPlant, TraditionalTreatment};

/// Intermediate row struct for plant mapping.
struct PlantRow {
    id: String,
    name: String,
    scientific_name: Option<String>,
    indigenous_name: Option<String>,
    main_use: Option<String>,
    usage_parts: String,
    indications: Option<String>,
    description: Option<String>,
    preparation: Option<String>,
    dosage: Option<String>,
    contraindications: Option<String>,
    cultivation: Option<String>,
    active: bool,
    created_at: String,
    updated_at: String,
}

impl PlantRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            scientific_name: row.get(2)?,
            indigenous_name: row.get(3)?,
            main_use: row.get(4)?,
            usage_parts: row.get(5)?,
            indications: row.get(6)?,
            description: row.get(7)?,
            preparation: row.get(8)?,
            dosage: row.get(9)?,
            contraindications: row.get(10)?,
            cultivation: row.get(11)?,
            active: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }
}

impl TryFrom<PlantRow> for MedicinalPlant {
    type Error = DbError;

    fn try_from(row: PlantRow) -> Result<Self, Self::Error> {
        Ok(MedicinalPlant {
            id: row.id,
            name: row.name,
            scientific_name: row.scientific_name,
            indigenous_name: row.indigenous_name,
            main_use: row.main_use,
            usage_parts: serde_json::from_str(&row.usage_parts)?,
            indications: row.indications,
            description: row.description,
            preparation: row.preparation,
            dosage: row.dosage,
            contraindications: row.contraindications,
            cultivation: row
                .cultivation
                .map(|s| serde_json::from_str(&s))
                .transpose()?,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PLANT_COLUMNS: &str = "id, name, scientific_name, indigenous_name, main_use, usage_parts, \
     indications, description, preparation, dosage, contraindications, cultivation, active, \
     created_at, updated_at";

/// Intermediate row struct for treatment mapping.
struct TreatmentRow {
    id: String,
    name: String,
    origin: Option<String>,
    indications: Option<String>,
    ingredients: String,
    preparation_method: Option<String>,
    frequency: Option<String>,
    duration: Option<String>,
    contraindications: Option<String>,
    active: bool,
    created_at: String,
    updated_at: String,
}

impl TreatmentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            origin: row.get(2)?,
            indications: row.get(3)?,
            ingredients: row.get(4)?,
            preparation_method: row.get(5)?,
            frequency: row.get(6)?,
            duration: row.get(7)?,
            contraindications: row.get(8)?,
            active: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}

impl TryFrom<TreatmentRow> for TraditionalTreatment {
    type Error = DbError;

    fn try_from(row: TreatmentRow) -> Result<Self, Self::Error> {
        let ingredients: Vec<Ingredient> = serde_json::from_str(&row.ingredients)?;
        Ok(TraditionalTreatment {
            id: row.id,
            name: row.name,
            origin: row.origin,
            indications: row.indications,
            ingredients,
            preparation_method: row.preparation_method,
            frequency: row.frequency,
            duration: row.duration,
            contraindications: row.contraindications,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const TREATMENT_COLUMNS: &str = "id, name, origin, indications, ingredients, preparation_method, \
     frequency, duration, contraindications, active, created_at, updated_at";

impl Database {
    /// Insert or update a medicinal plant.
    pub fn upsert_plant(&self, plant: &MedicinalPlant) -> DbResult<()> {
        let usage_parts_json = serde_json::to_string(&plant.usage_parts)?;
        let cultivation_json = plant
            .cultivation
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            r#"
            INSERT INTO medicinal_plants (
                id, name, scientific_name, indigenous_name, main_use, usage_parts,
                indications, description, preparation, dosage, contraindications,
                cultivation, active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, datetime('now'))
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                scientific_name = excluded.scientific_name,
                indigenous_name = excluded.indigenous_name,
                main_use = excluded.main_use,
                usage_parts = excluded.usage_parts,
                indications = excluded.indications,
                description = excluded.description,
                preparation = excluded.preparation,
                dosage = excluded.dosage,
                contraindications = excluded.contraindications,
                cultivation = excluded.cultivation,
                active = excluded.active,
                updated_at = datetime('now')
            "#,
            params![
                plant.id,
                plant.name,
                plant.scientific_name,
                plant.indigenous_name,
                plant.main_use,
                usage_parts_json,
                plant.indications,
                plant.description,
                plant.preparation,
                plant.dosage,
                plant.contraindications,
                cultivation_json,
                plant.active,
                plant.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a plant by ID.
    pub fn get_plant(&self, id: &str) -> DbResult<Option<MedicinalPlant>> {
        self.conn
            .query_row(
                &format!("SELECT {PLANT_COLUMNS} FROM medicinal_plants WHERE id = ?"),
                [id],
                PlantRow::from_row,
            )
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    /// List plants, optionally only active ones.
    pub fn list_plants(&self, active_only: bool) -> DbResult<Vec<MedicinalPlant>> {
        let sql = if active_only {
            format!("SELECT {PLANT_COLUMNS} FROM medicinal_plants WHERE active = 1 ORDER BY name")
        } else {
            format!("SELECT {PLANT_COLUMNS} FROM medicinal_plants ORDER BY name")
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], PlantRow::from_row)?;

        let mut plants = Vec::new();
        for row in rows {
            plants.push(row?.try_into()?);
        }
        Ok(plants)
    }

    /// Mark a plant as inactive (soft delete).
    pub fn deactivate_plant(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE medicinal_plants SET active = 0, updated_at = datetime('now') WHERE id = ?",
            [id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Insert or update a compound traditional treatment.
    pub fn upsert_treatment(&self, treatment: &TraditionalTreatment) -> DbResult<()> {
        let ingredients_json = serde_json::to_string(&treatment.ingredients)?;

        self.conn.execute(
            r#"
            INSERT INTO traditional_treatments (
                id, name, origin, indications, ingredients, preparation_method,
                frequency, duration, contraindications, active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, datetime('now'))
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                origin = excluded.origin,
                indications = excluded.indications,
                ingredients = excluded.ingredients,
                preparation_method = excluded.preparation_method,
                frequency = excluded.frequency,
                duration = excluded.duration,
                contraindications = excluded.contraindications,
                active = excluded.active,
                updated_at = datetime('now')
            "#,
            params![
                treatment.id,
                treatment.name,
                treatment.origin,
                treatment.indications,
                ingredients_json,
                treatment.preparation_method,
                treatment.frequency,
                treatment.duration,
                treatment.contraindications,
                treatment.active,
                treatment.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a treatment by ID.
    pub fn get_treatment(&self, id: &str) -> DbResult<Option<TraditionalTreatment>> {
        self.conn
            .query_row(
                &format!("SELECT {TREATMENT_COLUMNS} FROM traditional_treatments WHERE id = ?"),
                [id],
                TreatmentRow::from_row,
            )
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    /// List treatments, optionally only active ones.
    pub fn list_treatments(&self, active_only: bool) -> DbResult<Vec<TraditionalTreatment>> {
        let sql = if active_only {
            format!(
                "SELECT {TREATMENT_COLUMNS} FROM traditional_treatments WHERE active = 1 ORDER BY name"
            )
        } else {
            format!("SELECT {TREATMENT_COLUMNS} FROM traditional_treatments ORDER BY name")
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], TreatmentRow::from_row)?;

        let mut treatments = Vec::new();
        for row in rows {
            treatments.push(row?.try_into()?);
        }
        Ok(treatments)
    }

    /// Mark a treatment as inactive (soft delete).
    pub fn deactivate_treatment(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE traditional_treatments SET active = 0, updated_at = datetime('now') WHERE id = ?",
            [id],
        )?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CultivationInfo;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_upsert_and_get_plant() {
        let db = setup_db();

        let mut plant = MedicinalPlant::new("Erva-baleeira".into());
        plant.scientific_name = Some("Cordia verbenacea".into());
        plant.indigenous_name = Some("Tira-dor".into());
        plant.main_use = Some("Analgesico".into());
        plant.usage_parts = vec!["Folhas".into()];
        plant.cultivation = Some(CultivationInfo {
            climate: Some("Sol Pleno".into()),
            water: Some("Moderada".into()),
            harvest: Some("Ano todo (Folhas)".into()),
            soil: Some("Arenoso e drenado".into()),
        });

        db.upsert_plant(&plant).unwrap();

        let retrieved = db.get_plant(&plant.id).unwrap().unwrap();
        assert_eq!(retrieved.scientific_name, Some("Cordia verbenacea".into()));
        assert_eq!(retrieved.usage_parts, vec!["Folhas"]);
        assert_eq!(
            retrieved.cultivation.unwrap().climate,
            Some("Sol Pleno".into())
        );
    }

    #[test]
    fn test_upsert_updates_plant() {
        let db = setup_db();

        let mut plant = MedicinalPlant::new("Guaco".into());
        db.upsert_plant(&plant).unwrap();

        plant.main_use = Some("Expectorante".into());
        db.upsert_plant(&plant).unwrap();

        let retrieved = db.get_plant(&plant.id).unwrap().unwrap();
        assert_eq!(retrieved.main_use, Some("Expectorante".into()));
        assert_eq!(db.list_plants(false).unwrap().len(), 1);
    }

    #[test]
    fn test_deactivate_plant() {
        let db = setup_db();

        let plant = MedicinalPlant::new("Copaíba".into());
        db.upsert_plant(&plant).unwrap();
        db.deactivate_plant(&plant.id).unwrap();

        assert!(db.list_plants(true).unwrap().is_empty());
        // Still retrievable directly
        let retrieved = db.get_plant(&plant.id).unwrap().unwrap();
        assert!(!retrieved.active);
    }

    #[test]
    fn test_treatment_ingredients_round_trip() {
        let db = setup_db();

        let mut t = TraditionalTreatment::new("Chá de Casca de Jatobá".into());
        t.origin = Some("Povo Tukano".into());
        t.ingredients = vec![
            Ingredient {
                name: "Casca de Jatobá".into(),
                quantity: Some("3 lascas".into()),
            },
            Ingredient {
                name: "Água".into(),
                quantity: Some("1 litro".into()),
            },
        ];
        t.preparation_method = Some("Ferver as cascas na água por 15 minutos.".into());
        t.frequency = Some("Tomar 1 xícara a cada 6 horas".into());

        db.upsert_treatment(&t).unwrap();

        let retrieved = db.get_treatment(&t.id).unwrap().unwrap();
        assert_eq!(retrieved.ingredients.len(), 2);
        assert_eq!(retrieved.ingredients[0].name, "Casca de Jatobá");
        assert_eq!(retrieved.origin, Some("Povo Tukano".into()));
    }

    #[test]
    fn test_list_treatments_active_only() {
        let db = setup_db();

        let keep = TraditionalTreatment::new("Chá de Jatobá".into());
        let drop = TraditionalTreatment::new("Garrafada antiga".into());
        db.upsert_treatment(&keep).unwrap();
        db.upsert_treatment(&drop).unwrap();
        db.deactivate_treatment(&drop.id).unwrap();

        let active = db.list_treatments(true).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, keep.id);
        assert_eq!(db.list_treatments(false).unwrap().len(), 2);
    }
}
