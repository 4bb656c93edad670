// WorkoutClass Entity + Class Catalog
//
// Only the owning trainer may modify or delete a class. The check is
// fetch-then-compare against the stored record; there is no separate ACL.

use crate::db::Database;
use crate::error::{GymError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

pub const DEFAULT_CAPACITY: i64 = 20;
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutClass {
    pub id: i64,
    pub class_type: String,
    pub description: String,
    /// Owning trainer account
    pub trainer_id: i64,
    pub capacity: i64,
    pub schedule_time: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl WorkoutClass {
    /// New, unsaved class with the default capacity and duration, scheduled now
    pub fn new(class_type: impl Into<String>, description: impl Into<String>, trainer_id: i64) -> Self {
        WorkoutClass {
            id: 0,
            class_type: class_type.into(),
            description: description.into(),
            trainer_id,
            capacity: DEFAULT_CAPACITY,
            schedule_time: Utc::now(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }
}

pub struct ClassCatalog<'a> {
    db: &'a Database,
}

impl<'a> ClassCatalog<'a> {
    pub fn new(db: &'a Database) -> Self {
        ClassCatalog { db }
    }

    pub fn create(&self, class_type: &str, description: &str, trainer_id: i64) -> Result<WorkoutClass> {
        let mut class = WorkoutClass::new(class_type, description, trainer_id);
        class.id = self.db.insert_class(&class)?;

        info!(class_id = class.id, trainer_id, class_type, "workout class created");
        Ok(class)
    }

    pub fn get_by_id(&self, id: i64) -> Result<WorkoutClass> {
        self.db
            .find_class_by_id(id)?
            .ok_or_else(|| GymError::not_found("workout class", id))
    }

    pub fn list_by_trainer(&self, trainer_id: i64) -> Result<Vec<WorkoutClass>> {
        self.db.list_classes_by_trainer(trainer_id)
    }

    pub fn list_all(&self) -> Result<Vec<WorkoutClass>> {
        self.db.list_classes()
    }

    /// Persist type/description. `class.trainer_id` must match the stored owner.
    pub fn update(&self, class: &WorkoutClass) -> Result<bool> {
        self.ensure_owner(class.id, class.trainer_id, "update")?;

        let updated = self.db.update_class(class)?;
        if updated {
            info!(class_id = class.id, trainer_id = class.trainer_id, "workout class updated");
        }
        Ok(updated)
    }

    pub fn delete(&self, id: i64, trainer_id: i64) -> Result<bool> {
        self.ensure_owner(id, trainer_id, "delete")?;

        let deleted = self.db.delete_class(id, trainer_id)?;
        if deleted {
            info!(class_id = id, trainer_id, "workout class deleted");
        }
        Ok(deleted)
    }

    /// Missing class and foreign class fail the same way
    fn ensure_owner(&self, id: i64, trainer_id: i64, action: &str) -> Result<()> {
        match self.db.find_class_by_id(id)? {
            Some(existing) if existing.trainer_id == trainer_id => Ok(()),
            _ => {
                warn!(class_id = id, trainer_id, action, "workout class ownership check failed");
                Err(GymError::unauthorized(format!(
                    "not allowed to {} workout class {}",
                    action, id
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_uses_defaults() {
        let db = Database::open_in_memory().unwrap();
        let catalog = ClassCatalog::new(&db);

        let before = Utc::now();
        let class = catalog.create("Yoga", "relax", 5).unwrap();

        assert!(class.id > 0);
        assert_eq!(class.trainer_id, 5);
        assert_eq!(class.capacity, DEFAULT_CAPACITY);
        assert_eq!(class.duration_minutes, DEFAULT_DURATION_MINUTES);
        assert!(class.schedule_time >= before);
    }

    #[test]
    fn test_ownership_scenario() {
        let db = Database::open_in_memory().unwrap();
        let catalog = ClassCatalog::new(&db);

        let class = catalog.create("Yoga", "relax", 5).unwrap();

        let mut foreign = class.clone();
        foreign.trainer_id = 6;
        foreign.description = "hijacked".to_string();
        assert!(matches!(catalog.update(&foreign), Err(GymError::Unauthorized(_))));
        assert_eq!(catalog.get_by_id(class.id).unwrap().description, "relax");

        assert!(matches!(catalog.delete(class.id, 6), Err(GymError::Unauthorized(_))));
        assert!(catalog.delete(class.id, 5).unwrap());
        assert!(matches!(
            catalog.get_by_id(class.id),
            Err(GymError::NotFound { .. })
        ));
    }

    #[test]
    fn test_missing_class_is_unauthorized() {
        let db = Database::open_in_memory().unwrap();
        let catalog = ClassCatalog::new(&db);

        let ghost = WorkoutClass {
            id: 77,
            ..WorkoutClass::new("Spin", "fast", 5)
        };
        assert!(matches!(catalog.update(&ghost), Err(GymError::Unauthorized(_))));
        assert!(matches!(catalog.delete(77, 5), Err(GymError::Unauthorized(_))));
    }

    #[test]
    fn test_owner_can_update() {
        let db = Database::open_in_memory().unwrap();
        let catalog = ClassCatalog::new(&db);

        let mut class = catalog.create("Yoga", "relax", 5).unwrap();
        class.class_type = "Power Yoga".to_string();
        class.description = "sweat".to_string();
        assert!(catalog.update(&class).unwrap());

        let stored = catalog.get_by_id(class.id).unwrap();
        assert_eq!(stored.class_type, "Power Yoga");
        assert_eq!(stored.description, "sweat");
        assert_eq!(stored.capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_listing_by_trainer() {
        let db = Database::open_in_memory().unwrap();
        let catalog = ClassCatalog::new(&db);

        catalog.create("Yoga", "relax", 5).unwrap();
        catalog.create("Spin", "fast", 5).unwrap();
        catalog.create("Boxing", "punch", 6).unwrap();

        assert_eq!(catalog.list_by_trainer(5).unwrap().len(), 2);
        assert_eq!(catalog.list_by_trainer(6).unwrap().len(), 1);
        assert!(catalog.list_by_trainer(7).unwrap().is_empty());
        assert_eq!(catalog.list_all().unwrap().len(), 3);
    }
}
