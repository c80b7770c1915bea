//! Backend contract for plan, activity and lifestyle data.
//!
//! The relational and document adapters are interchangeable behind
//! [`TrainingStore`]; callers pick one through [`open_store`].

pub mod document;
pub mod sqlite;

use chrono::NaiveDate;

use crate::calendar::DateRange;
use crate::config::{StoreBackend, StoreSettings};
use crate::error::StoreError;
use crate::models::{Activity, LifestyleEntry, PlannedWorkout, Week};

pub use document::DocumentStore;
pub use sqlite::SqliteStore;

/// Collection and table names shared by both adapters
pub mod collections {
    pub const WEEKS: &str = "weeks";
    pub const PLANNED_WORKOUTS: &str = "planned_workouts";
    pub const ACTIVITIES: &str = "activities";
    pub const LIFESTYLE_LOG: &str = "lifestyle_log";
}

/// Source of training data handed to the reconciliation core
pub trait TrainingStore {
    /// All weeks, ordered by week number
    fn fetch_weeks(&self) -> Result<Vec<Week>, StoreError>;

    /// Workouts of one week, ordered by date
    fn fetch_workouts_for_week(&self, week_id: i64) -> Result<Vec<PlannedWorkout>, StoreError>;

    /// Workouts dated within `range`, ordered by date
    fn fetch_workouts_in_range(&self, range: DateRange) -> Result<Vec<PlannedWorkout>, StoreError>;

    /// Activities whose date falls within `range`, ordered by date
    fn fetch_activities(&self, range: DateRange) -> Result<Vec<Activity>, StoreError>;

    /// Insert or replace activities by id; returns how many were written
    fn upsert_activities(&mut self, activities: &[Activity]) -> Result<usize, StoreError>;

    /// Insert or replace weeks and workouts by id
    fn save_plan(&mut self, weeks: &[Week], workouts: &[PlannedWorkout]) -> Result<(), StoreError>;

    /// Insert or replace the entry keyed by (user, date)
    fn upsert_lifestyle(&mut self, user_id: &str, entry: &LifestyleEntry) -> Result<(), StoreError>;

    fn fetch_lifestyle(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<LifestyleEntry>, StoreError>;
}

/// Open the adapter selected in the configuration
pub fn open_store(settings: &StoreSettings) -> Result<Box<dyn TrainingStore>, StoreError> {
    tracing::debug!(backend = ?settings.backend, path = %settings.path.display(), "Opening store");
    match settings.backend {
        StoreBackend::Sqlite => Ok(Box::new(SqliteStore::open(&settings.path)?)),
        StoreBackend::Document => Ok(Box::new(DocumentStore::open(&settings.path)?)),
    }
}

fn require_user(user_id: &str) -> Result<(), StoreError> {
    if user_id.trim().is_empty() {
        return Err(StoreError::Unauthenticated);
    }
    Ok(())
}
