use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::{collections, require_user, TrainingStore};
use crate::calendar::{date_key, DateRange};
use crate::error::StoreError;
use crate::models::{Activity, LifestyleEntry, PlannedWorkout, Week};

type Collection = BTreeMap<String, Value>;

/// Activity as stored in the document collection. The start time keeps the
/// full timestamp reported by the fitness service.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActivityDocument {
    id: i64,
    start_time: String,
    kind: String,
    name: String,
    distance_km: Decimal,
    moving_time_s: u32,
    #[serde(default)]
    elevation_gain_m: Decimal,
    #[serde(default)]
    average_heartrate: Option<Decimal>,
    #[serde(default)]
    max_heartrate: Option<Decimal>,
}

impl ActivityDocument {
    fn from_activity(activity: &Activity, start_time: String) -> Self {
        Self {
            id: activity.id,
            start_time,
            kind: activity.kind.clone(),
            name: activity.name.clone(),
            distance_km: activity.distance_km,
            moving_time_s: activity.moving_time_s,
            elevation_gain_m: activity.elevation_gain_m,
            average_heartrate: activity.average_heartrate,
            max_heartrate: activity.max_heartrate,
        }
    }

    fn into_activity(self) -> Result<Activity, StoreError> {
        let date = date_key(&self.start_time).ok_or_else(|| StoreError::InvalidRecord {
            collection: collections::ACTIVITIES.to_string(),
            reason: format!("activity {} has no usable start time: {}", self.id, self.start_time),
        })?;
        Ok(Activity {
            id: self.id,
            date,
            kind: self.kind,
            name: self.name,
            distance_km: self.distance_km,
            moving_time_s: self.moving_time_s,
            elevation_gain_m: self.elevation_gain_m,
            average_heartrate: self.average_heartrate,
            max_heartrate: self.max_heartrate,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LifestyleDocument {
    id: String,
    user_id: String,
    #[serde(flatten)]
    entry: LifestyleEntry,
}

/// Document store adapter: named collections of JSON documents, optionally
/// persisted as a single snapshot file after every write.
#[derive(Debug, Default)]
pub struct DocumentStore {
    path: Option<PathBuf>,
    collections: BTreeMap<String, Collection>,
}

impl DocumentStore {
    /// Store that lives only in memory
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a snapshot file, starting empty when it does not exist yet
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let collections = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| StoreError::Snapshot {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&content)?
        } else {
            tracing::info!(path = %path.display(), "Snapshot not found, starting empty document store");
            BTreeMap::new()
        };

        Ok(Self {
            path: Some(path),
            collections,
        })
    }

    /// Write the snapshot to disk, if the store is file-backed
    pub fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Snapshot {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let json = serde_json::to_string_pretty(&self.collections)?;
        fs::write(path, json).map_err(|source| StoreError::Snapshot {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Document snapshot written");
        Ok(())
    }

    /// Store an activity document with the full start timestamp from the source
    pub fn insert_activity_document(
        &mut self,
        activity: &Activity,
        start_time: &str,
    ) -> Result<(), StoreError> {
        let document = ActivityDocument::from_activity(activity, start_time.to_string());
        self.put(collections::ACTIVITIES, activity.id.to_string(), &document)?;
        self.flush()
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, BTreeMap::len)
    }

    fn put<T: Serialize>(&mut self, collection: &str, key: String, document: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(document)?;
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(key, value);
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, collection: &str, key: &str) -> Result<Option<T>, StoreError> {
        self.collections
            .get(collection)
            .and_then(|docs| docs.get(key))
            .map(|value| serde_json::from_value(value.clone()).map_err(StoreError::from))
            .transpose()
    }

    fn all<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, StoreError> {
        match self.collections.get(collection) {
            Some(docs) => docs
                .values()
                .map(|value| serde_json::from_value(value.clone()).map_err(StoreError::from))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    fn lifestyle_key(user_id: &str, date: NaiveDate) -> String {
        format!("{}:{}", user_id, date)
    }

    fn workouts_where<F>(&self, keep: F) -> Result<Vec<PlannedWorkout>, StoreError>
    where
        F: Fn(&PlannedWorkout) -> bool,
    {
        let mut workouts: Vec<PlannedWorkout> = self
            .all::<PlannedWorkout>(collections::PLANNED_WORKOUTS)?
            .into_iter()
            .filter(|w| keep(w))
            .collect();
        workouts.sort_by_key(|w| (w.date, w.id));
        Ok(workouts)
    }
}

impl TrainingStore for DocumentStore {
    fn fetch_weeks(&self) -> Result<Vec<Week>, StoreError> {
        let mut weeks: Vec<Week> = self.all(collections::WEEKS)?;
        weeks.sort_by_key(|w| (w.week_number, w.id));
        Ok(weeks)
    }

    fn fetch_workouts_for_week(&self, week_id: i64) -> Result<Vec<PlannedWorkout>, StoreError> {
        self.workouts_where(|w| w.week_id == week_id)
    }

    fn fetch_workouts_in_range(&self, range: DateRange) -> Result<Vec<PlannedWorkout>, StoreError> {
        self.workouts_where(|w| range.contains(w.date))
    }

    fn fetch_activities(&self, range: DateRange) -> Result<Vec<Activity>, StoreError> {
        let mut documents: Vec<ActivityDocument> = self.all(collections::ACTIVITIES)?;
        documents.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));

        let mut activities = Vec::new();
        for document in documents {
            let activity = document.into_activity()?;
            if range.contains(activity.date) {
                activities.push(activity);
            }
        }
        activities.sort_by_key(|a| a.date);
        Ok(activities)
    }

    fn upsert_activities(&mut self, activities: &[Activity]) -> Result<usize, StoreError> {
        for activity in activities {
            let document = ActivityDocument::from_activity(activity, activity.date.to_string());
            self.put(collections::ACTIVITIES, activity.id.to_string(), &document)?;
        }
        self.flush()?;
        Ok(activities.len())
    }

    fn save_plan(&mut self, weeks: &[Week], workouts: &[PlannedWorkout]) -> Result<(), StoreError> {
        for week in weeks {
            self.put(collections::WEEKS, week.id.to_string(), week)?;
        }
        for workout in workouts {
            self.put(collections::PLANNED_WORKOUTS, workout.id.to_string(), workout)?;
        }
        tracing::info!(weeks = weeks.len(), workouts = workouts.len(), "Saved training plan");
        self.flush()
    }

    fn upsert_lifestyle(&mut self, user_id: &str, entry: &LifestyleEntry) -> Result<(), StoreError> {
        require_user(user_id)?;
        let key = Self::lifestyle_key(user_id, entry.date);
        let id = self
            .get::<LifestyleDocument>(collections::LIFESTYLE_LOG, &key)?
            .map(|existing| existing.id)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let document = LifestyleDocument {
            id,
            user_id: user_id.to_string(),
            entry: entry.clone(),
        };
        self.put(collections::LIFESTYLE_LOG, key, &document)?;
        self.flush()
    }

    fn fetch_lifestyle(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<LifestyleEntry>, StoreError> {
        Ok(self
            .get::<LifestyleDocument>(collections::LIFESTYLE_LOG, &Self::lifestyle_key(user_id, date))?
            .map(|doc| doc.entry))
    }
}
