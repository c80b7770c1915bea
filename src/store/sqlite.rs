use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use uuid::Uuid;

use super::{require_user, TrainingStore};
use crate::calendar::{date_key, DateRange};
use crate::error::StoreError;
use crate::models::{Activity, Intensity, LifestyleEntry, PlannedWorkout, Week, WorkoutKind};

/// Relational store adapter backed by SQLite
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create or open a database at the specified path
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::Snapshot {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    /// In-memory database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize database schema with tables and indexes
    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS weeks (
                id INTEGER PRIMARY KEY,
                week_number INTEGER NOT NULL,
                start_date DATE NOT NULL,
                end_date DATE NOT NULL,
                target_km TEXT NOT NULL,
                target_elevation TEXT NOT NULL,
                notes TEXT,
                phase TEXT
            );

            CREATE TABLE IF NOT EXISTS planned_workouts (
                id INTEGER PRIMARY KEY,
                week_id INTEGER NOT NULL,
                date DATE NOT NULL,
                workout_type TEXT NOT NULL,
                target_km TEXT,
                target_duration_minutes INTEGER,
                intensity TEXT,
                is_key_workout BOOLEAN NOT NULL DEFAULT FALSE,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                FOREIGN KEY (week_id) REFERENCES weeks (id) ON DELETE CASCADE
            );

            -- start_date may hold a full timestamp; matching uses its date part
            CREATE TABLE IF NOT EXISTS activities (
                id INTEGER PRIMARY KEY,
                start_date TEXT NOT NULL,
                kind TEXT NOT NULL,
                name TEXT NOT NULL,
                distance_km TEXT NOT NULL,
                moving_time_s INTEGER NOT NULL,
                elevation_gain_m TEXT NOT NULL,
                average_heartrate TEXT,
                max_heartrate TEXT
            );

            CREATE TABLE IF NOT EXISTS lifestyle_log (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date DATE NOT NULL,
                sleep_hours TEXT,
                sleep_quality INTEGER,
                weight_kg TEXT,
                energy_level INTEGER,
                soreness_level INTEGER,
                stress_level INTEGER,
                notes TEXT,
                no_sugar BOOLEAN,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (user_id, date)
            );

            CREATE INDEX IF NOT EXISTS idx_weeks_number ON weeks (week_number);
            CREATE INDEX IF NOT EXISTS idx_workouts_week_date ON planned_workouts (week_id, date);
            CREATE INDEX IF NOT EXISTS idx_workouts_date ON planned_workouts (date);
            CREATE INDEX IF NOT EXISTS idx_activities_day ON activities (substr(start_date, 1, 10));
            "#,
        )?;
        Ok(())
    }

    /// Store an activity whose source date is a full timestamp
    pub fn insert_activity_with_timestamp(
        &mut self,
        activity: &Activity,
        start_timestamp: &str,
    ) -> Result<(), StoreError> {
        Self::write_activity(&self.conn, activity, start_timestamp)
    }

    fn write_activity(conn: &Connection, activity: &Activity, start: &str) -> Result<(), StoreError> {
        conn.execute(
            r#"
            INSERT INTO activities (
                id, start_date, kind, name, distance_km, moving_time_s,
                elevation_gain_m, average_heartrate, max_heartrate
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT (id) DO UPDATE SET
                start_date = excluded.start_date,
                kind = excluded.kind,
                name = excluded.name,
                distance_km = excluded.distance_km,
                moving_time_s = excluded.moving_time_s,
                elevation_gain_m = excluded.elevation_gain_m,
                average_heartrate = excluded.average_heartrate,
                max_heartrate = excluded.max_heartrate
            "#,
            params![
                activity.id,
                start,
                activity.kind,
                activity.name,
                activity.distance_km.to_string(),
                activity.moving_time_s,
                activity.elevation_gain_m.to_string(),
                activity.average_heartrate.map(|hr| hr.to_string()),
                activity.max_heartrate.map(|hr| hr.to_string()),
            ],
        )?;
        Ok(())
    }

    fn week_from_row(row: &Row) -> rusqlite::Result<Week> {
        Ok(Week {
            id: row.get("id")?,
            week_number: row.get("week_number")?,
            start_date: parse_date_column(row, "start_date")?,
            end_date: parse_date_column(row, "end_date")?,
            target_km: parse_decimal_column(row, "target_km")?,
            target_elevation_m: parse_decimal_column(row, "target_elevation")?,
            notes: row.get("notes")?,
            phase: row.get("phase")?,
        })
    }

    fn workout_from_row(row: &Row) -> rusqlite::Result<PlannedWorkout> {
        Ok(PlannedWorkout {
            id: row.get("id")?,
            week_id: row.get("week_id")?,
            date: parse_date_column(row, "date")?,
            kind: WorkoutKind::from(row.get::<_, String>("workout_type")?),
            target_km: parse_optional_decimal_column(row, "target_km")?,
            target_duration_minutes: row.get("target_duration_minutes")?,
            intensity: row
                .get::<_, Option<String>>("intensity")?
                .as_deref()
                .and_then(Intensity::parse_label),
            is_key_workout: row.get("is_key_workout")?,
            title: row.get("title")?,
            description: row.get("description")?,
        })
    }

    fn activity_from_row(row: &Row) -> rusqlite::Result<Activity> {
        Ok(Activity {
            id: row.get("id")?,
            date: parse_date_column(row, "start_date")?,
            kind: row.get("kind")?,
            name: row.get("name")?,
            distance_km: parse_decimal_column(row, "distance_km")?,
            moving_time_s: row.get("moving_time_s")?,
            elevation_gain_m: parse_decimal_column(row, "elevation_gain_m")?,
            average_heartrate: parse_optional_decimal_column(row, "average_heartrate")?,
            max_heartrate: parse_optional_decimal_column(row, "max_heartrate")?,
        })
    }

    fn lifestyle_from_row(row: &Row) -> rusqlite::Result<LifestyleEntry> {
        Ok(LifestyleEntry {
            date: parse_date_column(row, "date")?,
            sleep_hours: parse_optional_decimal_column(row, "sleep_hours")?,
            sleep_quality: row.get("sleep_quality")?,
            weight_kg: parse_optional_decimal_column(row, "weight_kg")?,
            energy_level: row.get("energy_level")?,
            soreness_level: row.get("soreness_level")?,
            stress_level: row.get("stress_level")?,
            notes: row.get("notes")?,
            no_sugar: row.get("no_sugar")?,
        })
    }

    fn query_workouts<P: rusqlite::Params>(
        &self,
        where_clause: &str,
        params: P,
    ) -> Result<Vec<PlannedWorkout>, StoreError> {
        let sql = format!(
            "SELECT id, week_id, date, workout_type, target_km, target_duration_minutes,
                    intensity, is_key_workout, title, description
             FROM planned_workouts
             WHERE {}
             ORDER BY date, id",
            where_clause
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params, Self::workout_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl TrainingStore for SqliteStore {
    fn fetch_weeks(&self) -> Result<Vec<Week>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, week_number, start_date, end_date, target_km, target_elevation, notes, phase
             FROM weeks
             ORDER BY week_number, id",
        )?;
        let rows = stmt.query_map([], Self::week_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn fetch_workouts_for_week(&self, week_id: i64) -> Result<Vec<PlannedWorkout>, StoreError> {
        self.query_workouts("week_id = ?1", params![week_id])
    }

    fn fetch_workouts_in_range(&self, range: DateRange) -> Result<Vec<PlannedWorkout>, StoreError> {
        self.query_workouts(
            "date >= ?1 AND date <= ?2",
            params![range.start.to_string(), range.end.to_string()],
        )
    }

    fn fetch_activities(&self, range: DateRange) -> Result<Vec<Activity>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, start_date, kind, name, distance_km, moving_time_s,
                    elevation_gain_m, average_heartrate, max_heartrate
             FROM activities
             WHERE substr(start_date, 1, 10) BETWEEN ?1 AND ?2
             ORDER BY substr(start_date, 1, 10), start_date, id",
        )?;
        let rows = stmt.query_map(
            params![range.start.to_string(), range.end.to_string()],
            Self::activity_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn upsert_activities(&mut self, activities: &[Activity]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        for activity in activities {
            Self::write_activity(&tx, activity, &activity.date.to_string())?;
        }
        tx.commit()?;
        tracing::debug!(count = activities.len(), "Upserted activities");
        Ok(activities.len())
    }

    fn save_plan(&mut self, weeks: &[Week], workouts: &[PlannedWorkout]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for week in weeks {
            tx.execute(
                r#"
                INSERT INTO weeks (
                    id, week_number, start_date, end_date, target_km, target_elevation, notes, phase
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT (id) DO UPDATE SET
                    week_number = excluded.week_number,
                    start_date = excluded.start_date,
                    end_date = excluded.end_date,
                    target_km = excluded.target_km,
                    target_elevation = excluded.target_elevation,
                    notes = excluded.notes,
                    phase = excluded.phase
                "#,
                params![
                    week.id,
                    week.week_number,
                    week.start_date.to_string(),
                    week.end_date.to_string(),
                    week.target_km.to_string(),
                    week.target_elevation_m.to_string(),
                    week.notes,
                    week.phase,
                ],
            )?;
        }
        for workout in workouts {
            tx.execute(
                r#"
                INSERT INTO planned_workouts (
                    id, week_id, date, workout_type, target_km, target_duration_minutes,
                    intensity, is_key_workout, title, description
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT (id) DO UPDATE SET
                    week_id = excluded.week_id,
                    date = excluded.date,
                    workout_type = excluded.workout_type,
                    target_km = excluded.target_km,
                    target_duration_minutes = excluded.target_duration_minutes,
                    intensity = excluded.intensity,
                    is_key_workout = excluded.is_key_workout,
                    title = excluded.title,
                    description = excluded.description
                "#,
                params![
                    workout.id,
                    workout.week_id,
                    workout.date.to_string(),
                    workout.kind.as_str(),
                    workout.target_km.map(|km| km.to_string()),
                    workout.target_duration_minutes,
                    workout.intensity.map(|i| i.as_str()),
                    workout.is_key_workout,
                    workout.title,
                    workout.description,
                ],
            )?;
        }
        tx.commit()?;
        tracing::info!(weeks = weeks.len(), workouts = workouts.len(), "Saved training plan");
        Ok(())
    }

    fn upsert_lifestyle(&mut self, user_id: &str, entry: &LifestyleEntry) -> Result<(), StoreError> {
        require_user(user_id)?;
        self.conn.execute(
            r#"
            INSERT INTO lifestyle_log (
                id, user_id, date, sleep_hours, sleep_quality, weight_kg,
                energy_level, soreness_level, stress_level, notes, no_sugar
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT (user_id, date) DO UPDATE SET
                sleep_hours = excluded.sleep_hours,
                sleep_quality = excluded.sleep_quality,
                weight_kg = excluded.weight_kg,
                energy_level = excluded.energy_level,
                soreness_level = excluded.soreness_level,
                stress_level = excluded.stress_level,
                notes = excluded.notes,
                no_sugar = excluded.no_sugar,
                updated_at = CURRENT_TIMESTAMP
            "#,
            params![
                Uuid::new_v4().to_string(),
                user_id,
                entry.date.to_string(),
                entry.sleep_hours.map(|h| h.to_string()),
                entry.sleep_quality,
                entry.weight_kg.map(|w| w.to_string()),
                entry.energy_level,
                entry.soreness_level,
                entry.stress_level,
                entry.notes,
                entry.no_sugar,
            ],
        )?;
        Ok(())
    }

    fn fetch_lifestyle(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<LifestyleEntry>, StoreError> {
        let entry = self
            .conn
            .query_row(
                "SELECT date, sleep_hours, sleep_quality, weight_kg, energy_level,
                        soreness_level, stress_level, notes, no_sugar
                 FROM lifestyle_log
                 WHERE user_id = ?1 AND date = ?2",
                params![user_id, date.to_string()],
                Self::lifestyle_from_row,
            )
            .optional()?;
        Ok(entry)
    }
}

fn conversion_error(column: &str, reason: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(StoreError::InvalidRecord {
            collection: column.to_string(),
            reason,
        }),
    )
}

fn parse_date_column(row: &Row, column: &str) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(column)?;
    date_key(&raw).ok_or_else(|| conversion_error(column, format!("not a date: {}", raw)))
}

fn parse_decimal_column(row: &Row, column: &str) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(column)?;
    raw.parse::<Decimal>()
        .map_err(|e| conversion_error(column, format!("{}: {}", raw, e)))
}

fn parse_optional_decimal_column(row: &Row, column: &str) -> rusqlite::Result<Option<Decimal>> {
    row.get::<_, Option<String>>(column)?
        .map(|raw| {
            raw.parse::<Decimal>()
                .map_err(|e| conversion_error(column, format!("{}: {}", raw, e)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn create_activity(id: i64, date: NaiveDate) -> Activity {
        Activity {
            id,
            date,
            kind: "Run".to_string(),
            name: "Lunch Run".to_string(),
            distance_km: dec!(8.25),
            moving_time_s: 2700,
            elevation_gain_m: dec!(35),
            average_heartrate: Some(dec!(148.6)),
            max_heartrate: None,
        }
    }

    #[test]
    fn test_timestamped_activity_matches_its_date() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let activity = create_activity(1, d(6));
        store
            .insert_activity_with_timestamp(&activity, "2026-01-06T23:30:00Z")
            .unwrap();

        let found = store.fetch_activities(DateRange::new(d(6), d(6))).unwrap();
        assert_eq!(found, vec![activity]);

        let none = store.fetch_activities(DateRange::new(d(7), d(11))).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_decimal_columns_keep_precision() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_activities(&[create_activity(1, d(6))]).unwrap();

        let found = store.fetch_activities(DateRange::new(d(5), d(11))).unwrap();
        assert_eq!(found[0].distance_km, dec!(8.25));
        assert_eq!(found[0].average_heartrate, Some(dec!(148.6)));
    }

    #[test]
    fn test_lifestyle_upsert_replaces_same_day() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut entry = LifestyleEntry::new(d(6));
        entry.sleep_hours = Some(dec!(7));
        store.upsert_lifestyle("athlete-1", &entry).unwrap();

        entry.sleep_hours = Some(dec!(8.5));
        entry.no_sugar = Some(true);
        store.upsert_lifestyle("athlete-1", &entry).unwrap();

        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM lifestyle_log", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);

        let stored = store.fetch_lifestyle("athlete-1", d(6)).unwrap().unwrap();
        assert_eq!(stored.sleep_hours, Some(dec!(8.5)));
        assert_eq!(stored.no_sugar, Some(true));
        assert!(store.fetch_lifestyle("athlete-2", d(6)).unwrap().is_none());
    }

    #[test]
    fn test_lifestyle_requires_user() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let err = store
            .upsert_lifestyle("", &LifestyleEntry::new(d(6)))
            .unwrap_err();
        assert!(matches!(err, StoreError::Unauthenticated));
    }
}
