use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

use super::read_to_string;
use crate::error::ImportError;
use crate::models::{Intensity, PlannedWorkout, Week, WorkoutKind};
use crate::week_resolver::{validate_sequence, SequenceIssue};

#[derive(Debug, Deserialize)]
struct PlanFile {
    weeks: Vec<PlanWeek>,
}

#[derive(Debug, Deserialize)]
struct PlanWeek {
    #[serde(flatten)]
    week: Week,
    #[serde(default)]
    workouts: Vec<PlanWorkout>,
}

#[derive(Debug, Deserialize)]
struct PlanWorkout {
    id: i64,
    date: NaiveDate,
    kind: WorkoutKind,
    #[serde(default)]
    target_km: Option<Decimal>,
    #[serde(default)]
    target_duration_minutes: Option<u32>,
    /// Free label; "null" and unknown labels mean no intensity
    #[serde(default)]
    intensity: Option<String>,
    #[serde(default)]
    is_key_workout: bool,
    title: String,
    #[serde(default)]
    description: String,
}

/// A training plan read from a file, ready to be saved to a store
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedPlan {
    pub weeks: Vec<Week>,
    pub workouts: Vec<PlannedWorkout>,
    /// Non-fatal problems in the week sequence
    pub issues: Vec<SequenceIssue>,
}

/// Reads JSON training plans
pub struct PlanImporter;

impl PlanImporter {
    pub fn import_file(file_path: &Path) -> Result<ImportedPlan, ImportError> {
        let content = read_to_string(file_path)?;
        Self::parse(&content)
    }

    /// Parse a plan. Workouts dated outside their week are rejected; gaps
    /// and overlaps between weeks are reported in `issues`.
    pub fn parse(content: &str) -> Result<ImportedPlan, ImportError> {
        let file: PlanFile = serde_json::from_str(content)?;

        let mut weeks = Vec::with_capacity(file.weeks.len());
        let mut workouts = Vec::new();

        for PlanWeek { week, workouts: planned } in file.weeks {
            for workout in planned {
                if !week.contains(workout.date) {
                    return Err(ImportError::InvalidStructure {
                        reason: format!(
                            "workout {} on {} is outside week {} ({} to {})",
                            workout.id, workout.date, week.week_number, week.start_date, week.end_date
                        ),
                    });
                }
                workouts.push(PlannedWorkout {
                    id: workout.id,
                    week_id: week.id,
                    date: workout.date,
                    kind: workout.kind,
                    target_km: workout.target_km,
                    target_duration_minutes: workout.target_duration_minutes,
                    intensity: workout.intensity.as_deref().and_then(Intensity::parse_label),
                    is_key_workout: workout.is_key_workout,
                    title: workout.title,
                    description: workout.description,
                });
            }
            weeks.push(week);
        }

        weeks.sort_by_key(|w| w.week_number);
        workouts.sort_by_key(|w| (w.date, w.id));

        let issues = validate_sequence(&weeks);
        for issue in &issues {
            tracing::warn!(%issue, "Training plan week sequence issue");
        }

        Ok(ImportedPlan {
            weeks,
            workouts,
            issues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const PLAN: &str = r#"{
        "weeks": [
            {
                "id": 2,
                "week_number": 2,
                "start_date": "2026-01-12",
                "end_date": "2026-01-18",
                "target_km": 45,
                "target_elevation_m": 600,
                "phase": "base"
            },
            {
                "id": 1,
                "week_number": 1,
                "start_date": "2026-01-05",
                "end_date": "2026-01-11",
                "target_km": "40.5",
                "notes": "Easy start",
                "workouts": [
                    {
                        "id": 10,
                        "date": "2026-01-06",
                        "kind": "run",
                        "target_km": 10,
                        "intensity": "null",
                        "title": "Easy run"
                    },
                    {
                        "id": 11,
                        "date": "2026-01-10",
                        "kind": "back_to_back",
                        "intensity": "hard",
                        "is_key_workout": true,
                        "title": "Back to back",
                        "description": "Saturday and Sunday long"
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_plan() {
        let plan = PlanImporter::parse(PLAN).unwrap();

        assert_eq!(plan.weeks.len(), 2);
        assert_eq!(plan.weeks[0].week_number, 1);
        assert_eq!(plan.weeks[0].target_km, dec!(40.5));
        assert_eq!(plan.weeks[1].target_elevation_m, dec!(600));
        assert!(plan.issues.is_empty());

        assert_eq!(plan.workouts.len(), 2);
        assert_eq!(plan.workouts[0].week_id, 1);
        assert_eq!(plan.workouts[0].intensity, None);
        assert_eq!(plan.workouts[1].kind, WorkoutKind::BackToBack);
        assert_eq!(plan.workouts[1].intensity, Some(Intensity::Hard));
        assert!(plan.workouts[1].is_key_workout);
    }

    #[test]
    fn test_workout_outside_week_is_rejected() {
        let content = r#"{"weeks": [{
            "id": 1, "week_number": 1,
            "start_date": "2026-01-05", "end_date": "2026-01-11", "target_km": 40,
            "workouts": [{"id": 1, "date": "2026-01-12", "kind": "run", "title": "Late"}]
        }]}"#;

        let err = PlanImporter::parse(content).unwrap_err();
        assert!(matches!(err, ImportError::InvalidStructure { .. }));
    }

    #[test]
    fn test_gap_is_reported_not_rejected() {
        let content = r#"{"weeks": [
            {"id": 1, "week_number": 1, "start_date": "2026-01-05", "end_date": "2026-01-11", "target_km": 40},
            {"id": 3, "week_number": 3, "start_date": "2026-01-19", "end_date": "2026-01-25", "target_km": 40}
        ]}"#;

        let plan = PlanImporter::parse(content).unwrap();
        assert_eq!(plan.issues.len(), 1);
    }
}
