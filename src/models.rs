use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::calendar::DateRange;

/// Kinds of planned workouts in a training plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkoutKind {
    Run,
    Walk,
    Strength,
    Rest,
    LongRun,
    BackToBack,
    Other,
}

impl WorkoutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutKind::Run => "run",
            WorkoutKind::Walk => "walk",
            WorkoutKind::Strength => "strength",
            WorkoutKind::Rest => "rest",
            WorkoutKind::LongRun => "long_run",
            WorkoutKind::BackToBack => "back_to_back",
            WorkoutKind::Other => "other",
        }
    }

    /// Short symbol used in terminal listings
    pub fn symbol(&self) -> &'static str {
        match self {
            WorkoutKind::Run => "RUN",
            WorkoutKind::Walk => "WLK",
            WorkoutKind::Strength => "STR",
            WorkoutKind::Rest => "RST",
            WorkoutKind::LongRun => "LNG",
            WorkoutKind::BackToBack => "B2B",
            WorkoutKind::Other => "---",
        }
    }
}

impl FromStr for WorkoutKind {
    type Err = std::convert::Infallible;

    /// Unknown labels map to `Other` rather than failing.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "run" => WorkoutKind::Run,
            "walk" => WorkoutKind::Walk,
            "strength" => WorkoutKind::Strength,
            "rest" => WorkoutKind::Rest,
            "long_run" => WorkoutKind::LongRun,
            "back_to_back" => WorkoutKind::BackToBack,
            _ => WorkoutKind::Other,
        })
    }
}

impl From<String> for WorkoutKind {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(WorkoutKind::Other)
    }
}

impl From<WorkoutKind> for String {
    fn from(kind: WorkoutKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intensity label of a planned workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Easy,
    Moderate,
    Hard,
}

impl Intensity {
    /// Parse a stored label. Empty strings and the literal `"null"` mean
    /// no intensity; so does any unrecognized label.
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "easy" => Some(Intensity::Easy),
            "moderate" => Some(Intensity::Moderate),
            "hard" => Some(Intensity::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Easy => "easy",
            Intensity::Moderate => "moderate",
            Intensity::Hard => "hard",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A calendar week of the training plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Week {
    /// Unique identifier for the week
    pub id: i64,

    /// Sequential week number within the plan
    pub week_number: u32,

    /// First day of the week (inclusive)
    pub start_date: NaiveDate,

    /// Last day of the week (inclusive)
    pub end_date: NaiveDate,

    /// Target distance in kilometers
    pub target_km: Decimal,

    /// Target elevation gain in meters
    #[serde(default)]
    pub target_elevation_m: Decimal,

    /// Optional free-text note for the week
    #[serde(default)]
    pub notes: Option<String>,

    /// Training phase label (base, build, peak, taper...)
    #[serde(default)]
    pub phase: Option<String>,
}

impl Week {
    /// Inclusive date range covered by this week
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// A workout scheduled on a specific date within a week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedWorkout {
    pub id: i64,

    /// Owning week
    pub week_id: i64,

    /// Scheduled date, within the owning week's range
    pub date: NaiveDate,

    pub kind: WorkoutKind,

    /// Target distance in kilometers
    #[serde(default)]
    pub target_km: Option<Decimal>,

    /// Target duration in minutes
    #[serde(default)]
    pub target_duration_minutes: Option<u32>,

    #[serde(default)]
    pub intensity: Option<Intensity>,

    /// Higher-priority, non-negotiable session
    #[serde(default)]
    pub is_key_workout: bool,

    pub title: String,

    #[serde(default)]
    pub description: String,
}

impl PlannedWorkout {
    /// True when neither a distance nor a duration target is set
    pub fn has_no_targets(&self) -> bool {
        self.target_km.is_none() && self.target_duration_minutes.is_none()
    }
}

/// An activity logged with the external fitness service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,

    /// Calendar date of the activity; only the date is significant for matching
    pub date: NaiveDate,

    /// Activity kind as reported by the source (Run, Walk, Hike...)
    pub kind: String,

    pub name: String,

    /// Distance in kilometers
    pub distance_km: Decimal,

    /// Moving time in seconds
    pub moving_time_s: u32,

    /// Elevation gain in meters
    #[serde(default)]
    pub elevation_gain_m: Decimal,

    /// Average heart rate in beats per minute
    #[serde(default)]
    pub average_heartrate: Option<Decimal>,

    /// Maximum heart rate in beats per minute
    #[serde(default)]
    pub max_heartrate: Option<Decimal>,
}

/// A daily lifestyle log entry, keyed by (user, date)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifestyleEntry {
    pub date: NaiveDate,

    #[serde(default)]
    pub sleep_hours: Option<Decimal>,

    /// Sleep quality on a 1-10 scale
    #[serde(default)]
    pub sleep_quality: Option<u8>,

    #[serde(default)]
    pub weight_kg: Option<Decimal>,

    #[serde(default)]
    pub energy_level: Option<u8>,

    #[serde(default)]
    pub soreness_level: Option<u8>,

    #[serde(default)]
    pub stress_level: Option<u8>,

    #[serde(default)]
    pub notes: Option<String>,

    /// Day without added sugar
    #[serde(default)]
    pub no_sugar: Option<bool>,
}

impl LifestyleEntry {
    pub const LEVEL_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            ..Self::default()
        }
    }

    /// Check value ranges before the entry is written
    pub fn validate(&self) -> Result<(), String> {
        let levels = [
            ("sleep_quality", self.sleep_quality),
            ("energy_level", self.energy_level),
            ("soreness_level", self.soreness_level),
            ("stress_level", self.stress_level),
        ];
        for (field, value) in levels {
            if let Some(v) = value {
                if !Self::LEVEL_RANGE.contains(&v) {
                    return Err(format!("{} must be between 1 and 10, got {}", field, v));
                }
            }
        }

        if let Some(hours) = self.sleep_hours {
            if hours < Decimal::ZERO || hours > Decimal::from(24) {
                return Err(format!("sleep_hours must be between 0 and 24, got {}", hours));
            }
        }

        if let Some(weight) = self.weight_kg {
            if weight <= Decimal::ZERO {
                return Err(format!("weight_kg must be positive, got {}", weight));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_workout_kind_labels() {
        assert_eq!("long_run".parse::<WorkoutKind>().unwrap(), WorkoutKind::LongRun);
        assert_eq!("back_to_back".parse::<WorkoutKind>().unwrap(), WorkoutKind::BackToBack);
        assert_eq!("yoga".parse::<WorkoutKind>().unwrap(), WorkoutKind::Other);
        assert_eq!(String::from(WorkoutKind::Rest), "rest");
    }

    #[test]
    fn test_workout_kind_serde_is_lenient() {
        let kind: WorkoutKind = serde_json::from_str("\"swim\"").unwrap();
        assert_eq!(kind, WorkoutKind::Other);
        assert_eq!(serde_json::to_string(&WorkoutKind::LongRun).unwrap(), "\"long_run\"");
    }

    #[test]
    fn test_intensity_null_label() {
        assert_eq!(Intensity::parse_label("null"), None);
        assert_eq!(Intensity::parse_label(""), None);
        assert_eq!(Intensity::parse_label("Hard"), Some(Intensity::Hard));
    }

    #[test]
    fn test_week_contains_is_inclusive() {
        let week = Week {
            id: 1,
            week_number: 1,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 11).unwrap(),
            target_km: dec!(40),
            target_elevation_m: dec!(500),
            notes: None,
            phase: None,
        };
        assert!(week.contains(week.start_date));
        assert!(week.contains(week.end_date));
        assert!(!week.contains(NaiveDate::from_ymd_opt(2026, 1, 12).unwrap()));
    }

    #[test]
    fn test_lifestyle_validation() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut entry = LifestyleEntry::new(date);
        entry.energy_level = Some(7);
        entry.sleep_hours = Some(dec!(7.5));
        assert!(entry.validate().is_ok());

        entry.stress_level = Some(11);
        assert!(entry.validate().unwrap_err().contains("stress_level"));

        let mut entry = LifestyleEntry::new(date);
        entry.weight_kg = Some(dec!(0));
        assert!(entry.validate().is_err());
    }
}
