use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

use super::{extension_of, read_to_string, ImportFormat};
use crate::calendar::date_key;
use crate::error::ImportError;
use crate::models::Activity;

/// Activity summary as returned by the fitness service's activity list API
#[derive(Debug, Clone, Deserialize)]
struct ServiceActivity {
    id: i64,
    name: String,
    #[serde(default)]
    sport_type: Option<String>,
    #[serde(default, rename = "type")]
    activity_type: Option<String>,
    #[serde(default)]
    start_date_local: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    /// Meters
    distance: Decimal,
    /// Seconds
    moving_time: u32,
    #[serde(default)]
    total_elevation_gain: Decimal,
    #[serde(default)]
    average_heartrate: Option<Decimal>,
    #[serde(default)]
    max_heartrate: Option<Decimal>,
}

impl ServiceActivity {
    fn into_activity(self) -> Result<Activity, ImportError> {
        // Local start date reflects the athlete's calendar day
        let start = self
            .start_date_local
            .as_deref()
            .or(self.start_date.as_deref())
            .ok_or_else(|| ImportError::ParseError {
                format: "json".to_string(),
                reason: format!("activity {} has no start date", self.id),
            })?;
        let date = date_key(start).ok_or_else(|| ImportError::ParseError {
            format: "json".to_string(),
            reason: format!("activity {} has an invalid start date: {}", self.id, start),
        })?;

        Ok(Activity {
            id: self.id,
            date,
            kind: self
                .sport_type
                .or(self.activity_type)
                .unwrap_or_else(|| "Workout".to_string()),
            name: self.name,
            distance_km: (self.distance / Decimal::ONE_THOUSAND).normalize(),
            moving_time_s: self.moving_time,
            elevation_gain_m: self.total_elevation_gain,
            average_heartrate: self.average_heartrate,
            max_heartrate: self.max_heartrate,
        })
    }
}

/// Importer for JSON activity exports from the fitness service
pub struct ServiceJsonImporter;

impl ServiceJsonImporter {
    pub fn new() -> Self {
        Self
    }

    /// Parse a JSON array of service activities
    pub fn parse(&self, content: &str) -> Result<Vec<Activity>, ImportError> {
        let raw: Vec<ServiceActivity> = serde_json::from_str(content)?;
        raw.into_iter().map(ServiceActivity::into_activity).collect()
    }
}

impl Default for ServiceJsonImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for ServiceJsonImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        extension_of(file_path).as_deref() == Some("json")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<Activity>, ImportError> {
        let content = read_to_string(file_path)?;
        self.parse(&content)
    }

    fn get_format_name(&self) -> &'static str {
        "service JSON"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"[
        {
            "id": 12001,
            "name": "Baseline test",
            "sport_type": "Run",
            "start_date": "2026-01-06T22:30:00Z",
            "start_date_local": "2026-01-06T23:30:00Z",
            "distance": 5012.3,
            "moving_time": 1745,
            "total_elevation_gain": 21.4,
            "average_heartrate": 151.2,
            "max_heartrate": 166.0
        },
        {
            "id": 12002,
            "name": "Walk",
            "type": "Walk",
            "start_date": "2026-01-07T07:00:00Z",
            "distance": 3000,
            "moving_time": 2400
        }
    ]"#;

    #[test]
    fn test_parse_service_activities() {
        let activities = ServiceJsonImporter::new().parse(SAMPLE).unwrap();

        assert_eq!(activities.len(), 2);
        let baseline = &activities[0];
        assert_eq!(baseline.date, NaiveDate::from_ymd_opt(2026, 1, 6).unwrap());
        assert_eq!(baseline.distance_km, dec!(5.0123));
        assert_eq!(baseline.kind, "Run");
        assert_eq!(baseline.average_heartrate, Some(dec!(151.2)));

        let walk = &activities[1];
        assert_eq!(walk.kind, "Walk");
        assert_eq!(walk.distance_km, dec!(3));
        assert_eq!(walk.average_heartrate, None);
        assert_eq!(walk.elevation_gain_m, Decimal::ZERO);
    }

    #[test]
    fn test_missing_start_date_is_rejected() {
        let content = r#"[{"id": 1, "name": "x", "distance": 1, "moving_time": 1}]"#;
        let err = ServiceJsonImporter::new().parse(content).unwrap_err();
        assert!(matches!(err, ImportError::ParseError { .. }));
    }
}
