use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use super::{extension_of, ImportFormat};
use crate::calendar::date_key;
use crate::error::ImportError;
use crate::models::Activity;

/// CSV importer with flexible column mapping
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Common column name variations
        Self::add_mapping(&mut column_mapping, "id", &["id", "activity_id", "activity id"]);
        Self::add_mapping(
            &mut column_mapping,
            "date",
            &["date", "start_date", "start_date_local", "activity date"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "kind",
            &["kind", "type", "sport_type", "activity type"],
        );
        Self::add_mapping(&mut column_mapping, "name", &["name", "activity name", "title"]);
        Self::add_mapping(&mut column_mapping, "distance_km", &["distance_km", "distance", "km"]);
        Self::add_mapping(
            &mut column_mapping,
            "moving_time_s",
            &["moving_time_s", "moving_time", "moving time"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "elevation_gain_m",
            &["elevation_gain_m", "elevation_gain", "elevation gain", "total_elevation_gain"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "average_heartrate",
            &["average_heartrate", "avg_hr", "average heart rate"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "max_heartrate",
            &["max_heartrate", "max_hr", "max heart rate"],
        );

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    /// Map header positions to standard column names
    fn resolve_headers(&self, headers: &StringRecord) -> HashMap<String, usize> {
        headers
            .iter()
            .enumerate()
            .filter_map(|(idx, header)| {
                self.column_mapping
                    .get(&header.trim().to_lowercase())
                    .map(|standard| (standard.clone(), idx))
            })
            .collect()
    }

    /// Parse activities from any CSV reader
    pub fn parse<R: Read>(&self, reader: R) -> Result<Vec<Activity>, ImportError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns = self.resolve_headers(csv_reader.headers()?);
        for required in ["id", "date", "distance_km", "moving_time_s"] {
            if !columns.contains_key(required) {
                return Err(ImportError::InvalidStructure {
                    reason: format!("missing column '{}'", required),
                });
            }
        }

        let mut activities = Vec::new();
        for (line, record) in csv_reader.records().enumerate() {
            let record = record?;
            let row = Row {
                record: &record,
                columns: &columns,
                line: line + 2,
            };

            let raw_date = row.required("date")?;
            activities.push(Activity {
                id: row.parse_required("id")?,
                date: date_key(raw_date).ok_or_else(|| row.error("date", raw_date))?,
                kind: row.optional("kind").unwrap_or("Workout").to_string(),
                name: row.optional("name").unwrap_or_default().to_string(),
                distance_km: row.parse_required("distance_km")?,
                moving_time_s: row.parse_required("moving_time_s")?,
                elevation_gain_m: row.parse_optional("elevation_gain_m")?.unwrap_or(Decimal::ZERO),
                average_heartrate: row.parse_optional("average_heartrate")?,
                max_heartrate: row.parse_optional("max_heartrate")?,
            });
        }

        Ok(activities)
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        extension_of(file_path).as_deref() == Some("csv")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<Activity>, ImportError> {
        let file = std::fs::File::open(file_path).map_err(|source| ImportError::Read {
            path: file_path.to_path_buf(),
            source,
        })?;
        self.parse(file)
    }

    fn get_format_name(&self) -> &'static str {
        "CSV"
    }
}

/// One CSV record with resolved column positions
struct Row<'a> {
    record: &'a StringRecord,
    columns: &'a HashMap<String, usize>,
    line: usize,
}

impl<'a> Row<'a> {
    fn optional(&self, column: &str) -> Option<&'a str> {
        self.columns
            .get(column)
            .and_then(|idx| self.record.get(*idx))
            .filter(|value| !value.is_empty())
    }

    fn required(&self, column: &str) -> Result<&'a str, ImportError> {
        self.optional(column).ok_or_else(|| ImportError::ParseError {
            format: "csv".to_string(),
            reason: format!("line {}: '{}' is empty", self.line, column),
        })
    }

    fn parse_required<T: std::str::FromStr>(&self, column: &str) -> Result<T, ImportError> {
        let raw = self.required(column)?;
        raw.parse().map_err(|_| self.error(column, raw))
    }

    fn parse_optional<T: std::str::FromStr>(&self, column: &str) -> Result<Option<T>, ImportError> {
        self.optional(column)
            .map(|raw| raw.parse().map_err(|_| self.error(column, raw)))
            .transpose()
    }

    fn error(&self, column: &str, raw: &str) -> ImportError {
        ImportError::ParseError {
            format: "csv".to_string(),
            reason: format!("line {}: invalid {} '{}'", self.line, column, raw),
        }
    }
}
