//! Activity and training-plan importers.

use std::path::Path;

use crate::error::ImportError;
use crate::models::Activity;

pub mod csv;
pub mod json;
pub mod plan;

pub use plan::{ImportedPlan, PlanImporter};

/// Trait for importing activities from different export formats
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Import activities from the file
    fn import_file(&self, file_path: &Path) -> Result<Vec<Activity>, ImportError>;

    /// Get the format name for this importer
    fn get_format_name(&self) -> &'static str;
}

/// Manager for coordinating different import formats
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![
            Box::new(json::ServiceJsonImporter::new()),
            Box::new(csv::CsvImporter::new()),
        ];

        Self { importers }
    }

    /// Import a single file, detecting the format from its extension
    pub fn import_file(&self, file_path: &Path) -> Result<Vec<Activity>, ImportError> {
        for importer in &self.importers {
            if importer.can_import(file_path) {
                tracing::info!(
                    file = %file_path.display(),
                    format = importer.get_format_name(),
                    "Importing activities"
                );
                let activities = importer.import_file(file_path)?;
                tracing::info!(count = activities.len(), "Activities imported");
                return Ok(activities);
            }
        }

        Err(ImportError::UnsupportedFormat {
            format: extension_of(file_path).unwrap_or_else(|| "unknown".to_string()),
        })
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercased file extension, if any
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

pub(crate) fn read_to_string(path: &Path) -> Result<String, ImportError> {
    std::fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_unsupported_extension() {
        let manager = ImportManager::new();
        let err = manager.import_file(&PathBuf::from("ride.fit")).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat { format } if format == "fit"));
    }

    #[test]
    fn test_extension_detection() {
        assert_eq!(extension_of(Path::new("a/b/Activities.JSON")), Some("json".to_string()));
        assert_eq!(extension_of(Path::new("noext")), None);
    }
}
