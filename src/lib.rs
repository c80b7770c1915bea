// Library interface for racetracker
// The CLI and the integration tests both build on these modules

pub mod baseline;
pub mod calendar;
pub mod config;
pub mod error;
pub mod import;
pub mod logging;
pub mod models;
pub mod progress;
pub mod report;
pub mod store;
pub mod tracker;
pub mod week_resolver;

// Re-export commonly used types for convenience
pub use models::*;
pub use baseline::{BaselineMatcher, BaselineTrend, BaselineTrendTracker, TrendAssessment};
pub use calendar::DateRange;
pub use config::AppConfig;
pub use error::{ImportError, Result, StoreError, TrackerError};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use progress::{CompletionRule, DayMatch, DayStatus, ProgressAggregator, WeekProgress};
pub use store::{open_store, DocumentStore, SqliteStore, TrainingStore};
pub use tracker::{Tracker, WeekSelection};
pub use week_resolver::{find_week_index, WeekCursor};
