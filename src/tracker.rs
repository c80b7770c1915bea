//! Application service tying a training store to the reconciliation core.

use chrono::{Days, NaiveDate};
use std::path::Path;

use crate::baseline::{BaselineMatcher, BaselineTrend, BaselineTrendTracker};
use crate::calendar::{days_until, DateRange};
use crate::config::{AppConfig, RaceSettings};
use crate::error::{Result, StoreError, TrackerError};
use crate::import::{ImportManager, ImportedPlan, PlanImporter};
use crate::models::{LifestyleEntry, PlannedWorkout, Week};
use crate::progress::{todays_workout, ProgressAggregator, WeekProgress};
use crate::store::{collections, TrainingStore};
use crate::week_resolver::{find_week_index, WeekCursor};

/// How far back baseline tests are searched when the plan starts later
const BASELINE_LOOKBACK_DAYS: u64 = 365;

/// Which week of the plan to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeekSelection {
    /// Week containing today, or the first week
    #[default]
    Current,
    /// Week with this week number
    Number(u32),
    /// Current week moved by a signed number of weeks, clamped to the plan
    Offset(i64),
}

/// Home screen: race countdown, today's workout and this week's progress
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub race: RaceSettings,
    pub days_to_race: i64,
    pub todays_workout: Option<PlannedWorkout>,
    pub current_week: Option<WeekProgress>,
    pub lifestyle: Option<LifestyleEntry>,
}

/// One week of the plan with its navigation state
#[derive(Debug, Clone, PartialEq)]
pub struct WeekView {
    pub progress: WeekProgress,
    pub cursor: WeekCursor,
    pub is_current: bool,
}

/// Composes a store with the progress and baseline calculators
pub struct Tracker {
    store: Box<dyn TrainingStore>,
    aggregator: ProgressAggregator,
    matcher: BaselineMatcher,
    race: RaceSettings,
    user_id: String,
}

impl Tracker {
    pub fn new(store: Box<dyn TrainingStore>, config: &AppConfig) -> Self {
        Self {
            store,
            aggregator: ProgressAggregator::with_rule(config.progress.completion_rule),
            matcher: config.baseline.matcher(),
            race: config.race.clone(),
            user_id: config.user_id().to_string(),
        }
    }

    pub fn dashboard(&self, today: NaiveDate) -> Result<Dashboard> {
        let weeks = self.store.fetch_weeks()?;
        let current_week = match find_week_index(&weeks, today) {
            Some(idx) => Some(self.week_progress(&weeks[idx], today)?),
            None => None,
        };

        let todays = self
            .store
            .fetch_workouts_in_range(DateRange::new(today, today))?;

        let lifestyle = if self.user_id.is_empty() {
            None
        } else {
            self.store.fetch_lifestyle(&self.user_id, today)?
        };

        Ok(Dashboard {
            today,
            race: self.race.clone(),
            days_to_race: days_until(self.race.date, today),
            todays_workout: todays_workout(&todays, today).cloned(),
            current_week,
            lifestyle,
        })
    }

    /// Progress of the selected week; `None` when no plan is loaded
    pub fn week_view(&self, selection: WeekSelection, today: NaiveDate) -> Result<Option<WeekView>> {
        let weeks = self.store.fetch_weeks()?;
        if weeks.is_empty() {
            return Ok(None);
        }

        let cursor = match selection {
            WeekSelection::Current => WeekCursor::initial(&weeks, today),
            WeekSelection::Number(number) => {
                let idx = weeks
                    .iter()
                    .position(|w| w.week_number == number)
                    .ok_or_else(|| StoreError::NotFound {
                        collection: collections::WEEKS.to_string(),
                        id: number.to_string(),
                    })?;
                WeekCursor::at(idx, weeks.len())
            }
            WeekSelection::Offset(offset) => {
                let mut cursor = WeekCursor::initial(&weeks, today);
                cursor.step(offset);
                cursor
            }
        };

        let week = cursor.current(&weeks).ok_or_else(|| {
            TrackerError::Internal(format!("week cursor {} out of range", cursor.index()))
        })?;

        Ok(Some(WeekView {
            progress: self.week_progress(week, today)?,
            cursor,
            is_current: cursor.is_current(&weeks, today),
        }))
    }

    /// Progress of every week in the plan
    pub fn weeks_overview(&self, today: NaiveDate) -> Result<Vec<WeekProgress>> {
        let weeks = self.store.fetch_weeks()?;
        let (Some(first), Some(last)) = (weeks.first(), weeks.last()) else {
            return Ok(Vec::new());
        };

        let range = DateRange::new(first.start_date, last.end_date);
        let activities = self.store.fetch_activities(range)?;
        let planned = self.store.fetch_workouts_in_range(range)?;

        Ok(weeks
            .iter()
            .map(|week| {
                self.aggregator
                    .compute_week_progress(week, &planned, &activities, today)
            })
            .collect())
    }

    /// Heart-rate trend over baseline tests up to `today`
    pub fn baseline_trend(&self, today: NaiveDate) -> Result<BaselineTrend> {
        let weeks = self.store.fetch_weeks()?;
        let lookback = today
            .checked_sub_days(Days::new(BASELINE_LOOKBACK_DAYS))
            .unwrap_or(today);
        let start = weeks
            .first()
            .map_or(lookback, |week| week.start_date.min(lookback));

        let activities = self.store.fetch_activities(DateRange::new(start, today))?;
        let tests = self.matcher.select(&activities);
        tracing::debug!(candidates = activities.len(), tests = tests.len(), "Selected baseline tests");

        Ok(BaselineTrendTracker::compute_trend(&tests))
    }

    pub fn lifestyle(&self, date: NaiveDate) -> Result<Option<LifestyleEntry>> {
        Ok(self.store.fetch_lifestyle(&self.user_id, date)?)
    }

    /// Validate and store a lifestyle entry for the signed-in user
    pub fn log_lifestyle(&mut self, entry: &LifestyleEntry) -> Result<()> {
        entry.validate().map_err(TrackerError::Validation)?;
        self.store.upsert_lifestyle(&self.user_id, entry)?;
        tracing::info!(date = %entry.date, "Lifestyle entry saved");
        Ok(())
    }

    /// Import an activity export; returns the number of activities written
    pub fn import_activities(&mut self, path: &Path) -> Result<usize> {
        let activities = ImportManager::new().import_file(path)?;
        let written = self.store.upsert_activities(&activities)?;
        tracing::info!(file = %path.display(), written, "Activities stored");
        Ok(written)
    }

    /// Import a training plan, replacing weeks and workouts with the same ids
    pub fn import_plan(&mut self, path: &Path) -> Result<ImportedPlan> {
        let plan = PlanImporter::import_file(path)?;
        self.store.save_plan(&plan.weeks, &plan.workouts)?;
        tracing::info!(
            weeks = plan.weeks.len(),
            workouts = plan.workouts.len(),
            issues = plan.issues.len(),
            "Training plan stored"
        );
        Ok(plan)
    }

    fn week_progress(&self, week: &Week, today: NaiveDate) -> Result<WeekProgress> {
        let planned = self.store.fetch_workouts_for_week(week.id)?;
        let activities = self.store.fetch_activities(week.range())?;
        Ok(self
            .aggregator
            .compute_week_progress(week, &planned, &activities, today))
    }
}
