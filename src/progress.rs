use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::models::{Activity, PlannedWorkout, Week};

/// Reconciliation status of a single day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    /// Nothing logged yet, day is today or later
    Pending,
    /// Logged activity meets the plan
    Completed,
    /// Logged distance falls short of the planned target
    Partial,
    /// Day has passed with nothing logged
    Missed,
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DayStatus::Pending => "pending",
            DayStatus::Completed => "completed",
            DayStatus::Partial => "partial",
            DayStatus::Missed => "missed",
        };
        f.write_str(label)
    }
}

/// Rule deciding when a day with logged activities counts as completed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionRule {
    /// Logged distance must reach the planned target distance, if one is set
    #[default]
    MeetsTarget,
    /// Any logged activity completes the day
    AnyActivity,
}

impl FromStr for CompletionRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "meets_target" => Ok(CompletionRule::MeetsTarget),
            "any_activity" => Ok(CompletionRule::AnyActivity),
            _ => Err(format!("Invalid completion rule: {}", s)),
        }
    }
}

/// One calendar day of a week matched against the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayMatch {
    pub date: NaiveDate,

    /// Workout planned for this date, if any
    pub planned: Option<PlannedWorkout>,

    /// Activities logged on this date, in input order
    pub activities: Vec<Activity>,

    pub status: DayStatus,

    /// Sum of the distance of this day's activities
    pub distance_km: Decimal,
}

/// Week-level view of planned versus logged training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekProgress {
    pub week: Week,

    /// One entry per date of the week, in date order
    pub days: Vec<DayMatch>,

    pub total_distance_km: Decimal,

    pub total_moving_time_s: u64,

    pub total_elevation_m: Decimal,

    pub activity_count: usize,

    /// Logged distance against the week target, capped at 100. Zero when the
    /// week has no distance target.
    pub completion_percentage: Decimal,

    /// Logged elevation against the elevation target, same rule as distance
    pub elevation_percentage: Decimal,

    /// False when the week target distance is zero or negative
    pub has_distance_target: bool,

    pub key_workouts_planned: usize,

    pub key_workouts_completed: usize,
}

impl WeekProgress {
    pub fn day(&self, date: NaiveDate) -> Option<&DayMatch> {
        self.days.iter().find(|day| day.date == date)
    }

    pub fn count_with_status(&self, status: DayStatus) -> usize {
        self.days.iter().filter(|day| day.status == status).count()
    }
}

/// Reconciles a week's plan with logged activities
pub struct ProgressAggregator {
    rule: CompletionRule,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        ProgressAggregator {
            rule: CompletionRule::default(),
        }
    }

    pub fn with_rule(rule: CompletionRule) -> Self {
        ProgressAggregator { rule }
    }

    /// Compute the progress view of `week` as of `today`.
    ///
    /// Activities dated outside the week are ignored. The result depends only
    /// on the arguments.
    pub fn compute_week_progress(
        &self,
        week: &Week,
        planned: &[PlannedWorkout],
        activities: &[Activity],
        today: NaiveDate,
    ) -> WeekProgress {
        let range = week.range();
        let by_date = Self::partition_by_date(activities, |date| range.contains(date));

        let mut days = Vec::with_capacity(range.len_days().max(0) as usize);
        let mut total_distance_km = Decimal::ZERO;
        let mut total_moving_time_s = 0u64;
        let mut total_elevation_m = Decimal::ZERO;
        let mut activity_count = 0usize;

        for date in range.days() {
            let planned_today = Self::planned_for(planned, date);
            let day_activities: Vec<Activity> = by_date
                .get(&date)
                .map(|list| list.iter().map(|a| (*a).clone()).collect())
                .unwrap_or_default();

            let distance_km: Decimal = day_activities.iter().map(|a| a.distance_km).sum();
            total_distance_km += distance_km;
            total_moving_time_s += day_activities
                .iter()
                .map(|a| u64::from(a.moving_time_s))
                .sum::<u64>();
            total_elevation_m += day_activities
                .iter()
                .map(|a| a.elevation_gain_m)
                .sum::<Decimal>();
            activity_count += day_activities.len();

            let status = self.day_status(
                date,
                today,
                planned_today,
                !day_activities.is_empty(),
                distance_km,
            );

            days.push(DayMatch {
                date,
                planned: planned_today.cloned(),
                activities: day_activities,
                status,
                distance_km,
            });
        }

        let key_workouts_planned = days
            .iter()
            .filter(|d| d.planned.as_ref().is_some_and(|w| w.is_key_workout))
            .count();
        let key_workouts_completed = days
            .iter()
            .filter(|d| d.planned.as_ref().is_some_and(|w| w.is_key_workout))
            .filter(|d| d.status == DayStatus::Completed)
            .count();

        let progress = WeekProgress {
            week: week.clone(),
            days,
            total_distance_km,
            total_moving_time_s,
            total_elevation_m,
            activity_count,
            completion_percentage: capped_percentage(total_distance_km, week.target_km),
            elevation_percentage: capped_percentage(total_elevation_m, week.target_elevation_m),
            has_distance_target: week.target_km > Decimal::ZERO,
            key_workouts_planned,
            key_workouts_completed,
        };

        tracing::debug!(
            week = week.week_number,
            activities = progress.activity_count,
            distance_km = %progress.total_distance_km,
            completion = %progress.completion_percentage,
            "Computed week progress"
        );

        progress
    }

    /// Status of one day, evaluated in precedence order
    pub fn day_status(
        &self,
        date: NaiveDate,
        today: NaiveDate,
        planned: Option<&PlannedWorkout>,
        has_activities: bool,
        distance_km: Decimal,
    ) -> DayStatus {
        if !has_activities {
            return if date < today {
                DayStatus::Missed
            } else {
                DayStatus::Pending
            };
        }

        let target = match self.rule {
            CompletionRule::AnyActivity => None,
            CompletionRule::MeetsTarget => planned.and_then(|w| w.target_km),
        };

        match target {
            Some(target_km) if distance_km < target_km => DayStatus::Partial,
            _ => DayStatus::Completed,
        }
    }

    /// Group activities by calendar date, keeping input order within a day
    fn partition_by_date<F>(activities: &[Activity], keep: F) -> BTreeMap<NaiveDate, Vec<&Activity>>
    where
        F: Fn(NaiveDate) -> bool,
    {
        let mut by_date: BTreeMap<NaiveDate, Vec<&Activity>> = BTreeMap::new();
        for activity in activities.iter().filter(|a| keep(a.date)) {
            by_date.entry(activity.date).or_default().push(activity);
        }
        by_date
    }

    fn planned_for(planned: &[PlannedWorkout], date: NaiveDate) -> Option<&PlannedWorkout> {
        let mut scheduled = planned.iter().filter(|w| w.date == date);
        let first = scheduled.next();
        if first.is_some() && scheduled.next().is_some() {
            tracing::warn!(%date, "Several workouts planned on one date, using the first");
        }
        first
    }
}

impl Default for ProgressAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// The first workout planned for `today`, if any
pub fn todays_workout(planned: &[PlannedWorkout], today: NaiveDate) -> Option<&PlannedWorkout> {
    planned.iter().find(|w| w.date == today)
}

/// `min(100, value / target * 100)`, or zero when there is no positive target
fn capped_percentage(value: Decimal, target: Decimal) -> Decimal {
    if target <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    value
        .checked_div(target)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map_or(Decimal::ONE_HUNDRED, |pct| pct.min(Decimal::ONE_HUNDRED))
}
