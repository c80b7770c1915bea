//! Terminal tables for the week, plan and baseline views.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use tabled::{settings::Style, Table, Tabled};

use crate::baseline::{BaselineTrend, TrendAssessment};
use crate::calendar::{day_name, format_day_month, format_range};
use crate::progress::{DayStatus, WeekProgress};

#[derive(Tabled)]
struct DayRow {
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Planned")]
    planned: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Logged")]
    logged: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct WeekRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Week")]
    number: u32,
    #[tabled(rename = "Dates")]
    dates: String,
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Target km")]
    target: String,
    #[tabled(rename = "Logged km")]
    logged: String,
    #[tabled(rename = "Done")]
    completion: String,
}

#[derive(Tabled)]
struct BaselineRow {
    #[tabled(rename = "Date")]
    date: NaiveDate,
    #[tabled(rename = "Avg HR")]
    average_heartrate: String,
    #[tabled(rename = "Change")]
    delta: String,
    #[tabled(rename = "Trend")]
    assessment: String,
}

pub fn status_symbol(status: DayStatus) -> &'static str {
    match status {
        DayStatus::Completed => "✓",
        DayStatus::Partial => "~",
        DayStatus::Missed => "✗",
        DayStatus::Pending => "·",
    }
}

/// Kilometres with one decimal place
pub fn format_km(km: Decimal) -> String {
    format!(
        "{:.1}",
        km.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Whole percentage, e.g. `30%`
pub fn format_percentage(value: Decimal) -> String {
    format!("{}%", value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
}

/// `h:mm` from seconds
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 3600, (seconds % 3600) / 60)
}

/// Signed heart-rate change, e.g. `-10` or `+3.5`
pub fn format_delta(delta: Decimal) -> String {
    if delta > Decimal::ZERO {
        format!("+{}", delta.normalize())
    } else {
        delta.normalize().to_string()
    }
}

/// Day-by-day table of one week
pub fn week_table(progress: &WeekProgress) -> String {
    let rows = progress.days.iter().map(|day| DayRow {
        day: format!("{} {}", day_name(day.date), format_day_month(day.date)),
        planned: day
            .planned
            .as_ref()
            .map(|w| format!("{} {}", w.kind.symbol(), w.title))
            .unwrap_or_else(|| "-".to_string()),
        target: day
            .planned
            .as_ref()
            .and_then(|w| w.target_km)
            .map(|km| format!("{} km", format_km(km)))
            .unwrap_or_default(),
        logged: if day.activities.is_empty() {
            String::new()
        } else {
            format!("{} km", format_km(day.distance_km))
        },
        status: format!("{} {}", status_symbol(day.status), day.status),
    });

    Table::new(rows).with(Style::rounded()).to_string()
}

/// One line per week of the plan; the week containing `today` is marked
pub fn weeks_table(weeks: &[WeekProgress], today: NaiveDate) -> String {
    let rows = weeks.iter().map(|progress| WeekRow {
        marker: if progress.week.contains(today) { "▶" } else { "" },
        number: progress.week.week_number,
        dates: format_range(&progress.week.range()),
        phase: progress.week.phase.clone().unwrap_or_default(),
        target: format_km(progress.week.target_km),
        logged: format_km(progress.total_distance_km),
        completion: if progress.has_distance_target {
            format_percentage(progress.completion_percentage)
        } else {
            "-".to_string()
        },
    });

    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn baseline_table(trend: &BaselineTrend) -> String {
    let rows = trend.points.iter().map(|point| BaselineRow {
        date: point.date,
        average_heartrate: point
            .average_heartrate
            .map(|hr| hr.normalize().to_string())
            .unwrap_or_else(|| "-".to_string()),
        delta: point.delta_bpm.map(format_delta).unwrap_or_default(),
        assessment: point
            .assessment
            .map(|a| assessment_label(a).to_string())
            .unwrap_or_default(),
    });

    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn assessment_label(assessment: TrendAssessment) -> &'static str {
    match assessment {
        TrendAssessment::Favorable => "improving",
        TrendAssessment::Neutral => "steady",
        TrendAssessment::Unfavorable => "declining",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::BaselineTrendTracker;
    use crate::models::{Activity, PlannedWorkout, Week, WorkoutKind};
    use crate::progress::ProgressAggregator;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn sample_progress() -> WeekProgress {
        let week = Week {
            id: 1,
            week_number: 1,
            start_date: d(5),
            end_date: d(11),
            target_km: dec!(40),
            target_elevation_m: Decimal::ZERO,
            notes: None,
            phase: Some("base".to_string()),
        };
        let planned = PlannedWorkout {
            id: 1,
            week_id: 1,
            date: d(6),
            kind: WorkoutKind::Run,
            target_km: Some(dec!(10)),
            target_duration_minutes: None,
            intensity: None,
            is_key_workout: false,
            title: "Easy run".to_string(),
            description: String::new(),
        };
        let activity = Activity {
            id: 7,
            date: d(6),
            kind: "Run".to_string(),
            name: "Morning run".to_string(),
            distance_km: dec!(12),
            moving_time_s: 3900,
            elevation_gain_m: Decimal::ZERO,
            average_heartrate: None,
            max_heartrate: None,
        };
        ProgressAggregator::new().compute_week_progress(&week, &[planned], &[activity], d(7))
    }

    #[test]
    fn test_formatting_helpers() {
        assert_eq!(format_km(dec!(12.345)), "12.3");
        assert_eq!(format_km(dec!(0.05)), "0.1");
        assert_eq!(format_percentage(dec!(30)), "30%");
        assert_eq!(format_percentage(dec!(33.5)), "34%");
        assert_eq!(format_duration(3900), "1:05");
        assert_eq!(format_delta(dec!(-10.0)), "-10");
        assert_eq!(format_delta(dec!(3.5)), "+3.5");
    }

    #[test]
    fn test_week_table_lists_every_day() {
        let table = week_table(&sample_progress());

        assert!(table.contains("Tue 6.1"));
        assert!(table.contains("Easy run"));
        assert!(table.contains("12.0 km"));
        assert!(table.contains("✓ completed"));
        assert!(table.contains("✗ missed"));
        assert!(table.contains("Sun 11.1"));
    }

    #[test]
    fn test_weeks_table_marks_current_week() {
        let table = weeks_table(&[sample_progress()], d(8));

        assert!(table.contains("▶"));
        assert!(table.contains("5.1 - 11.1"));
        assert!(table.contains("30%"));
        assert!(table.contains("base"));
    }

    #[test]
    fn test_baseline_table() {
        let baseline = |id: i64, day: u32, hr: Decimal| Activity {
            id,
            date: d(day),
            kind: "Run".to_string(),
            name: "Baseline".to_string(),
            distance_km: dec!(5),
            moving_time_s: 1800,
            elevation_gain_m: Decimal::ZERO,
            average_heartrate: Some(hr),
            max_heartrate: None,
        };
        let tests = [baseline(1, 6, dec!(160)), baseline(2, 20, dec!(150))];
        let refs: Vec<&Activity> = tests.iter().collect();
        let table = baseline_table(&BaselineTrendTracker::compute_trend(&refs));

        assert!(table.contains("2026-01-06"));
        assert!(table.contains("-10"));
        assert!(table.contains("improving"));
    }
}
