use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Activity;

/// Reading of a heart-rate change between baseline tests.
///
/// A lower heart rate at the same fixed effort means improved fitness, so a
/// negative delta is favorable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendAssessment {
    Favorable,
    Neutral,
    Unfavorable,
}

impl TrendAssessment {
    pub fn from_delta(delta_bpm: Decimal) -> Self {
        if delta_bpm < Decimal::ZERO {
            TrendAssessment::Favorable
        } else if delta_bpm > Decimal::ZERO {
            TrendAssessment::Unfavorable
        } else {
            TrendAssessment::Neutral
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TrendAssessment::Favorable => "Heart rate down at the same effort",
            TrendAssessment::Neutral => "No change in heart rate",
            TrendAssessment::Unfavorable => "Heart rate up at the same effort",
        }
    }
}

/// One baseline test in the trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineTrendPoint {
    pub activity_id: i64,
    pub date: NaiveDate,
    pub average_heartrate: Option<Decimal>,

    /// Change from the immediately preceding test; `None` for the first point
    /// or when either reading is missing
    pub delta_bpm: Option<Decimal>,

    pub assessment: Option<TrendAssessment>,
}

/// Heart-rate trend across all baseline tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineTrend {
    pub first: Option<BaselineTrendPoint>,
    pub last: Option<BaselineTrendPoint>,

    /// `last - first` average heart rate; `None` when unavailable
    pub delta_bpm: Option<Decimal>,

    pub assessment: Option<TrendAssessment>,

    pub points: Vec<BaselineTrendPoint>,
}

impl BaselineTrend {
    pub fn is_available(&self) -> bool {
        self.delta_bpm.is_some()
    }
}

/// Identifies baseline tests among logged activities by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineMatcher {
    keywords: Vec<String>,
}

impl BaselineMatcher {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn is_baseline(&self, activity: &Activity) -> bool {
        let name = activity.name.to_lowercase();
        self.keywords.iter().any(|keyword| name.contains(keyword.as_str()))
    }

    /// Baseline tests among `activities`, in input order
    pub fn select<'a>(&self, activities: &'a [Activity]) -> Vec<&'a Activity> {
        activities.iter().filter(|a| self.is_baseline(a)).collect()
    }
}

impl Default for BaselineMatcher {
    fn default() -> Self {
        Self::new(["baseline"])
    }
}

/// Computes heart-rate trends over baseline tests
pub struct BaselineTrendTracker;

impl BaselineTrendTracker {
    /// Compute the trend over baseline tests.
    ///
    /// Activities are ordered by date (stable, so same-day tests keep their
    /// input order). Missing heart-rate readings only remove the comparisons
    /// that need them.
    pub fn compute_trend(activities: &[&Activity]) -> BaselineTrend {
        let mut ordered: Vec<&Activity> = activities.to_vec();
        ordered.sort_by_key(|a| a.date);

        let mut points: Vec<BaselineTrendPoint> = Vec::with_capacity(ordered.len());
        let mut previous_hr: Option<Option<Decimal>> = None;

        for activity in ordered {
            let delta_bpm = match previous_hr {
                Some(prev) => heartrate_delta(prev, activity.average_heartrate),
                None => None,
            };

            points.push(BaselineTrendPoint {
                activity_id: activity.id,
                date: activity.date,
                average_heartrate: activity.average_heartrate,
                delta_bpm,
                assessment: delta_bpm.map(TrendAssessment::from_delta),
            });
            previous_hr = Some(activity.average_heartrate);
        }

        let first = points.first().cloned();
        let last = points.last().cloned();
        let delta_bpm = match (&first, &last) {
            (Some(first), Some(last)) if points.len() > 1 => {
                heartrate_delta(first.average_heartrate, last.average_heartrate)
            }
            _ => None,
        };

        if delta_bpm.is_none() && points.len() > 1 {
            tracing::debug!(tests = points.len(), "Baseline trend unavailable, heart rate missing");
        }

        BaselineTrend {
            first,
            last,
            delta_bpm,
            assessment: delta_bpm.map(TrendAssessment::from_delta),
            points,
        }
    }
}

fn heartrate_delta(earlier: Option<Decimal>, later: Option<Decimal>) -> Option<Decimal> {
    Some(later? - earlier?)
}
