use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Week;

/// Outcome of locating the week that contains a date
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeekLookup {
    Found(usize),
    NotFound,
    /// More than one week contains the date (the sequence overlaps)
    Ambiguous(Vec<usize>),
}

/// Locate the week containing `today`, distinguishing a miss from an overlap.
pub fn lookup_week(weeks: &[Week], today: NaiveDate) -> WeekLookup {
    let matches: Vec<usize> = weeks
        .iter()
        .enumerate()
        .filter(|(_, week)| week.contains(today))
        .map(|(idx, _)| idx)
        .collect();

    match matches.as_slice() {
        [] => WeekLookup::NotFound,
        [idx] => WeekLookup::Found(*idx),
        _ => WeekLookup::Ambiguous(matches),
    }
}

/// Index of the unique week with `start_date <= today <= end_date`.
///
/// Returns `None` when no week matches or when several do.
pub fn find_week_index(weeks: &[Week], today: NaiveDate) -> Option<usize> {
    match lookup_week(weeks, today) {
        WeekLookup::Found(idx) => Some(idx),
        WeekLookup::NotFound => {
            tracing::debug!(%today, weeks = weeks.len(), "No week contains date");
            None
        }
        WeekLookup::Ambiguous(indices) => {
            tracing::warn!(%today, ?indices, "Date falls in overlapping weeks");
            None
        }
    }
}

/// Caller-held navigation state over an ordered week sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekCursor {
    index: usize,
    len: usize,
}

impl WeekCursor {
    /// Cursor for a freshly loaded sequence: the current week, or the first
    /// week when today is not covered by the plan.
    pub fn initial(weeks: &[Week], today: NaiveDate) -> Self {
        Self {
            index: find_week_index(weeks, today).unwrap_or(0),
            len: weeks.len(),
        }
    }

    /// Cursor at an explicit position, clamped to the sequence
    pub fn at(index: usize, len: usize) -> Self {
        Self {
            index: index.min(len.saturating_sub(1)),
            len,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.len
    }

    pub fn previous(&mut self) {
        if self.has_previous() {
            self.index -= 1;
        }
    }

    pub fn next(&mut self) {
        if self.has_next() {
            self.index += 1;
        }
    }

    /// Move by a signed number of weeks, stopping at either end
    pub fn step(&mut self, offset: i64) {
        if self.len == 0 {
            return;
        }
        let last = i64::try_from(self.len - 1).unwrap_or(i64::MAX);
        let current = i64::try_from(self.index).unwrap_or(i64::MAX);
        let target = current.saturating_add(offset).clamp(0, last);
        self.index = usize::try_from(target).unwrap_or(self.index);
    }

    /// Jump to the week containing `today`.
    ///
    /// Unlike [`WeekCursor::initial`], a miss leaves the position unchanged.
    /// Returns whether the cursor moved to a matching week.
    pub fn jump_to_current(&mut self, weeks: &[Week], today: NaiveDate) -> bool {
        self.len = weeks.len();
        match find_week_index(weeks, today) {
            Some(idx) => {
                self.index = idx;
                true
            }
            None => false,
        }
    }

    /// Whether the selected week contains `today`
    pub fn is_current(&self, weeks: &[Week], today: NaiveDate) -> bool {
        self.current(weeks).is_some_and(|week| week.contains(today))
    }

    pub fn current<'a>(&self, weeks: &'a [Week]) -> Option<&'a Week> {
        weeks.get(self.index)
    }
}

/// Structural problem in a week sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceIssue {
    InvertedRange { week_number: u32 },
    OutOfOrder { week_number: u32, previous: u32 },
    Overlap { week_number: u32, previous: u32 },
    Gap { week_number: u32, previous: u32, missing_days: i64 },
}

impl std::fmt::Display for SequenceIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequenceIssue::InvertedRange { week_number } => {
                write!(f, "week {} ends before it starts", week_number)
            }
            SequenceIssue::OutOfOrder { week_number, previous } => {
                write!(f, "week {} follows week {}", week_number, previous)
            }
            SequenceIssue::Overlap { week_number, previous } => {
                write!(f, "week {} overlaps week {}", week_number, previous)
            }
            SequenceIssue::Gap { week_number, previous, missing_days } => write!(
                f,
                "{} day(s) uncovered between week {} and week {}",
                missing_days, previous, week_number
            ),
        }
    }
}

/// Check that weeks are well-formed, ordered, contiguous and non-overlapping.
pub fn validate_sequence(weeks: &[Week]) -> Vec<SequenceIssue> {
    let mut issues = Vec::new();

    for week in weeks {
        if week.start_date > week.end_date {
            issues.push(SequenceIssue::InvertedRange {
                week_number: week.week_number,
            });
        }
    }

    for pair in weeks.windows(2) {
        let (prev, week) = (&pair[0], &pair[1]);
        if week.week_number <= prev.week_number {
            issues.push(SequenceIssue::OutOfOrder {
                week_number: week.week_number,
                previous: prev.week_number,
            });
        }

        let gap = (week.start_date - prev.end_date).num_days() - 1;
        if gap < 0 {
            issues.push(SequenceIssue::Overlap {
                week_number: week.week_number,
                previous: prev.week_number,
            });
        } else if gap > 0 {
            issues.push(SequenceIssue::Gap {
                week_number: week.week_number,
                previous: prev.week_number,
                missing_days: gap,
            });
        }
    }

    issues
}
