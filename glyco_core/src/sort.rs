//! Sort engine for filtered readings.
//!
//! Column headers cycle through three phases when requested repeatedly:
//! ascending, descending, then back to the default ordering.

use crate::{Error, Reading};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Sortable column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Date,
    Time,
    Context,
    Level,
    Label,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Time => "time",
            SortKey::Context => "context",
            SortKey::Level => "level",
            SortKey::Label => "label",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "time" => Ok(SortKey::Time),
            "context" => Ok(SortKey::Context),
            "level" => Ok(SortKey::Level),
            "label" => Ok(SortKey::Label),
            other => Err(Error::Other(format!("Unknown sort key: {}", other))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Active ordering of a view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    /// Newest date first
    fn default() -> Self {
        Self {
            key: SortKey::Date,
            direction: SortDirection::Descending,
        }
    }
}

impl SortState {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Apply a "sort by column" request.
    ///
    /// A new column starts ascending; the current column goes ascending ->
    /// descending -> default. The default column follows the same cycle.
    pub fn request_sort(&mut self, key: SortKey) {
        *self = if self.key != key {
            SortState::new(key, SortDirection::Ascending)
        } else {
            match self.direction {
                SortDirection::Ascending => SortState::new(key, SortDirection::Descending),
                SortDirection::Descending => SortState::default(),
            }
        };
        tracing::debug!("Sort is now {} {:?}", self.key, self.direction);
    }

    /// Compare two readings under this state. Ties stay `Equal` in both
    /// directions.
    pub fn compare(&self, a: &Reading, b: &Reading) -> Ordering {
        let ordering = compare_by_key(self.key, a, b);
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

fn compare_by_key(key: SortKey, a: &Reading, b: &Reading) -> Ordering {
    match key {
        SortKey::Level => a.level().total_cmp(&b.level()),
        SortKey::Date => compare_text(&a.date_string(), &b.date_string()),
        SortKey::Time => compare_text(&a.time_string(), &b.time_string()),
        SortKey::Context => compare_text(a.context().as_str(), b.context().as_str()),
        SortKey::Label => compare_text(a.label().as_str(), b.label().as_str()),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// A new, stably sorted ordering of `readings`
pub fn sort(readings: &[Reading], state: &SortState) -> Vec<Reading> {
    let mut sorted = readings.to_vec();
    sorted.sort_by(|a, b| state.compare(a, b));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::reading;

    fn sample() -> Vec<Reading> {
        vec![
            reading("2024-03-02", "08:15", "After Breakfast", 200.0),
            reading("2024-03-01", "07:00", "Fasting", 95.0),
            reading("2024-03-03", "22:00", "Bedtime", 65.0),
            reading("2024-03-01", "13:30", "random", 150.0),
        ]
    }

    fn levels(readings: &[Reading]) -> Vec<f64> {
        readings.iter().map(Reading::level).collect()
    }

    #[test]
    fn test_default_is_newest_date_first() {
        let sorted = sort(&sample(), &SortState::default());
        let dates: Vec<_> = sorted.iter().map(Reading::date_string).collect();
        assert_eq!(dates, vec!["2024-03-03", "2024-03-02", "2024-03-01", "2024-03-01"]);
        // Equal dates keep their input order
        assert_eq!(sorted[2].level(), 95.0);
        assert_eq!(sorted[3].level(), 150.0);
    }

    #[test]
    fn test_level_is_numeric() {
        let asc = sort(&sample(), &SortState::new(SortKey::Level, SortDirection::Ascending));
        assert_eq!(levels(&asc), vec![65.0, 95.0, 150.0, 200.0]);

        let desc = sort(&sample(), &SortState::new(SortKey::Level, SortDirection::Descending));
        let mut reversed = levels(&asc);
        reversed.reverse();
        assert_eq!(levels(&desc), reversed);
    }

    #[test]
    fn test_context_is_case_insensitive() {
        let sorted = sort(&sample(), &SortState::new(SortKey::Context, SortDirection::Ascending));
        let names: Vec<_> = sorted.iter().map(|r| r.context().as_str().to_string()).collect();
        assert_eq!(names, vec!["After Breakfast", "Bedtime", "Fasting", "random"]);
    }

    #[test]
    fn test_time_and_label_keys() {
        let by_time = sort(&sample(), &SortState::new(SortKey::Time, SortDirection::Ascending));
        assert_eq!(by_time[0].time_string(), "07:00");
        assert_eq!(by_time[3].time_string(), "22:00");

        let by_label = sort(&sample(), &SortState::new(SortKey::Label, SortDirection::Ascending));
        let labels: Vec<_> = by_label.iter().map(|r| r.label().as_str()).collect();
        assert_eq!(labels, vec!["Controlled", "Low", "Medium", "Optimal"]);
    }

    #[test]
    fn test_sort_is_stable_and_repeatable() {
        let state = SortState::new(SortKey::Date, SortDirection::Ascending);
        let once = sort(&sample(), &state);
        let twice = sort(&once, &state);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_ties_are_equal_in_both_directions() {
        let a = reading("2024-03-01", "07:00", "Fasting", 95.0);
        let b = reading("2024-03-01", "09:00", "Bedtime", 95.0);
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let state = SortState::new(SortKey::Level, direction);
            assert_eq!(state.compare(&a, &b), Ordering::Equal);
        }
    }

    #[test]
    fn test_three_phase_toggle() {
        let mut state = SortState::default();

        state.request_sort(SortKey::Level);
        assert_eq!(state, SortState::new(SortKey::Level, SortDirection::Ascending));

        state.request_sort(SortKey::Level);
        assert_eq!(state, SortState::new(SortKey::Level, SortDirection::Descending));

        state.request_sort(SortKey::Level);
        assert_eq!(state, SortState::default());
    }

    #[test]
    fn test_toggle_on_default_column() {
        let mut state = SortState::default();

        // Already descending on date: resets to the default it already is
        state.request_sort(SortKey::Date);
        assert_eq!(state, SortState::default());

        let mut state = SortState::new(SortKey::Date, SortDirection::Ascending);
        state.request_sort(SortKey::Date);
        assert_eq!(state, SortState::default());
    }

    #[test]
    fn test_switching_column_starts_ascending() {
        let mut state = SortState::new(SortKey::Level, SortDirection::Descending);
        state.request_sort(SortKey::Context);
        assert_eq!(state, SortState::new(SortKey::Context, SortDirection::Ascending));
    }

    #[test]
    fn test_sort_key_from_str() {
        assert_eq!("Level".parse::<SortKey>().unwrap(), SortKey::Level);
        assert!("weight".parse::<SortKey>().is_err());
    }
}
