//! Aggregation over filtered readings.
//!
//! Per-context averages feed the bar chart; summary statistics and the trend
//! series feed the report header and line chart.

use crate::{Context, Reading};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Mean level of one context group
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContextAverage {
    pub context: Context,
    pub average: i64,
    pub count: usize,
}

/// Per-context averages, ordered by first occurrence in the input
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ContextAverages(Vec<ContextAverage>);

impl ContextAverages {
    pub fn get(&self, context: &Context) -> Option<i64> {
        self.0
            .iter()
            .find(|group| &group.context == context)
            .map(|group| group.average)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContextAverage> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a ContextAverages {
    type Item = &'a ContextAverage;
    type IntoIter = std::slice::Iter<'a, ContextAverage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Average, maximum and minimum level of a non-empty collection
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub average: i64,
    pub max: f64,
    pub min: f64,
    pub count: usize,
}

/// Round half up (`x.5` goes to the next integer)
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Group readings by context and average each group's level.
///
/// Empty input gives an empty mapping, never a zero placeholder.
pub fn aggregate_by_context(readings: &[Reading]) -> ContextAverages {
    let mut groups: Vec<(Context, f64, usize)> = Vec::new();

    for reading in readings {
        match groups.iter_mut().find(|(c, _, _)| c == reading.context()) {
            Some((_, total, count)) => {
                *total += reading.level();
                *count += 1;
            }
            None => groups.push((reading.context().clone(), reading.level(), 1)),
        }
    }

    ContextAverages(
        groups
            .into_iter()
            .map(|(context, total, count)| ContextAverage {
                context,
                average: round_half_up(total / count as f64),
                count,
            })
            .collect(),
    )
}

/// Summary statistics, `None` when there is nothing to summarise
pub fn summarize(readings: &[Reading]) -> Option<Summary> {
    if readings.is_empty() {
        return None;
    }

    let total: f64 = readings.iter().map(Reading::level).sum();
    let max = readings.iter().map(Reading::level).fold(f64::NEG_INFINITY, f64::max);
    let min = readings.iter().map(Reading::level).fold(f64::INFINITY, f64::min);

    Some(Summary {
        average: round_half_up(total / readings.len() as f64),
        max,
        min,
        count: readings.len(),
    })
}

/// (timestamp, level) points in view order, for the trend chart
pub fn trend_series(readings: &[Reading]) -> Vec<(NaiveDateTime, f64)> {
    readings.iter().map(|r| (r.timestamp(), r.level())).collect()
}
