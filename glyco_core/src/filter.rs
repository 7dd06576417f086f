//! Filter engine for reading collections.
//!
//! A reading is visible when it passes every check of the active
//! [`FilterState`]: date range, context selection, label selection and
//! free-text search. Excluding everything is a valid state, not an error.

use crate::{Context, Label, Reading};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inclusive calendar-date range
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Range from the earliest to the latest reading date, `None` when empty
    pub fn spanning(readings: &[Reading]) -> Option<Self> {
        let start = readings.iter().map(Reading::date).min()?;
        let end = readings.iter().map(Reading::date).max()?;
        Some(Self { start, end })
    }

    /// An inverted range (`start > end`) contains nothing.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

/// Active filter parameters of a view
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    /// `None` leaves dates unbounded; only seen before any reading is loaded.
    pub date_range: Option<DateRange>,
    pub selected_contexts: BTreeSet<Context>,
    pub selected_labels: BTreeSet<Label>,
    pub search_term: String,
}

impl FilterState {
    /// Defaults for a freshly loaded collection: full date span, every
    /// context and label present, no search.
    pub fn defaults_for(readings: &[Reading]) -> Self {
        Self {
            date_range: DateRange::spanning(readings),
            selected_contexts: available_contexts(readings).into_iter().collect(),
            selected_labels: available_labels(readings).into_iter().collect(),
            search_term: String::new(),
        }
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.date_range = Some(DateRange::new(start, end));
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// Add the context to the selection, or remove it if already selected
    pub fn toggle_context(&mut self, context: &Context) {
        if !self.selected_contexts.remove(context) {
            self.selected_contexts.insert(context.clone());
        }
    }

    /// Add the label to the selection, or remove it if already selected
    pub fn toggle_label(&mut self, label: Label) {
        if !self.selected_labels.remove(&label) {
            self.selected_labels.insert(label);
        }
    }

    /// Whether a single reading passes every check
    pub fn matches(&self, reading: &Reading) -> bool {
        let passes_date = self
            .date_range
            .map_or(true, |range| range.contains(reading.date()));
        let passes_context = self.selected_contexts.contains(reading.context());
        let label = reading.label();
        let passes_label = self.selected_labels.contains(&label);

        passes_date && passes_context && passes_label && self.matches_search(reading, label)
    }

    fn matches_search(&self, reading: &Reading, label: Label) -> bool {
        if self.search_term.is_empty() {
            return true;
        }
        let term = self.search_term.to_lowercase();
        reading.context().as_str().to_lowercase().contains(&term)
            || reading.level_string().contains(&term)
            || label.as_str().to_lowercase().contains(&term)
    }
}

/// Readings passing `state`, in their original relative order
pub fn filter(readings: &[Reading], state: &FilterState) -> Vec<Reading> {
    let filtered: Vec<Reading> = readings
        .iter()
        .filter(|r| state.matches(r))
        .cloned()
        .collect();

    tracing::debug!("Filter kept {} of {} readings", filtered.len(), readings.len());
    filtered
}

/// Distinct contexts present, sorted by display name
pub fn available_contexts(readings: &[Reading]) -> Vec<Context> {
    let mut contexts: Vec<Context> = readings
        .iter()
        .map(|r| r.context().clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    contexts.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    contexts
}

/// Distinct labels present, sorted by display name
pub fn available_labels(readings: &[Reading]) -> Vec<Label> {
    let mut labels: Vec<Label> = readings
        .iter()
        .map(Reading::label)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    labels.sort_by_key(|l| l.as_str());
    labels
}
