//! View derivation: readings + filter + sort -> visible rows.
//!
//! [`derive_view`] is the pure pipeline. [`ViewSession`] owns one user's
//! readings and view state and memoizes the derived rows until any input
//! changes.

use crate::aggregate::{aggregate_by_context, summarize, ContextAverages, Summary};
use crate::filter::{available_contexts, available_labels, filter, FilterState};
use crate::sort::{sort, SortKey, SortState};
use crate::{Context, Label, Reading};
use chrono::NaiveDate;

/// Filter then sort
pub fn derive_view(readings: &[Reading], filter_state: &FilterState, sort_state: &SortState) -> Vec<Reading> {
    sort(&filter(readings, filter_state), sort_state)
}

/// What a viewer should show when the visible set is empty
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewStatus {
    /// No readings have been loaded at all
    NoReadings,
    /// Readings exist but the filters exclude all of them
    NoMatches,
    /// At least one row is visible
    Showing(usize),
}

/// One viewer's readings and view state
#[derive(Debug, Default)]
pub struct ViewSession {
    readings: Vec<Reading>,
    filter: FilterState,
    sort: SortState,
    cached: Option<Vec<Reading>>,
}

impl ViewSession {
    pub fn new(readings: Vec<Reading>) -> Self {
        let mut session = Self::default();
        session.load(readings);
        session
    }

    /// Replace the reading collection, resetting filter and sort to the
    /// defaults for the new collection.
    pub fn load(&mut self, readings: Vec<Reading>) {
        tracing::debug!("View session loaded {} readings", readings.len());
        self.filter = FilterState::defaults_for(&readings);
        self.sort = SortState::default();
        self.readings = readings;
        self.cached = None;
    }

    /// Restore every filter default and the default sort
    pub fn clear_all_filters(&mut self) {
        self.filter = FilterState::defaults_for(&self.readings);
        self.sort = SortState::default();
        self.cached = None;
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn available_contexts(&self) -> Vec<Context> {
        available_contexts(&self.readings)
    }

    pub fn available_labels(&self) -> Vec<Label> {
        available_labels(&self.readings)
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.filter.set_date_range(start, end);
        self.cached = None;
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.filter.set_search_term(term);
        self.cached = None;
    }

    pub fn toggle_context(&mut self, context: &Context) {
        self.filter.toggle_context(context);
        self.cached = None;
    }

    pub fn toggle_label(&mut self, label: Label) {
        self.filter.toggle_label(label);
        self.cached = None;
    }

    pub fn request_sort(&mut self, key: SortKey) {
        self.sort.request_sort(key);
        self.cached = None;
    }

    /// Current visible rows, derived on first access after a change
    pub fn visible(&mut self) -> &[Reading] {
        let (readings, filter_state, sort_state) = (&self.readings, &self.filter, &self.sort);
        self.cached
            .get_or_insert_with(|| derive_view(readings, filter_state, sort_state))
    }

    pub fn visible_count(&mut self) -> usize {
        self.visible().len()
    }

    pub fn status(&mut self) -> ViewStatus {
        if self.readings.is_empty() {
            return ViewStatus::NoReadings;
        }
        match self.visible_count() {
            0 => ViewStatus::NoMatches,
            n => ViewStatus::Showing(n),
        }
    }

    /// Per-context averages of the visible rows
    pub fn context_averages(&mut self) -> ContextAverages {
        aggregate_by_context(self.visible())
    }

    pub fn summary(&mut self) -> Option<Summary> {
        summarize(self.visible())
    }
}
