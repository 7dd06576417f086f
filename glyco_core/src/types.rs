//! Core domain types for the Glyco system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Measurement contexts (meal relation / time of day)
//! - Derived severity labels
//! - Readings, whose label is always computed from level and context

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unit applied when the caller does not name one
pub const DEFAULT_UNIT: &str = "mg/dL";

// ============================================================================
// Context
// ============================================================================

/// When a reading was taken relative to meals and sleep
///
/// Names outside the known set are kept verbatim in `Other` and classified
/// on the non-fasting branch.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Context {
    Fasting,
    BeforeBreakfast,
    AfterBreakfast,
    TwoHoursPostLunch,
    BeforeDinner,
    AfterDinner,
    Bedtime,
    Other(String),
}

impl Context {
    /// The named contexts, in the order a logging form offers them
    pub const NAMED: [Context; 7] = [
        Context::Fasting,
        Context::BeforeBreakfast,
        Context::AfterBreakfast,
        Context::TwoHoursPostLunch,
        Context::BeforeDinner,
        Context::AfterDinner,
        Context::Bedtime,
    ];

    /// Display name, also the wire representation
    pub fn as_str(&self) -> &str {
        match self {
            Context::Fasting => "Fasting",
            Context::BeforeBreakfast => "Before Breakfast",
            Context::AfterBreakfast => "After Breakfast",
            Context::TwoHoursPostLunch => "2 Hours Post Lunch",
            Context::BeforeDinner => "Before Dinner",
            Context::AfterDinner => "After Dinner",
            Context::Bedtime => "Bedtime",
            Context::Other(name) => name,
        }
    }

    pub fn is_fasting(&self) -> bool {
        matches!(self, Context::Fasting)
    }

    /// Resolve a context name, matching the known names case-insensitively
    pub fn parse(name: &str) -> Self {
        let trimmed = name.trim();
        Self::NAMED
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .cloned()
            .unwrap_or_else(|| {
                if trimmed.is_empty() {
                    Context::Other("Other".into())
                } else {
                    Context::Other(trimmed.to_string())
                }
            })
    }
}

impl From<String> for Context {
    fn from(name: String) -> Self {
        Context::parse(&name)
    }
}

impl From<Context> for String {
    fn from(context: Context) -> Self {
        context.as_str().to_string()
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Label
// ============================================================================

/// Severity category derived from a reading's level and context
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Low,
    Optimal,
    Controlled,
    Medium,
    High,
}

impl Label {
    pub const ALL: [Label; 5] = [
        Label::Low,
        Label::Optimal,
        Label::Controlled,
        Label::Medium,
        Label::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Low => "Low",
            Label::Optimal => "Optimal",
            Label::Controlled => "Controlled",
            Label::Medium => "Medium",
            Label::High => "High",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Label::ALL
            .iter()
            .copied()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::Error::Other(format!("Unknown label: {}", s)))
    }
}

// ============================================================================
// Reading
// ============================================================================

/// One glucose measurement
///
/// Readings are immutable. There is no stored label: [`Reading::label`]
/// classifies on every call, so the label can never disagree with the
/// level/context pair.
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    id: Uuid,
    timestamp: NaiveDateTime,
    context: Context,
    level: f64,
    unit: String,
}

impl Reading {
    /// Build a reading. `level` must already be validated as finite.
    pub fn new(
        id: Uuid,
        timestamp: NaiveDateTime,
        context: Context,
        level: f64,
        unit: impl Into<String>,
    ) -> Self {
        debug_assert!(level.is_finite(), "non-finite level reached the engine");
        Self {
            id,
            timestamp,
            context,
            level,
            unit: unit.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn label(&self) -> Label {
        crate::classify::classify(self.level, &self.context)
    }

    /// `YYYY-MM-DD`
    pub fn date_string(&self) -> String {
        self.timestamp.format("%Y-%m-%d").to_string()
    }

    /// `HH:MM`
    pub fn time_string(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }

    /// Shortest decimal form of the level (`95`, `95.5`)
    pub fn level_string(&self) -> String {
        format!("{}", self.level)
    }
}
