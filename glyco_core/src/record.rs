//! Boundary formats: the JSON reading record and the ingestion request.

use crate::{Context, Error, Reading, Result, DEFAULT_UNIT};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context applied when an ingestion request names none
pub const DEFAULT_CONTEXT: &str = "Random";

/// A reading as exchanged with viewers and exports
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    pub id: String,
    pub date: String,
    pub time: String,
    pub context: String,
    pub level: f64,
    pub unit: String,
    pub label: String,
}

impl From<&Reading> for ReadingRecord {
    fn from(reading: &Reading) -> Self {
        ReadingRecord {
            id: reading.id().to_string(),
            date: reading.date_string(),
            time: reading.time_string(),
            context: reading.context().to_string(),
            level: reading.level(),
            unit: reading.unit().to_string(),
            label: reading.label().to_string(),
        }
    }
}

impl TryFrom<ReadingRecord> for Reading {
    type Error = Error;

    /// The record's label is ignored; the reading recomputes its own.
    fn try_from(record: ReadingRecord) -> Result<Self> {
        let id = Uuid::parse_str(&record.id)
            .map_err(|e| Error::Validation(format!("Invalid id {:?}: {}", record.id, e)))?;
        let date = NaiveDate::parse_from_str(&record.date, "%Y-%m-%d")
            .map_err(|e| Error::Validation(format!("Invalid date {:?}: {}", record.date, e)))?;
        let time = NaiveTime::parse_from_str(&record.time, "%H:%M")
            .map_err(|e| Error::Validation(format!("Invalid time {:?}: {}", record.time, e)))?;
        if !record.level.is_finite() {
            return Err(Error::Validation("level must be a finite number".into()));
        }

        let reading = Reading::new(
            id,
            NaiveDateTime::new(date, time),
            Context::parse(&record.context),
            record.level,
            record.unit,
        );

        if reading.label().as_str() != record.label {
            tracing::debug!(
                "Record {} carried label {:?}, recomputed as {}",
                record.id,
                record.label,
                reading.label()
            );
        }

        Ok(reading)
    }
}

/// A validated request to log one reading
#[derive(Clone, Debug, PartialEq)]
pub struct NewReading {
    pub level: f64,
    pub unit: String,
    pub context: Context,
}

impl NewReading {
    /// Validate a level and attach unit/context
    pub fn new(level: f64, unit: impl Into<String>, context: Context) -> Result<Self> {
        if !level.is_finite() {
            return Err(Error::Validation("level must be a finite number".into()));
        }
        Ok(Self {
            level,
            unit: unit.into(),
            context,
        })
    }

    /// Parse `{level, unit?, context?}` using the built-in defaults
    pub fn from_json(body: &str) -> Result<Self> {
        Self::from_json_with_defaults(body, DEFAULT_UNIT, DEFAULT_CONTEXT)
    }

    /// Parse `{level, unit?, context?}`, filling absent fields from the
    /// given defaults. A missing or non-numeric level is rejected rather
    /// than coerced.
    pub fn from_json_with_defaults(
        body: &str,
        default_unit: &str,
        default_context: &str,
    ) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| Error::Validation(format!("Malformed request body: {}", e)))?;

        let level = value
            .get("level")
            .and_then(serde_json::Value::as_f64)
            .ok_or_else(|| Error::Validation("level must be a finite number".into()))?;

        let unit = match value.get("unit") {
            None | Some(serde_json::Value::Null) => default_unit.to_string(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(_) => return Err(Error::Validation("unit must be a string".into())),
        };

        let context = match value.get("context") {
            None | Some(serde_json::Value::Null) => Context::parse(default_context),
            Some(serde_json::Value::String(s)) => Context::parse(s),
            Some(_) => return Err(Error::Validation("context must be a string".into())),
        };

        Self::new(level, unit, context)
    }
}
