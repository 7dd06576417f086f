//! Reading classification.
//!
//! Fasting readings are judged against a narrower band than every other
//! context. Each bracket's upper boundary is inclusive.

use crate::{Context, Label};

/// Classify a glucose level taken in the given context.
///
/// Total over finite levels: non-finite levels are rejected at ingestion and
/// never get here.
pub fn classify(level: f64, context: &Context) -> Label {
    if context.is_fasting() {
        classify_fasting(level)
    } else {
        classify_general(level)
    }
}

fn classify_fasting(level: f64) -> Label {
    if level < 80.0 {
        Label::Low
    } else if level <= 100.0 {
        Label::Optimal
    } else if level <= 125.0 {
        Label::Controlled
    } else {
        Label::High
    }
}

fn classify_general(level: f64) -> Label {
    if level < 70.0 {
        Label::Low
    } else if level <= 140.0 {
        Label::Optimal
    } else if level <= 180.0 {
        Label::Controlled
    } else if level <= 220.0 {
        Label::Medium
    } else {
        Label::High
    }
}
