// ABOUTME: Pure personal-record detection against current stored bests
// ABOUTME: Strict-improvement comparison across all record types of an entry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Maverick Fitness

//! Personal-record detection
//!
//! A pure function of the entry and the current stored values: the
//! coordinator supplies the values it read under lock, and applies any
//! resulting updates itself. Equalling a stored record is not a new record;
//! only a strict improvement counts.

use std::collections::BTreeMap;

use crate::models::{PerformanceEntry, RecordOutcome, RecordType};

/// Evaluate an entry against the current best values for its exercise.
///
/// `current` maps each record type to the stored best (`None` when the user
/// has no record yet for that type). Record types the entry cannot derive a
/// valid value for (zero/negative magnitudes never make it past
/// `derived_value`) produce no outcome at all.
#[must_use]
pub fn evaluate(
    entry: &PerformanceEntry,
    current: &BTreeMap<RecordType, Option<f64>>,
) -> Vec<RecordOutcome> {
    let mut outcomes = Vec::new();

    for record_type in RecordType::ALL {
        let Some(new_value) = entry.derived_value(record_type) else {
            continue;
        };

        let previous_value = current.get(&record_type).copied().flatten();
        let is_new_record = previous_value.is_none_or(|best| new_value > best);

        outcomes.push(RecordOutcome {
            exercise_id: entry.exercise_id,
            record_type,
            previous_value,
            new_value,
            is_new_record,
        });
    }

    outcomes
}
