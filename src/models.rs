// ABOUTME: Domain types for the award engine
// ABOUTME: Performance entries, records, badge definitions, profiles, and award results
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Maverick Fitness

//! Domain types shared across the detection, evaluation, and persistence layers

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::metrics;

// ============================================================================
// Record types
// ============================================================================

/// The metric variant a personal record is tracked against
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    /// Heaviest single-set weight lifted
    MaxWeight,
    /// Most repetitions performed in a single set
    MaxReps,
    /// Largest single-set volume (weight × reps)
    MaxVolume,
    /// Estimated one-rep max (Epley formula)
    EstimatedOneRepMax,
}

impl RecordType {
    /// All record types evaluated for a strength entry
    pub const ALL: [Self; 4] = [
        Self::MaxWeight,
        Self::MaxReps,
        Self::MaxVolume,
        Self::EstimatedOneRepMax,
    ];

    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MaxWeight => "max_weight",
            Self::MaxReps => "max_reps",
            Self::MaxVolume => "max_volume",
            Self::EstimatedOneRepMax => "estimated_1rm",
        }
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "max_weight" => Ok(Self::MaxWeight),
            "max_reps" => Ok(Self::MaxReps),
            "max_volume" => Ok(Self::MaxVolume),
            "estimated_1rm" => Ok(Self::EstimatedOneRepMax),
            _ => Err(AppError::serialization(format!(
                "Invalid record type: {s}"
            ))),
        }
    }
}

// ============================================================================
// Performance entries
// ============================================================================

/// A newly logged strength set, immutable once created.
///
/// Created by the workout-logging subsystem; this engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceEntry {
    /// Entry id
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Exercise performed
    pub exercise_id: Uuid,
    /// Workout session this set belongs to
    pub session_id: Uuid,
    /// Weight lifted, in kilograms
    pub weight_kg: f64,
    /// Repetitions performed
    pub reps: i64,
    /// When the set was recorded
    pub recorded_at: DateTime<Utc>,
}

impl PerformanceEntry {
    /// Derive the comparison value for a record type.
    ///
    /// Returns `None` when the entry cannot produce a valid value for the
    /// metric: zero or negative weight/reps, or a non-finite weight. Such
    /// entries are rejected upstream, but if one slips through it is treated
    /// as "no record" rather than an error.
    #[must_use]
    pub fn derived_value(&self, record_type: RecordType) -> Option<f64> {
        if !self.weight_kg.is_finite() || self.weight_kg <= 0.0 || self.reps <= 0 {
            return None;
        }
        match record_type {
            RecordType::MaxWeight => Some(self.weight_kg),
            RecordType::MaxReps => Some(self.reps as f64),
            RecordType::MaxVolume => metrics::set_volume(self.weight_kg, self.reps),
            RecordType::EstimatedOneRepMax => {
                metrics::epley_one_rep_max(self.weight_kg, self.reps)
            }
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// Best-known performance for a (user, exercise, record-type) tuple
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Owning user
    pub user_id: Uuid,
    /// Exercise the record is held on
    pub exercise_id: Uuid,
    /// Metric the record tracks
    pub record_type: RecordType,
    /// Best derived value observed
    pub value: f64,
    /// Weight of the set that achieved the record
    pub weight_kg: f64,
    /// Reps of the set that achieved the record
    pub reps: i64,
    /// Session of the achieving set
    pub session_id: Option<Uuid>,
    /// When the record was achieved
    pub achieved_at: DateTime<Utc>,
}

impl Record {
    /// Build the record row a qualifying entry would store
    #[must_use]
    pub fn from_entry(entry: &PerformanceEntry, outcome: &RecordOutcome) -> Self {
        Self {
            user_id: entry.user_id,
            exercise_id: entry.exercise_id,
            record_type: outcome.record_type,
            value: outcome.new_value,
            weight_kg: entry.weight_kg,
            reps: entry.reps,
            session_id: Some(entry.session_id),
            achieved_at: entry.recorded_at,
        }
    }
}

/// Result of evaluating one record type against the stored best
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordOutcome {
    /// Exercise the evaluation ran against
    pub exercise_id: Uuid,
    /// Metric evaluated
    pub record_type: RecordType,
    /// Stored best before this entry, if any
    pub previous_value: Option<f64>,
    /// Value derived from the new entry
    pub new_value: f64,
    /// Whether the entry strictly beat the stored best
    pub is_new_record: bool,
}

impl RecordOutcome {
    /// Absolute improvement over the previous best, when this is a new record
    #[must_use]
    pub fn improvement(&self) -> Option<f64> {
        if self.is_new_record {
            Some(self.new_value - self.previous_value.unwrap_or(0.0))
        } else {
            None
        }
    }
}

// ============================================================================
// Badges
// ============================================================================

/// Badge category, following the platform's default catalog
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    /// Strength and workout-count badges
    Strength,
    /// Streak-based badges
    Consistency,
    /// Friend and challenge badges
    Social,
    /// Level and XP milestones
    #[default]
    Milestone,
}

impl BadgeCategory {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Consistency => "consistency",
            Self::Social => "social",
            Self::Milestone => "milestone",
        }
    }
}

impl Display for BadgeCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BadgeCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strength" => Ok(Self::Strength),
            "consistency" => Ok(Self::Consistency),
            "social" => Ok(Self::Social),
            "milestone" => Ok(Self::Milestone),
            _ => Err(AppError::serialization(format!(
                "Invalid badge category: {s}"
            ))),
        }
    }
}

/// Badge rarity tier
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BadgeRarity {
    /// Earned by most active users
    #[default]
    Common,
    /// Requires sustained activity
    Uncommon,
    /// Requires significant dedication
    Rare,
    /// Long-term accomplishment
    Epic,
    /// Top-tier accomplishment
    Legendary,
}

impl BadgeRarity {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

impl Display for BadgeRarity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BadgeRarity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "common" => Ok(Self::Common),
            "uncommon" => Ok(Self::Uncommon),
            "rare" => Ok(Self::Rare),
            "epic" => Ok(Self::Epic),
            "legendary" => Ok(Self::Legendary),
            _ => Err(AppError::serialization(format!(
                "Invalid badge rarity: {s}"
            ))),
        }
    }
}

/// A special unlock requirement beyond the numeric thresholds.
///
/// Stored as a JSON object on the badge row (`{"consecutive_workouts": 7}`);
/// each key/value pair parses into one variant. Unrecognized kinds land in
/// [`SpecialRequirement::Other`], which evaluates as satisfied. That is the
/// platform's historical behavior for requirement kinds the engine does not
/// know about (the default catalog's `friends_required` takes this path).
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialRequirement {
    /// Any new personal record set by the triggering entry
    AnyPersonalRecord,
    /// A workout streak of at least this many consecutive days
    ConsecutiveWorkouts(u32),
    /// A new record on one specific exercise
    SpecificExercisePr(Uuid),
    /// At least this many kilograms of body weight lost
    WeightLossGoal(f64),
    /// Unrecognized requirement kind; evaluates as satisfied
    Other {
        /// The JSON key that was not recognized
        kind: String,
    },
}

impl SpecialRequirement {
    /// Parse one `key: value` pair from a stored requirements object
    #[must_use]
    pub fn from_entry(key: &str, value: &Value) -> Self {
        match key {
            "pr" => Self::AnyPersonalRecord,
            "consecutive_workouts" => value.as_u64().map_or_else(
                || Self::Other {
                    kind: key.to_owned(),
                },
                |n| Self::ConsecutiveWorkouts(u32::try_from(n).unwrap_or(u32::MAX)),
            ),
            "specific_exercise_pr" => value
                .as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .map_or_else(
                    || Self::Other {
                        kind: key.to_owned(),
                    },
                    Self::SpecificExercisePr,
                ),
            "weight_loss_goal" => value.as_f64().map_or_else(
                || Self::Other {
                    kind: key.to_owned(),
                },
                Self::WeightLossGoal,
            ),
            _ => Self::Other {
                kind: key.to_owned(),
            },
        }
    }

    /// The `key: value` pair this requirement stores as
    #[must_use]
    pub fn to_entry(&self) -> (String, Value) {
        match self {
            Self::AnyPersonalRecord => ("pr".to_owned(), json!(true)),
            Self::ConsecutiveWorkouts(n) => ("consecutive_workouts".to_owned(), json!(n)),
            Self::SpecificExercisePr(id) => {
                ("specific_exercise_pr".to_owned(), json!(id.to_string()))
            }
            Self::WeightLossGoal(kg) => ("weight_loss_goal".to_owned(), json!(kg)),
            Self::Other { kind } => (kind.clone(), json!(true)),
        }
    }
}

/// Parse the stored JSON requirements object into requirement variants
///
/// # Errors
///
/// Returns an error if the stored text is not a JSON object
pub fn parse_special_requirements(raw: &str) -> Result<Vec<SpecialRequirement>, AppError> {
    let map: serde_json::Map<String, Value> = serde_json::from_str(raw)?;
    Ok(map
        .iter()
        .map(|(k, v)| SpecialRequirement::from_entry(k, v))
        .collect())
}

/// Serialize requirement variants back to the stored JSON object form
#[must_use]
pub fn special_requirements_to_json(requirements: &[SpecialRequirement]) -> Value {
    let mut map = serde_json::Map::new();
    for req in requirements {
        let (key, value) = req.to_entry();
        map.insert(key, value);
    }
    Value::Object(map)
}

/// A badge definition from the configured catalog.
///
/// Numeric thresholds of zero mean "not required". A badge only enters the
/// award loop while it is active and not hidden.
#[derive(Debug, Clone)]
pub struct BadgeDefinition {
    /// Stable slug identifier, unique across the catalog
    pub id: String,
    /// Human label
    pub name: String,
    /// Human description
    pub description: String,
    /// Category grouping
    pub category: BadgeCategory,
    /// Rarity tier
    pub rarity: BadgeRarity,
    /// Retired badges are never awarded, even when criteria are met
    pub is_active: bool,
    /// Hidden badges are excluded from the award loop
    pub is_hidden: bool,
    /// Minimum total XP (0 = not required)
    pub xp_required: i64,
    /// Minimum level (0 = not required)
    pub level_required: i64,
    /// Minimum current streak in days (0 = not required)
    pub streak_required: i64,
    /// Minimum total workouts (0 = not required)
    pub workouts_required: i64,
    /// Minimum completed challenges (0 = not required)
    pub challenges_required: i64,
    /// Additional predicates beyond the numeric thresholds
    pub special_requirements: Vec<SpecialRequirement>,
}

// ============================================================================
// Profiles and earned badges
// ============================================================================

/// Transactionally consistent snapshot of a user's gamification stats.
///
/// Read, never mutated, by this engine; XP, streak, and counter updates
/// are the host gamification engine's responsibility. `weight_lost_kg` is
/// populated by the host's body-measurement subsystem when available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    /// Owning user
    pub user_id: Uuid,
    /// Cumulative XP
    pub total_xp: i64,
    /// Current level
    pub current_level: i64,
    /// Current consecutive-day streak
    pub current_streak: i64,
    /// Longest streak ever held
    pub longest_streak: i64,
    /// Cumulative workout count
    pub total_workouts: i64,
    /// Cumulative completed challenges
    pub total_challenges_completed: i64,
    /// Kilograms of body weight lost, when the host tracks measurements
    pub weight_lost_kg: Option<f64>,
}

impl ProfileSnapshot {
    /// The stats snapshot persisted alongside an earned badge
    #[must_use]
    pub fn earned_data(&self) -> Value {
        json!({
            "level": self.current_level,
            "xp": self.total_xp,
            "streak": self.current_streak,
            "workouts": self.total_workouts,
            "challenges": self.total_challenges_completed,
        })
    }
}

/// An earned badge: append-only join of (user, badge)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBadge {
    /// Owning user
    pub user_id: Uuid,
    /// Earned badge id
    pub badge_id: String,
    /// When the badge was earned
    pub earned_at: DateTime<Utc>,
    /// Stats snapshot at the time of earning
    pub earned_data: Value,
}

// ============================================================================
// Award results
// ============================================================================

/// Outcome of one `AwardCoordinator::process` call
#[derive(Debug, Clone)]
pub struct AwardResult {
    /// Records broken by this entry
    pub new_records: Vec<RecordOutcome>,
    /// Badges newly awarded to this caller.
    ///
    /// A badge concurrently awarded by another transaction is omitted here
    /// even when this call also qualified for it.
    pub new_badges: Vec<BadgeDefinition>,
    /// The profile snapshot the evaluation ran against
    pub snapshot: ProfileSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(weight_kg: f64, reps: i64) -> PerformanceEntry {
        PerformanceEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            exercise_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            weight_kg,
            reps,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn record_type_round_trips_through_strings() {
        for record_type in RecordType::ALL {
            let parsed: RecordType = record_type.as_str().parse().expect("parse");
            assert_eq!(parsed, record_type);
        }
    }

    #[test]
    fn derived_values_for_valid_entry() {
        let entry = entry(100.0, 5);
        assert_eq!(entry.derived_value(RecordType::MaxWeight), Some(100.0));
        assert_eq!(entry.derived_value(RecordType::MaxReps), Some(5.0));
        assert_eq!(entry.derived_value(RecordType::MaxVolume), Some(500.0));
        let e1rm = entry
            .derived_value(RecordType::EstimatedOneRepMax)
            .expect("e1rm");
        assert!((e1rm - 100.0 * (1.0 + 5.0 / 30.0)).abs() < 1e-9);
    }

    #[test]
    fn invalid_magnitudes_derive_nothing() {
        for bad in [entry(0.0, 5), entry(-20.0, 5), entry(100.0, 0), entry(f64::NAN, 5)] {
            for record_type in RecordType::ALL {
                assert_eq!(bad.derived_value(record_type), None);
            }
        }
    }

    #[test]
    fn special_requirement_parsing() {
        let raw = r#"{"pr": true, "consecutive_workouts": 7, "friends_required": 1}"#;
        let reqs = parse_special_requirements(raw).expect("parse");
        assert!(reqs.contains(&SpecialRequirement::AnyPersonalRecord));
        assert!(reqs.contains(&SpecialRequirement::ConsecutiveWorkouts(7)));
        assert!(reqs.contains(&SpecialRequirement::Other {
            kind: "friends_required".to_owned()
        }));
    }

    #[test]
    fn special_requirements_round_trip() {
        let reqs = vec![
            SpecialRequirement::AnyPersonalRecord,
            SpecialRequirement::ConsecutiveWorkouts(30),
            SpecialRequirement::WeightLossGoal(5.0),
        ];
        let raw = special_requirements_to_json(&reqs).to_string();
        let parsed = parse_special_requirements(&raw).expect("parse");
        assert_eq!(parsed.len(), reqs.len());
        for req in &reqs {
            assert!(parsed.contains(req));
        }
    }

    #[test]
    fn earned_data_snapshot_shape() {
        let snapshot = ProfileSnapshot {
            user_id: Uuid::new_v4(),
            total_xp: 150,
            current_level: 2,
            current_streak: 3,
            longest_streak: 5,
            total_workouts: 12,
            total_challenges_completed: 1,
            weight_lost_kg: None,
        };
        let data = snapshot.earned_data();
        assert_eq!(data["level"], 2);
        assert_eq!(data["workouts"], 12);
    }
}
