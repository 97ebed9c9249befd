// ABOUTME: Engine configuration and badge catalog loading
// ABOUTME: Environment-overridable runtime settings plus the platform default badge set
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Maverick Fitness

//! Engine configuration
//!
//! Runtime knobs come from [`EngineConfig`] (with environment-variable
//! overrides); the badge catalog is either seeded from
//! [`default_badges`] or loaded from a JSON file supplied by the host's
//! admin tooling.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AppError, AppResult};
use crate::models::{BadgeCategory, BadgeDefinition, BadgeRarity, SpecialRequirement};

/// Runtime configuration for the award engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum `process()` attempts before a transient conflict surfaces as
    /// `RETRY_EXHAUSTED`
    pub max_award_attempts: u32,
    /// Base backoff between retry attempts, in milliseconds (doubles per attempt)
    pub retry_backoff_base_ms: u64,
    /// How long a connection waits on a locked database before reporting busy
    pub busy_timeout_ms: u64,
    /// Connection pool size
    pub max_connections: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_award_attempts: 3,
            retry_backoff_base_ms: 10,
            busy_timeout_ms: 5_000,
            max_connections: 5,
        }
    }
}

impl EngineConfig {
    /// Build configuration from environment variables, falling back to defaults.
    ///
    /// Recognized variables: `AWARD_MAX_ATTEMPTS`, `AWARD_RETRY_BACKOFF_MS`,
    /// `AWARD_BUSY_TIMEOUT_MS`, `AWARD_MAX_CONNECTIONS`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_award_attempts: parse_env("AWARD_MAX_ATTEMPTS", defaults.max_award_attempts),
            retry_backoff_base_ms: parse_env(
                "AWARD_RETRY_BACKOFF_MS",
                defaults.retry_backoff_base_ms,
            ),
            busy_timeout_ms: parse_env("AWARD_BUSY_TIMEOUT_MS", defaults.busy_timeout_ms),
            max_connections: parse_env("AWARD_MAX_CONNECTIONS", defaults.max_connections),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Badge catalog
// ============================================================================

/// One badge entry as represented in a catalog JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeCatalogEntry {
    /// Stable slug identifier
    pub id: String,
    /// Human label
    pub name: String,
    /// Human description
    pub description: String,
    /// Category grouping
    #[serde(default)]
    pub category: BadgeCategory,
    /// Rarity tier
    #[serde(default)]
    pub rarity: BadgeRarity,
    /// Whether the badge can currently be awarded
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Hidden badges are excluded from the award loop
    #[serde(default)]
    pub is_hidden: bool,
    /// Minimum total XP (0 = not required)
    #[serde(default)]
    pub xp_required: i64,
    /// Minimum level (0 = not required)
    #[serde(default)]
    pub level_required: i64,
    /// Minimum streak in days (0 = not required)
    #[serde(default)]
    pub streak_required: i64,
    /// Minimum total workouts (0 = not required)
    #[serde(default)]
    pub workouts_required: i64,
    /// Minimum completed challenges (0 = not required)
    #[serde(default)]
    pub challenges_required: i64,
    /// Special requirement object, e.g. `{"consecutive_workouts": 7}`
    #[serde(default)]
    pub special_requirements: serde_json::Map<String, Value>,
}

const fn default_true() -> bool {
    true
}

impl BadgeCatalogEntry {
    /// Convert the catalog representation into the domain definition
    #[must_use]
    pub fn into_definition(self) -> BadgeDefinition {
        let special_requirements = self
            .special_requirements
            .iter()
            .map(|(k, v)| SpecialRequirement::from_entry(k, v))
            .collect();
        BadgeDefinition {
            id: self.id,
            name: self.name,
            description: self.description,
            category: self.category,
            rarity: self.rarity,
            is_active: self.is_active,
            is_hidden: self.is_hidden,
            xp_required: self.xp_required,
            level_required: self.level_required,
            streak_required: self.streak_required,
            workouts_required: self.workouts_required,
            challenges_required: self.challenges_required,
            special_requirements,
        }
    }
}

/// Parse a badge catalog from its JSON text form
///
/// # Errors
///
/// Returns an error if the text is not a valid catalog document or if badge
/// ids are not unique
pub fn parse_catalog(raw: &str) -> AppResult<Vec<BadgeDefinition>> {
    let entries: Vec<BadgeCatalogEntry> = serde_json::from_str(raw)?;
    let mut seen = std::collections::HashSet::new();
    for entry in &entries {
        if !seen.insert(entry.id.clone()) {
            return Err(AppError::config(format!(
                "duplicate badge id in catalog: {}",
                entry.id
            )));
        }
    }
    Ok(entries
        .into_iter()
        .map(BadgeCatalogEntry::into_definition)
        .collect())
}

/// Load a badge catalog from a JSON file
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed
pub fn load_catalog(path: &Path) -> AppResult<Vec<BadgeDefinition>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AppError::config(format!("failed to read catalog {}: {e}", path.display())))?;
    parse_catalog(&raw)
}

/// The platform's default badge catalog.
///
/// Mirrors the badge set shipped with the Maverick tracker: strength
/// milestones by workout count, consistency badges by streak, social badges,
/// and level milestones. The Social Butterfly badge's `friends_required`
/// requirement is evaluated by the host's social subsystem and passes
/// through here as an unrecognized kind.
#[must_use]
pub fn default_badges() -> Vec<BadgeDefinition> {
    fn badge(
        id: &str,
        name: &str,
        description: &str,
        category: BadgeCategory,
        rarity: BadgeRarity,
    ) -> BadgeDefinition {
        BadgeDefinition {
            id: id.to_owned(),
            name: name.to_owned(),
            description: description.to_owned(),
            category,
            rarity,
            is_active: true,
            is_hidden: false,
            xp_required: 0,
            level_required: 0,
            streak_required: 0,
            workouts_required: 0,
            challenges_required: 0,
            special_requirements: Vec::new(),
        }
    }

    let mut badges = Vec::new();

    // Strength badges
    let mut first_workout = badge(
        "first-workout",
        "First Workout",
        "Complete your first workout",
        BadgeCategory::Strength,
        BadgeRarity::Common,
    );
    first_workout.workouts_required = 1;
    badges.push(first_workout);

    let mut strength_builder = badge(
        "strength-builder",
        "Strength Builder",
        "Complete 10 strength workouts",
        BadgeCategory::Strength,
        BadgeRarity::Uncommon,
    );
    strength_builder.workouts_required = 10;
    badges.push(strength_builder);

    let mut powerlifter = badge(
        "powerlifter",
        "Powerlifter",
        "Complete 50 strength workouts",
        BadgeCategory::Strength,
        BadgeRarity::Rare,
    );
    powerlifter.workouts_required = 50;
    badges.push(powerlifter);

    let mut first_pr = badge(
        "first-pr",
        "First PR",
        "Set your first personal record",
        BadgeCategory::Strength,
        BadgeRarity::Common,
    );
    first_pr.special_requirements = vec![SpecialRequirement::AnyPersonalRecord];
    badges.push(first_pr);

    // Consistency badges
    let mut getting_started = badge(
        "getting-started",
        "Getting Started",
        "Work out for 3 consecutive days",
        BadgeCategory::Consistency,
        BadgeRarity::Common,
    );
    getting_started.streak_required = 3;
    badges.push(getting_started);

    let mut week_warrior = badge(
        "week-warrior",
        "Week Warrior",
        "Work out for 7 consecutive days",
        BadgeCategory::Consistency,
        BadgeRarity::Uncommon,
    );
    week_warrior.streak_required = 7;
    badges.push(week_warrior);

    let mut month_master = badge(
        "month-master",
        "Month Master",
        "Work out for 30 consecutive days",
        BadgeCategory::Consistency,
        BadgeRarity::Epic,
    );
    month_master.streak_required = 30;
    badges.push(month_master);

    // Social badges
    let mut social_butterfly = badge(
        "social-butterfly",
        "Social Butterfly",
        "Make your first friend",
        BadgeCategory::Social,
        BadgeRarity::Common,
    );
    social_butterfly.special_requirements = vec![SpecialRequirement::Other {
        kind: "friends_required".to_owned(),
    }];
    badges.push(social_butterfly);

    let mut challenge_master = badge(
        "challenge-master",
        "Challenge Master",
        "Complete 5 challenges",
        BadgeCategory::Social,
        BadgeRarity::Uncommon,
    );
    challenge_master.challenges_required = 5;
    badges.push(challenge_master);

    // Milestone badges
    let mut level_10 = badge(
        "level-10",
        "Level 10",
        "Reach level 10",
        BadgeCategory::Milestone,
        BadgeRarity::Uncommon,
    );
    level_10.level_required = 10;
    badges.push(level_10);

    let mut level_25 = badge(
        "level-25",
        "Level 25",
        "Reach level 25",
        BadgeCategory::Milestone,
        BadgeRarity::Rare,
    );
    level_25.level_required = 25;
    badges.push(level_25);

    let mut level_50 = badge(
        "level-50",
        "Level 50",
        "Reach level 50",
        BadgeCategory::Milestone,
        BadgeRarity::Legendary,
    );
    level_50.level_required = 50;
    badges.push(level_50);

    badges
}
