// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides database, catalog, and entry-building helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Maverick Fitness
#![allow(dead_code)]

//! Shared test utilities for `maverick_awards` integration tests

use std::sync::{Arc, Once};

use anyhow::Result;
use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use maverick_awards::config::EngineConfig;
use maverick_awards::database::Database;
use maverick_awards::engine::AwardCoordinator;
use maverick_awards::events::{EventSink, NullEventSink};
use maverick_awards::models::{
    BadgeCategory, BadgeDefinition, BadgeRarity, PerformanceEntry, ProfileSnapshot,
    SpecialRequirement,
};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// A migrated file-backed database with one registered exercise.
///
/// File-backed (not `:memory:`) so concurrent connections in the pool see
/// the same database.
pub struct TestHarness {
    pub db: Database,
    pub user_id: Uuid,
    pub exercise_id: Uuid,
    _dir: TempDir,
}

/// Standard test database setup
pub async fn setup() -> Result<TestHarness> {
    init_test_logging();
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("awards.db");
    let url = format!("sqlite://{}", db_path.display());
    let db = Database::new(&url, &EngineConfig::default()).await?;
    let exercise_id = db
        .exercises()
        .register("bench-press", "Bench Press")
        .await?;

    Ok(TestHarness {
        db,
        user_id: Uuid::new_v4(),
        exercise_id,
        _dir: dir,
    })
}

/// Coordinator over the harness database with a discarding event sink
pub fn coordinator(db: &Database) -> AwardCoordinator {
    coordinator_with_sink(db, Arc::new(NullEventSink))
}

/// Coordinator over the harness database with a specific event sink
pub fn coordinator_with_sink(db: &Database, sink: Arc<dyn EventSink>) -> AwardCoordinator {
    AwardCoordinator::new(db.clone(), sink, EngineConfig::default())
}

/// Build a strength set entry for the given tuple
pub fn strength_entry(
    user_id: Uuid,
    exercise_id: Uuid,
    weight_kg: f64,
    reps: i64,
) -> PerformanceEntry {
    PerformanceEntry {
        id: Uuid::new_v4(),
        user_id,
        exercise_id,
        session_id: Uuid::new_v4(),
        weight_kg,
        reps,
        recorded_at: Utc::now(),
    }
}

/// A badge with no numeric thresholds that unlocks on any new PR
pub fn pr_badge(id: &str) -> BadgeDefinition {
    BadgeDefinition {
        id: id.to_owned(),
        name: format!("{id} badge"),
        description: "Awarded on any personal record".to_owned(),
        category: BadgeCategory::Strength,
        rarity: BadgeRarity::Common,
        is_active: true,
        is_hidden: false,
        xp_required: 0,
        level_required: 0,
        streak_required: 0,
        workouts_required: 0,
        challenges_required: 0,
        special_requirements: vec![SpecialRequirement::AnyPersonalRecord],
    }
}

/// A profile snapshot with every counter at its post-first-workout value
pub fn first_workout_profile(user_id: Uuid) -> ProfileSnapshot {
    ProfileSnapshot {
        user_id,
        total_xp: 10,
        current_level: 1,
        current_streak: 1,
        longest_streak: 1,
        total_workouts: 1,
        total_challenges_completed: 0,
        weight_lost_kg: None,
    }
}

/// Count the `user_badges` rows for a (user, badge) pair
pub async fn user_badge_count(db: &Database, user_id: Uuid, badge_id: &str) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM user_badges WHERE user_id = $1 AND badge_id = $2")
            .bind(user_id.to_string())
            .bind(badge_id)
            .fetch_one(db.pool())
            .await?;
    Ok(count)
}
