// ABOUTME: Integration tests for the award pipeline against a real database
// ABOUTME: Record monotonicity, idempotent re-evaluation, and badge award rules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Maverick Fitness

mod common;

use anyhow::Result;
use uuid::Uuid;

use maverick_awards::errors::ErrorCode;
use maverick_awards::models::RecordType;

#[tokio::test]
async fn first_entry_sets_records_for_every_type() -> Result<()> {
    let h = common::setup().await?;
    let coordinator = common::coordinator(&h.db);

    let entry = common::strength_entry(h.user_id, h.exercise_id, 100.0, 5);
    let result = coordinator.process(&entry).await?;

    assert_eq!(result.new_records.len(), RecordType::ALL.len());
    assert!(result.new_records.iter().all(|o| o.is_new_record));

    let stored = h
        .db
        .records()
        .get(h.user_id, h.exercise_id, RecordType::MaxWeight)
        .await?
        .expect("record stored");
    assert!((stored.value - 100.0).abs() < f64::EPSILON);
    assert_eq!(stored.session_id, Some(entry.session_id));

    Ok(())
}

#[tokio::test]
async fn sequential_entries_keep_the_maximum() -> Result<()> {
    let h = common::setup().await?;
    let coordinator = common::coordinator(&h.db);

    let second = common::strength_entry(h.user_id, h.exercise_id, 70.0, 1);
    for entry in [
        common::strength_entry(h.user_id, h.exercise_id, 50.0, 1),
        second.clone(),
        common::strength_entry(h.user_id, h.exercise_id, 60.0, 1),
    ] {
        coordinator.process(&entry).await?;
    }

    let stored = h
        .db
        .records()
        .get(h.user_id, h.exercise_id, RecordType::MaxWeight)
        .await?
        .expect("record stored");
    assert!((stored.value - 70.0).abs() < f64::EPSILON);
    assert_eq!(
        stored.session_id,
        Some(second.session_id),
        "record must point at the entry that achieved it"
    );

    Ok(())
}

#[tokio::test]
async fn non_exceeding_entry_changes_nothing() -> Result<()> {
    let h = common::setup().await?;
    let coordinator = common::coordinator(&h.db);

    let first = common::strength_entry(h.user_id, h.exercise_id, 100.0, 5);
    coordinator.process(&first).await?;

    // Identical derived values: a tie is not a new record.
    let tie = common::strength_entry(h.user_id, h.exercise_id, 100.0, 5);
    let result = coordinator.process(&tie).await?;

    assert!(result.new_records.is_empty());
    assert!(result.new_badges.is_empty());

    let stored = h
        .db
        .records()
        .get(h.user_id, h.exercise_id, RecordType::MaxVolume)
        .await?
        .expect("record stored");
    assert_eq!(
        stored.session_id,
        Some(first.session_id),
        "tie must not steal the achieving entry"
    );

    Ok(())
}

#[tokio::test]
async fn first_workout_scenario_awards_catalog_badges() -> Result<()> {
    let h = common::setup().await?;
    h.db.badges().seed_default_badges().await?;
    h.db.profiles()
        .upsert(&common::first_workout_profile(h.user_id))
        .await?;
    let coordinator = common::coordinator(&h.db);

    let entry = common::strength_entry(h.user_id, h.exercise_id, 100.0, 5);
    let result = coordinator.process(&entry).await?;

    let awarded: Vec<&str> = result.new_badges.iter().map(|b| b.id.as_str()).collect();
    assert!(awarded.contains(&"first-workout"), "workouts_required <= 1");
    assert!(awarded.contains(&"first-pr"), "entry set a PR");
    assert!(
        !awarded.contains(&"powerlifter"),
        "50-workout badge out of reach"
    );

    // Earned-data snapshot rides along on the earned badge.
    let earned = h.db.badges().list_user_badges(h.user_id).await?;
    let first_workout = earned
        .iter()
        .find(|ub| ub.badge_id == "first-workout")
        .expect("persisted");
    assert_eq!(first_workout.earned_data["workouts"], 1);

    Ok(())
}

#[tokio::test]
async fn inactive_and_hidden_badges_are_never_awarded() -> Result<()> {
    let h = common::setup().await?;

    let mut retired = common::pr_badge("retired-pr");
    retired.is_active = false;
    h.db.badges().upsert_badge(&retired).await?;

    let mut hidden = common::pr_badge("hidden-pr");
    hidden.is_hidden = true;
    h.db.badges().upsert_badge(&hidden).await?;

    let coordinator = common::coordinator(&h.db);
    let result = coordinator
        .process(&common::strength_entry(h.user_id, h.exercise_id, 100.0, 5))
        .await?;

    assert!(result.new_badges.is_empty());
    assert_eq!(common::user_badge_count(&h.db, h.user_id, "retired-pr").await?, 0);
    assert_eq!(common::user_badge_count(&h.db, h.user_id, "hidden-pr").await?, 0);

    Ok(())
}

#[tokio::test]
async fn earned_badges_are_not_reawarded() -> Result<()> {
    let h = common::setup().await?;
    h.db.badges().upsert_badge(&common::pr_badge("first-pr")).await?;
    let coordinator = common::coordinator(&h.db);

    let result = coordinator
        .process(&common::strength_entry(h.user_id, h.exercise_id, 100.0, 5))
        .await?;
    assert_eq!(result.new_badges.len(), 1);

    // A heavier set is another PR, but the badge is already earned.
    let result = coordinator
        .process(&common::strength_entry(h.user_id, h.exercise_id, 110.0, 5))
        .await?;
    assert!(!result.new_records.is_empty());
    assert!(result.new_badges.is_empty());

    assert_eq!(common::user_badge_count(&h.db, h.user_id, "first-pr").await?, 1);

    Ok(())
}

#[tokio::test]
async fn unknown_exercise_fails_fast_without_side_effects() -> Result<()> {
    let h = common::setup().await?;
    let coordinator = common::coordinator(&h.db);

    let entry = common::strength_entry(h.user_id, Uuid::new_v4(), 100.0, 5);
    let err = coordinator.process(&entry).await.expect_err("must fail");
    assert_eq!(err.code, ErrorCode::InvalidEntry);

    let records = h.db.records().list_for_user(h.user_id).await?;
    assert!(records.is_empty());

    Ok(())
}

#[tokio::test]
async fn nil_user_id_is_rejected() -> Result<()> {
    let h = common::setup().await?;
    let coordinator = common::coordinator(&h.db);

    let entry = common::strength_entry(Uuid::nil(), h.exercise_id, 100.0, 5);
    let err = coordinator.process(&entry).await.expect_err("must fail");
    assert_eq!(err.code, ErrorCode::InvalidEntry);

    Ok(())
}

#[tokio::test]
async fn degenerate_magnitudes_are_no_record_not_an_error() -> Result<()> {
    let h = common::setup().await?;
    let coordinator = common::coordinator(&h.db);

    let entry = common::strength_entry(h.user_id, h.exercise_id, 0.0, 5);
    let result = coordinator.process(&entry).await?;

    assert!(result.new_records.is_empty());
    assert!(result.new_badges.is_empty());
    assert!(h.db.records().list_for_user(h.user_id).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn threshold_badges_track_profile_counters() -> Result<()> {
    let h = common::setup().await?;
    h.db.badges().seed_default_badges().await?;

    let mut profile = common::first_workout_profile(h.user_id);
    profile.current_streak = 7;
    profile.longest_streak = 7;
    profile.total_workouts = 10;
    h.db.profiles().upsert(&profile).await?;

    let coordinator = common::coordinator(&h.db);
    let result = coordinator
        .process(&common::strength_entry(h.user_id, h.exercise_id, 80.0, 8))
        .await?;

    let awarded: Vec<&str> = result.new_badges.iter().map(|b| b.id.as_str()).collect();
    assert!(awarded.contains(&"strength-builder"), "10 workouts");
    assert!(awarded.contains(&"week-warrior"), "7-day streak");
    assert!(awarded.contains(&"getting-started"), "3-day streak");
    assert!(!awarded.contains(&"month-master"), "30-day streak unmet");

    Ok(())
}
