// ABOUTME: The transactional award coordinator: detection, evaluation, persistence as one unit
// ABOUTME: Row-lock serialization, bounded retry on conflicts, and post-commit event emission
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Maverick Fitness

//! # Award Coordinator
//!
//! One `process()` call is one short-lived saga over a single database
//! transaction:
//!
//! 1. ensure + read the record rows for every record type of the entry's
//!    exercise (the first write statement serializes concurrent evaluations
//!    of the same tuple),
//! 2. run PR detection against the values read under that serialization,
//! 3. persist improved records,
//! 4. re-read the gamification profile and earned-badge set on the same
//!    transaction,
//! 5. run badge evaluation and insert each qualifying badge with a
//!    conflict-guarded insert,
//! 6. commit, then (and only then) publish events.
//!
//! A transient conflict anywhere aborts the transaction and re-runs the
//! whole saga against the now-committed state, up to the configured attempt
//! budget. A concurrent transaction awarding the same badge first is not a
//! failure: that badge is simply absent from this call's `new_badges`.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::database::transactions::retry_transaction;
use crate::database::{BadgesManager, Database, ProfilesManager, RecordsManager};
use crate::errors::{AppError, AppResult};
use crate::events::{AwardEvent, EventSink};
use crate::models::{AwardResult, PerformanceEntry, Record, RecordType};

use super::{badge_evaluator, pr_detector};

/// Orchestrates PR detection, badge evaluation, and persistence for each
/// newly logged performance entry
pub struct AwardCoordinator {
    db: Database,
    sink: Arc<dyn EventSink>,
    config: EngineConfig,
}

impl AwardCoordinator {
    /// Create a coordinator over the given database and event sink
    #[must_use]
    pub fn new(db: Database, sink: Arc<dyn EventSink>, config: EngineConfig) -> Self {
        Self { db, sink, config }
    }

    /// Process one performance entry: detect records, award badges, emit events.
    ///
    /// Award processing is auxiliary to the entry's own persistence: the
    /// caller must never roll back the logged entry because this returned an
    /// error.
    ///
    /// # Errors
    ///
    /// * `INVALID_ENTRY` if the entry carries a nil user id or references an
    ///   unknown exercise (fails fast, no side effects)
    /// * `RETRY_EXHAUSTED` if transient conflicts persist past the attempt
    ///   budget; the caller should treat this as "award processing deferred"
    pub async fn process(&self, entry: &PerformanceEntry) -> AppResult<AwardResult> {
        self.validate(entry).await?;

        let result = retry_transaction(
            || self.process_once(entry),
            self.config.max_award_attempts,
            self.config.retry_backoff_base_ms,
        )
        .await?;

        info!(
            user_id = %entry.user_id,
            exercise_id = %entry.exercise_id,
            new_records = result.new_records.len(),
            new_badges = result.new_badges.len(),
            "award processing committed"
        );

        self.publish_events(&result, entry.user_id).await;

        Ok(result)
    }

    async fn validate(&self, entry: &PerformanceEntry) -> AppResult<()> {
        if entry.user_id.is_nil() {
            return Err(AppError::invalid_entry("entry has no user id"));
        }
        if !self.db.exercises().exists(entry.exercise_id).await? {
            return Err(AppError::invalid_entry(format!(
                "unknown exercise {}",
                entry.exercise_id
            )));
        }
        Ok(())
    }

    /// One attempt of the saga. Aborting anywhere before the commit rolls
    /// back every write of this attempt.
    async fn process_once(&self, entry: &PerformanceEntry) -> AppResult<AwardResult> {
        let mut tx = self.db.pool().begin().await?;

        // Lock phase: the placeholder insert is the transaction's first
        // write, so two concurrent evaluations for the same user and
        // exercise serialize here and the loser re-reads committed state.
        let mut current: BTreeMap<RecordType, Option<f64>> = BTreeMap::new();
        for record_type in RecordType::ALL {
            let value = RecordsManager::get_or_create_for_update(
                &mut *tx,
                entry.user_id,
                entry.exercise_id,
                record_type,
            )
            .await?;
            current.insert(record_type, value);
        }

        let outcomes = pr_detector::evaluate(entry, &current);

        let mut new_records = Vec::new();
        for outcome in &outcomes {
            if outcome.is_new_record {
                RecordsManager::save(&mut *tx, &Record::from_entry(entry, outcome)).await?;
                new_records.push(outcome.clone());
            }
        }

        let snapshot = ProfilesManager::get_or_create(&mut *tx, entry.user_id).await?;
        let already_earned = BadgesManager::earned_badge_ids(&mut *tx, entry.user_id).await?;
        let catalog = BadgesManager::list_active_badges(&mut *tx).await?;

        let candidates =
            badge_evaluator::evaluate_candidates(&snapshot, &outcomes, &already_earned, &catalog);

        let mut new_badges = Vec::new();
        for badge in candidates {
            let created = BadgesManager::insert_user_badge_if_absent(
                &mut *tx,
                entry.user_id,
                &badge.id,
                &snapshot,
            )
            .await?;
            if created {
                new_badges.push(badge);
            } else {
                // A concurrent transaction won the insert between our
                // earned-set read and now; the invariant holds either way.
                debug!(badge_id = %badge.id, "badge already awarded concurrently");
            }
        }

        tx.commit().await?;

        Ok(AwardResult {
            new_records,
            new_badges,
            snapshot,
        })
    }

    /// Publish events after commit. Failures are logged and swallowed:
    /// notification delivery is best-effort and must never affect the
    /// committed award state.
    async fn publish_events(&self, result: &AwardResult, user_id: Uuid) {
        for outcome in &result.new_records {
            let event = AwardEvent::RecordBroken {
                user_id,
                exercise_id: outcome.exercise_id,
                record_type: outcome.record_type,
                previous_value: outcome.previous_value,
                new_value: outcome.new_value,
            };
            if let Err(e) = self.sink.publish(event).await {
                warn!(error = %e, "failed to publish record_broken event");
            }
        }

        for badge in &result.new_badges {
            let event = AwardEvent::BadgeAwarded {
                user_id,
                badge_id: badge.id.clone(),
                snapshot: result.snapshot.clone(),
            };
            if let Err(e) = self.sink.publish(event).await {
                warn!(error = %e, badge_id = %badge.id, "failed to publish badge_awarded event");
            }
        }
    }
}
