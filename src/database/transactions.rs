// ABOUTME: Retry machinery for transactions that hit transient database conflicts
// ABOUTME: Exponential backoff around lock contention and serialization failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Maverick Fitness

//! Transaction retry with exponential backoff
//!
//! `SQLite` surfaces concurrent-writer contention as "database is locked" /
//! busy errors; a fresh attempt against the now-committed state usually
//! succeeds, and re-running the whole evaluation is exactly what the award
//! pipeline wants (the second writer must see the first writer's record).
//! Non-transient errors (constraint violations, invalid data) propagate
//! immediately without retry.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, warn};

use crate::errors::{AppError, AppResult};

/// Retry an operation while it fails with transient conflicts.
///
/// Backoff doubles per attempt starting from `backoff_base_ms`
/// (10ms → 20ms → 40ms with the defaults). Once `max_attempts` is spent the
/// last conflict is wrapped in a `RETRY_EXHAUSTED` error; the caller should
/// treat that as "entry was logged, award processing deferred".
///
/// # Errors
///
/// * The original error, immediately, when it is not transient
/// * `RETRY_EXHAUSTED` after `max_attempts` transient failures
pub async fn retry_transaction<F, Fut, T>(
    mut f: F,
    max_attempts: u32,
    backoff_base_ms: u64,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempts = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempts += 1;

                if !e.is_transient() {
                    error!(
                        attempts = attempts,
                        error = %e,
                        "transaction failed with non-retryable error"
                    );
                    return Err(e);
                }

                if attempts >= max_attempts {
                    error!(
                        attempts = attempts,
                        max_attempts = max_attempts,
                        error = %e,
                        "transaction failed after max retries"
                    );
                    return Err(AppError::retry_exhausted(attempts).with_source(e));
                }

                let backoff_ms = backoff_base_ms * (1 << attempts);
                warn!(
                    attempt = attempts,
                    max_attempts = max_attempts,
                    backoff_ms = backoff_ms,
                    error = %e,
                    "transient conflict, retrying after backoff"
                );
                sleep(Duration::from_millis(backoff_ms)).await;
            }
        }
    }
}
