// ABOUTME: Personal-record store: the one contended table in the award pipeline
// ABOUTME: Placeholder-insert lock acquisition, record updates, and read queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Maverick Fitness

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{Record, RecordType};

use super::{parse_timestamp, parse_uuid};

/// Store of best-known performance per (user, exercise, record-type).
///
/// The transactional entry points take a `&mut SqliteConnection` so they run
/// on the coordinator's open transaction; the `&self` methods are plain
/// pool reads for callers outside the award path.
pub struct RecordsManager {
    pool: SqlitePool,
}

impl RecordsManager {
    /// Create a new records manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Ensure a row exists for the tuple and return the current best value.
    ///
    /// The insert is the first write of the award transaction: it reserves
    /// the database writer slot, so two concurrent evaluations for the same
    /// tuple serialize here: the second waits (or retries on busy) and then
    /// reads the first's committed value. A freshly created placeholder has
    /// no value yet and reads back as `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails; writer contention surfaces as a
    /// transient conflict for the retry layer
    pub async fn get_or_create_for_update(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        exercise_id: Uuid,
        record_type: RecordType,
    ) -> AppResult<Option<f64>> {
        sqlx::query(
            r"
            INSERT INTO personal_records (user_id, exercise_id, record_type)
            VALUES ($1, $2, $3)
            ON CONFLICT(user_id, exercise_id, record_type) DO NOTHING
            ",
        )
        .bind(user_id.to_string())
        .bind(exercise_id.to_string())
        .bind(record_type.as_str())
        .execute(&mut *conn)
        .await?;

        let value: Option<Option<f64>> = sqlx::query_scalar(
            r"
            SELECT value FROM personal_records
            WHERE user_id = $1 AND exercise_id = $2 AND record_type = $3
            ",
        )
        .bind(user_id.to_string())
        .bind(exercise_id.to_string())
        .bind(record_type.as_str())
        .fetch_optional(&mut *conn)
        .await?;

        Ok(value.flatten())
    }

    /// Persist an improved record onto its (already locked) row
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails or no row exists for the tuple
    pub async fn save(conn: &mut SqliteConnection, record: &Record) -> AppResult<()> {
        let updated = sqlx::query(
            r"
            UPDATE personal_records
            SET value = $1, weight_kg = $2, reps = $3, session_id = $4, achieved_at = $5
            WHERE user_id = $6 AND exercise_id = $7 AND record_type = $8
            ",
        )
        .bind(record.value)
        .bind(record.weight_kg)
        .bind(record.reps)
        .bind(record.session_id.map(|id| id.to_string()))
        .bind(record.achieved_at.to_rfc3339())
        .bind(record.user_id.to_string())
        .bind(record.exercise_id.to_string())
        .bind(record.record_type.as_str())
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AppError::internal(format!(
                "no record row for {}/{}/{}",
                record.user_id, record.exercise_id, record.record_type
            )));
        }

        Ok(())
    }

    /// Get the stored record for a tuple, if one has been achieved
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get(
        &self,
        user_id: Uuid,
        exercise_id: Uuid,
        record_type: RecordType,
    ) -> AppResult<Option<Record>> {
        let row = sqlx::query(
            r"
            SELECT user_id, exercise_id, record_type, value, weight_kg, reps,
                   session_id, achieved_at
            FROM personal_records
            WHERE user_id = $1 AND exercise_id = $2 AND record_type = $3
              AND value IS NOT NULL
            ",
        )
        .bind(user_id.to_string())
        .bind(exercise_id.to_string())
        .bind(record_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::row_to_record(&r)).transpose()
    }

    /// List all achieved records for a user, most recent first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Record>> {
        let rows = sqlx::query(
            r"
            SELECT user_id, exercise_id, record_type, value, weight_kg, reps,
                   session_id, achieved_at
            FROM personal_records
            WHERE user_id = $1 AND value IS NOT NULL
            ORDER BY achieved_at DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_record).collect()
    }

    fn row_to_record(row: &SqliteRow) -> AppResult<Record> {
        let user_id: String = row.try_get("user_id")?;
        let exercise_id: String = row.try_get("exercise_id")?;
        let record_type: String = row.try_get("record_type")?;
        let session_id: Option<String> = row.try_get("session_id")?;
        let achieved_at: String = row.try_get("achieved_at")?;

        Ok(Record {
            user_id: parse_uuid(&user_id)?,
            exercise_id: parse_uuid(&exercise_id)?,
            record_type: record_type.parse()?,
            value: row.try_get("value")?,
            weight_kg: row.try_get("weight_kg")?,
            reps: row.try_get("reps")?,
            session_id: session_id.as_deref().map(parse_uuid).transpose()?,
            achieved_at: parse_timestamp(&achieved_at)?,
        })
    }
}
