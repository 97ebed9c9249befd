// ABOUTME: Gamification profile storage read as the badge-evaluation snapshot
// ABOUTME: Transactional get-or-create plus the host-facing upsert
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Maverick Fitness

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::ProfileSnapshot;

use super::parse_uuid;

/// Gamification profile storage.
///
/// The award engine only reads profiles; XP, streak, and counter mutation
/// belongs to the host gamification engine, which keeps them current via
/// [`ProfilesManager::upsert`].
pub struct ProfilesManager {
    pool: SqlitePool,
}

impl ProfilesManager {
    /// Create a new profiles manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read a user's profile snapshot on the given transaction, creating a
    /// fresh profile row on first touch
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails
    pub async fn get_or_create(
        conn: &mut SqliteConnection,
        user_id: Uuid,
    ) -> AppResult<ProfileSnapshot> {
        sqlx::query(
            r"
            INSERT INTO gamification_profiles (user_id)
            VALUES ($1)
            ON CONFLICT(user_id) DO NOTHING
            ",
        )
        .bind(user_id.to_string())
        .execute(&mut *conn)
        .await?;

        let row = sqlx::query(
            r"
            SELECT user_id, total_xp, current_level, current_streak, longest_streak,
                   total_workouts, total_challenges_completed, weight_lost_kg
            FROM gamification_profiles
            WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_one(&mut *conn)
        .await?;

        Self::row_to_snapshot(&row)
    }

    /// Write a user's current stats. Called by the host engine, and by tests
    /// arranging threshold scenarios.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn upsert(&self, snapshot: &ProfileSnapshot) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO gamification_profiles
                (user_id, total_xp, current_level, current_streak, longest_streak,
                 total_workouts, total_challenges_completed, weight_lost_kg, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT(user_id) DO UPDATE SET
                total_xp = excluded.total_xp,
                current_level = excluded.current_level,
                current_streak = excluded.current_streak,
                longest_streak = excluded.longest_streak,
                total_workouts = excluded.total_workouts,
                total_challenges_completed = excluded.total_challenges_completed,
                weight_lost_kg = excluded.weight_lost_kg,
                updated_at = excluded.updated_at
            ",
        )
        .bind(snapshot.user_id.to_string())
        .bind(snapshot.total_xp)
        .bind(snapshot.current_level)
        .bind(snapshot.current_streak)
        .bind(snapshot.longest_streak)
        .bind(snapshot.total_workouts)
        .bind(snapshot.total_challenges_completed)
        .bind(snapshot.weight_lost_kg)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Read a profile outside the award path, if it exists
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get(&self, user_id: Uuid) -> AppResult<Option<ProfileSnapshot>> {
        let row = sqlx::query(
            r"
            SELECT user_id, total_xp, current_level, current_streak, longest_streak,
                   total_workouts, total_challenges_completed, weight_lost_kg
            FROM gamification_profiles
            WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::row_to_snapshot(&r)).transpose()
    }

    fn row_to_snapshot(row: &SqliteRow) -> AppResult<ProfileSnapshot> {
        let user_id: String = row.try_get("user_id")?;

        Ok(ProfileSnapshot {
            user_id: parse_uuid(&user_id)?,
            total_xp: row.try_get("total_xp")?,
            current_level: row.try_get("current_level")?,
            current_streak: row.try_get("current_streak")?,
            longest_streak: row.try_get("longest_streak")?,
            total_workouts: row.try_get("total_workouts")?,
            total_challenges_completed: row.try_get("total_challenges_completed")?,
            weight_lost_kg: row.try_get("weight_lost_kg")?,
        })
    }
}
