// ABOUTME: Badge catalog storage and the earned-badge (user_badges) table
// ABOUTME: Conflict-guarded award insert backing the at-most-one-badge invariant
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Maverick Fitness

use std::collections::HashSet;

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::config::default_badges;
use crate::errors::AppResult;
use crate::models::{
    parse_special_requirements, special_requirements_to_json, BadgeDefinition, ProfileSnapshot,
    UserBadge,
};

use super::{parse_timestamp, parse_uuid};

/// Badge catalog and earned-badge storage
pub struct BadgesManager {
    pool: SqlitePool,
}

impl BadgesManager {
    /// Create a new badges manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or update a badge definition in the catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn upsert_badge(&self, badge: &BadgeDefinition) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO badges (id, name, description, category, rarity, is_active, is_hidden,
                                xp_required, level_required, streak_required, workouts_required,
                                challenges_required, special_requirements)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                category = excluded.category,
                rarity = excluded.rarity,
                is_active = excluded.is_active,
                is_hidden = excluded.is_hidden,
                xp_required = excluded.xp_required,
                level_required = excluded.level_required,
                streak_required = excluded.streak_required,
                workouts_required = excluded.workouts_required,
                challenges_required = excluded.challenges_required,
                special_requirements = excluded.special_requirements
            ",
        )
        .bind(&badge.id)
        .bind(&badge.name)
        .bind(&badge.description)
        .bind(badge.category.as_str())
        .bind(badge.rarity.as_str())
        .bind(badge.is_active)
        .bind(badge.is_hidden)
        .bind(badge.xp_required)
        .bind(badge.level_required)
        .bind(badge.streak_required)
        .bind(badge.workouts_required)
        .bind(badge.challenges_required)
        .bind(special_requirements_to_json(&badge.special_requirements).to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Seed the platform's default badge catalog.
    ///
    /// Existing rows win: an operator's edits to a seeded badge are not
    /// overwritten on restart.
    ///
    /// # Errors
    ///
    /// Returns an error if an insert fails
    pub async fn seed_default_badges(&self) -> AppResult<Vec<String>> {
        let mut created = Vec::new();
        for badge in default_badges() {
            let inserted = sqlx::query(
                r"
                INSERT INTO badges (id, name, description, category, rarity, is_active, is_hidden,
                                    xp_required, level_required, streak_required, workouts_required,
                                    challenges_required, special_requirements)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                ON CONFLICT(id) DO NOTHING
                ",
            )
            .bind(&badge.id)
            .bind(&badge.name)
            .bind(&badge.description)
            .bind(badge.category.as_str())
            .bind(badge.rarity.as_str())
            .bind(badge.is_active)
            .bind(badge.is_hidden)
            .bind(badge.xp_required)
            .bind(badge.level_required)
            .bind(badge.streak_required)
            .bind(badge.workouts_required)
            .bind(badge.challenges_required)
            .bind(special_requirements_to_json(&badge.special_requirements).to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();

            if inserted > 0 {
                created.push(badge.id);
            }
        }
        Ok(created)
    }

    /// List badges eligible for awarding (active and not hidden), on the
    /// given transaction for a consistent view
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_active_badges(
        conn: &mut SqliteConnection,
    ) -> AppResult<Vec<BadgeDefinition>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, description, category, rarity, is_active, is_hidden,
                   xp_required, level_required, streak_required, workouts_required,
                   challenges_required, special_requirements
            FROM badges
            WHERE is_active = true AND is_hidden = false
            ",
        )
        .fetch_all(&mut *conn)
        .await?;

        rows.iter().map(Self::row_to_badge).collect()
    }

    /// List the full catalog, including retired and hidden badges
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_all_badges(&self) -> AppResult<Vec<BadgeDefinition>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, description, category, rarity, is_active, is_hidden,
                   xp_required, level_required, streak_required, workouts_required,
                   challenges_required, special_requirements
            FROM badges
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_badge).collect()
    }

    /// Ids of badges the user has already earned, on the given transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn earned_badge_ids(
        conn: &mut SqliteConnection,
        user_id: Uuid,
    ) -> AppResult<HashSet<String>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT badge_id FROM user_badges WHERE user_id = $1")
                .bind(user_id.to_string())
                .fetch_all(&mut *conn)
                .await?;

        Ok(ids.into_iter().collect())
    }

    /// Award a badge if the (user, badge) pair does not exist yet.
    ///
    /// This is the atomic insert-or-detect-duplicate primitive the badge
    /// uniqueness invariant rests on: the unique constraint decides, and a
    /// conflict from a concurrent transaction reads as "already awarded"
    /// (`false`), never as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails for a reason other than the
    /// uniqueness conflict
    pub async fn insert_user_badge_if_absent(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        badge_id: &str,
        snapshot: &ProfileSnapshot,
    ) -> AppResult<bool> {
        let inserted = sqlx::query(
            r"
            INSERT INTO user_badges (user_id, badge_id, earned_at, earned_data)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(user_id, badge_id) DO NOTHING
            ",
        )
        .bind(user_id.to_string())
        .bind(badge_id)
        .bind(Utc::now().to_rfc3339())
        .bind(snapshot.earned_data().to_string())
        .execute(&mut *conn)
        .await?
        .rows_affected();

        Ok(inserted > 0)
    }

    /// List a user's earned badges, most recent first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_user_badges(&self, user_id: Uuid) -> AppResult<Vec<UserBadge>> {
        let rows = sqlx::query(
            r"
            SELECT user_id, badge_id, earned_at, earned_data
            FROM user_badges
            WHERE user_id = $1
            ORDER BY earned_at DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_user_badge).collect()
    }

    fn row_to_badge(row: &SqliteRow) -> AppResult<BadgeDefinition> {
        let category: String = row.try_get("category")?;
        let rarity: String = row.try_get("rarity")?;
        let special_requirements: String = row.try_get("special_requirements")?;

        Ok(BadgeDefinition {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category: category.parse()?,
            rarity: rarity.parse()?,
            is_active: row.try_get("is_active")?,
            is_hidden: row.try_get("is_hidden")?,
            xp_required: row.try_get("xp_required")?,
            level_required: row.try_get("level_required")?,
            streak_required: row.try_get("streak_required")?,
            workouts_required: row.try_get("workouts_required")?,
            challenges_required: row.try_get("challenges_required")?,
            special_requirements: parse_special_requirements(&special_requirements)?,
        })
    }

    fn row_to_user_badge(row: &SqliteRow) -> AppResult<UserBadge> {
        let user_id: String = row.try_get("user_id")?;
        let earned_at: String = row.try_get("earned_at")?;
        let earned_data: String = row.try_get("earned_data")?;

        Ok(UserBadge {
            user_id: parse_uuid(&user_id)?,
            badge_id: row.try_get("badge_id")?,
            earned_at: parse_timestamp(&earned_at)?,
            earned_data: serde_json::from_str(&earned_data)?,
        })
    }
}
