// ABOUTME: Database management for the award engine
// ABOUTME: Pool setup, inline migrations, and accessors for the table managers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Maverick Fitness

//! # Database Management
//!
//! This module owns the `SQLite` pool and schema for the award engine's
//! tables: exercises, gamification profiles, personal records, badges, and
//! earned badges. The two uniqueness constraints here are load-bearing for
//! correctness under concurrency: `personal_records(user_id, exercise_id,
//! record_type)` backs the placeholder-row lock pattern, and
//! `user_badges(user_id, badge_id)` backs idempotent badge awarding.

mod badges;
mod exercises;
mod profiles;
mod records;
pub mod transactions;

pub use badges::BadgesManager;
pub use exercises::{Exercise, ExercisesManager};
pub use profiles::ProfilesManager;
pub use records::RecordsManager;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::config::EngineConfig;
use crate::errors::{AppError, AppResult};

pub(crate) fn parse_timestamp(raw: &str) -> AppResult<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| AppError::serialization(format!("invalid timestamp {raw}: {e}")))
}

pub(crate) fn parse_uuid(raw: &str) -> AppResult<uuid::Uuid> {
    uuid::Uuid::parse_str(raw)
        .map_err(|e| AppError::serialization(format!("invalid uuid {raw}: {e}")))
}

/// Database handle for record and badge storage
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if missing) the database and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the pool cannot connect, or a
    /// migration statement fails
    pub async fn new(database_url: &str, config: &EngineConfig) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("failed to connect: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Records manager (`RecordStore`)
    #[must_use]
    pub fn records(&self) -> RecordsManager {
        RecordsManager::new(self.pool.clone())
    }

    /// Badges manager (catalog and earned badges)
    #[must_use]
    pub fn badges(&self) -> BadgesManager {
        BadgesManager::new(self.pool.clone())
    }

    /// Gamification profile manager
    #[must_use]
    pub fn profiles(&self) -> ProfilesManager {
        ProfilesManager::new(self.pool.clone())
    }

    /// Exercise catalog manager
    #[must_use]
    pub fn exercises(&self) -> ExercisesManager {
        ExercisesManager::new(self.pool.clone())
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if a migration statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_exercises().await?;
        self.migrate_profiles().await?;
        self.migrate_records().await?;
        self.migrate_badges().await?;
        Ok(())
    }

    async fn migrate_exercises(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS exercises (
                id TEXT PRIMARY KEY,
                slug TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn migrate_profiles(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS gamification_profiles (
                user_id TEXT PRIMARY KEY,
                total_xp INTEGER NOT NULL DEFAULT 0,
                current_level INTEGER NOT NULL DEFAULT 1,
                current_streak INTEGER NOT NULL DEFAULT 0,
                longest_streak INTEGER NOT NULL DEFAULT 0,
                total_workouts INTEGER NOT NULL DEFAULT 0,
                total_challenges_completed INTEGER NOT NULL DEFAULT 0,
                weight_lost_kg REAL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn migrate_records(&self) -> AppResult<()> {
        // value is NULL for placeholder rows created to carry the row lock
        // before a first record lands
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS personal_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                exercise_id TEXT NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
                record_type TEXT NOT NULL,
                value REAL,
                weight_kg REAL,
                reps INTEGER,
                session_id TEXT,
                achieved_at TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, exercise_id, record_type)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_personal_records_user ON personal_records(user_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn migrate_badges(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS badges (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                rarity TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT true,
                is_hidden BOOLEAN NOT NULL DEFAULT false,
                xp_required INTEGER NOT NULL DEFAULT 0,
                level_required INTEGER NOT NULL DEFAULT 0,
                streak_required INTEGER NOT NULL DEFAULT 0,
                workouts_required INTEGER NOT NULL DEFAULT 0,
                challenges_required INTEGER NOT NULL DEFAULT 0,
                special_requirements TEXT NOT NULL DEFAULT '{}',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_badges (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                badge_id TEXT NOT NULL REFERENCES badges(id) ON DELETE CASCADE,
                earned_at TEXT NOT NULL,
                earned_data TEXT NOT NULL DEFAULT '{}',
                UNIQUE(user_id, badge_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_user_badges_user ON user_badges(user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
