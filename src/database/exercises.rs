// ABOUTME: Exercise catalog storage, the referential target for entry validation
// ABOUTME: Registration and lookup of exercises by id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Maverick Fitness

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::AppResult;

/// A catalog exercise
#[derive(Debug, Clone)]
pub struct Exercise {
    /// Exercise id
    pub id: Uuid,
    /// URL-safe unique slug
    pub slug: String,
    /// Human label
    pub name: String,
}

/// Exercise catalog storage
pub struct ExercisesManager {
    pool: SqlitePool,
}

impl ExercisesManager {
    /// Create a new exercises manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register an exercise, returning its id
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (e.g. duplicate slug)
    pub async fn register(&self, slug: &str, name: &str) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO exercises (id, slug, name) VALUES ($1, $2, $3)")
            .bind(id.to_string())
            .bind(slug)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    /// Look up an exercise by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get(&self, id: Uuid) -> AppResult<Option<Exercise>> {
        let row = sqlx::query("SELECT id, slug, name FROM exercises WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| {
            let raw_id: String = r.try_get("id")?;
            Ok(Exercise {
                id: super::parse_uuid(&raw_id)?,
                slug: r.try_get("slug")?,
                name: r.try_get("name")?,
            })
        })
        .transpose()
    }

    /// Whether an exercise exists
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn exists(&self, id: Uuid) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exercises WHERE id = $1")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}
