// ABOUTME: Main library entry point for the Maverick award engine
// ABOUTME: Exposes personal-record detection, badge evaluation, and the race-safe award coordinator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Maverick Fitness

#![deny(unsafe_code)]

//! # Maverick Awards
//!
//! A race-safe personal-record (PR) detection and badge awarding engine for
//! the Maverick fitness platform. The engine is a library with no network
//! surface: the host's workout-logging pipeline invokes it in-process
//! whenever a new strength set is persisted, and the engine decides, inside
//! a single database transaction, whether the set breaks a stored record
//! and which badges the user newly qualifies for.
//!
//! ## Guarantees
//!
//! - **No lost records**: for any interleaving of concurrent submissions,
//!   the stored record for a (user, exercise, record-type) tuple converges
//!   to the maximum derived value. Every evaluation re-reads the committed
//!   row before comparing.
//! - **At most one badge per (user, badge)**: award persistence is an atomic
//!   insert-or-detect-duplicate backed by a unique constraint, never a
//!   check-then-insert. A concurrent duplicate is reported as "already
//!   earned", not as an error.
//! - **Events after commit**: `record_broken` and `badge_awarded` events are
//!   published to the [`events::EventSink`] collaborator only once the
//!   transaction has committed, so no locks are held during notification I/O
//!   and a failing sink can never roll back awarded state.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use maverick_awards::config::EngineConfig;
//! use maverick_awards::database::Database;
//! use maverick_awards::engine::AwardCoordinator;
//! use maverick_awards::events::NullEventSink;
//!
//! # async fn run() -> maverick_awards::errors::AppResult<()> {
//! let config = EngineConfig::from_env();
//! let db = Database::new("sqlite:awards.db", &config).await?;
//! db.badges().seed_default_badges().await?;
//!
//! let coordinator = AwardCoordinator::new(db, Arc::new(NullEventSink), config);
//! // let result = coordinator.process(&entry).await?;
//! # Ok(())
//! # }
//! ```

/// Engine configuration and badge catalog loading
pub mod config;

/// Database access layer: records, badges, profiles, and exercises
pub mod database;

/// PR detection, badge evaluation, and the award coordinator
pub mod engine;

/// Unified error handling: error codes, `AppError`, and `AppResult`
pub mod errors;

/// Award events and the `EventSink` collaborator interface
pub mod events;

/// Structured logging configuration built on `tracing`
pub mod logging;

/// Strength metric formulas (estimated one-rep max, set volume)
pub mod metrics;

/// Domain types: entries, records, badges, profiles
pub mod models;

pub use engine::{AwardCoordinator, AwardResult};
pub use errors::{AppError, AppResult};
