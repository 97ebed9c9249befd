// ABOUTME: Unified error handling for the award engine
// ABOUTME: Defines error codes, the AppError type, and transient-conflict classification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Maverick Fitness

//! # Unified Error Handling
//!
//! This module defines the error surface of the award engine. Every fallible
//! operation returns [`AppResult`], and callers branch on [`ErrorCode`]
//! rather than string matching. The split that matters operationally is
//! transient vs. terminal: transient conflicts (lock contention,
//! serialization failures) are retried internally by the coordinator and
//! only surface as [`ErrorCode::RetryExhausted`] once the retry budget is
//! spent.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Entry references an unknown exercise/user or carries malformed ids
    #[serde(rename = "INVALID_ENTRY")]
    InvalidEntry,
    /// Lock contention or serialization failure; safe to retry
    #[serde(rename = "TRANSIENT_CONFLICT")]
    TransientConflict,
    /// Transient conflicts persisted past the bounded retry budget
    #[serde(rename = "RETRY_EXHAUSTED")]
    RetryExhausted,
    /// Database operation failed for a non-transient reason
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    /// Stored JSON or timestamp data could not be (de)serialized
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError,
    /// Configuration is missing or invalid
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError,
    /// Unexpected internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl ErrorCode {
    /// Human-readable description of the error code
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidEntry => "Performance entry is invalid",
            Self::TransientConflict => "Concurrent transaction conflict",
            Self::RetryExhausted => "Award processing deferred after repeated conflicts",
            Self::DatabaseError => "Database operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal error occurred",
        }
    }
}

/// Unified error type for the award engine
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach a source error for chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Invalid performance entry (non-retryable, fails fast)
    pub fn invalid_entry(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidEntry, message)
    }

    /// Transient conflict that the caller may retry
    pub fn transient_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TransientConflict, message)
    }

    /// Retry budget exhausted; entry was logged but award processing deferred
    #[must_use]
    pub fn retry_exhausted(attempts: u32) -> Self {
        Self::new(
            ErrorCode::RetryExhausted,
            format!("award processing failed after {attempts} attempts"),
        )
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Whether this error is a transient conflict worth retrying.
    ///
    /// Classification mirrors what the underlying drivers actually report:
    /// `SQLite` surfaces writer contention as "database is locked"/"busy",
    /// `PostgreSQL`-style engines as deadlocks and serialization failures.
    /// Constraint violations are never transient: a duplicate badge insert
    /// is an expected outcome handled at the call site, and retrying it
    /// cannot change the result.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        if self.code == ErrorCode::TransientConflict {
            return true;
        }
        if self.code != ErrorCode::DatabaseError {
            return false;
        }

        let text = self
            .source
            .as_ref()
            .map_or_else(|| self.message.clone(), |s| format!("{s}"))
            .to_lowercase();

        if text.contains("unique constraint")
            || text.contains("foreign key constraint")
            || text.contains("check constraint")
            || text.contains("not null constraint")
        {
            return false;
        }

        text.contains("database is locked")
            || text.contains("database is busy")
            || text.contains("busy")
            || text.contains("deadlock")
            || text.contains("timed out")
            || text.contains("timeout")
            || text.contains("serialization failure")
            || text.contains("could not serialize")
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        let message = match &error {
            sqlx::Error::Database(db_err) => db_err.message().to_owned(),
            other => other.to_string(),
        };
        let code = if matches!(error, sqlx::Error::PoolTimedOut) {
            ErrorCode::TransientConflict
        } else {
            ErrorCode::DatabaseError
        };
        Self::new(code, message).with_source(error)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string()).with_source(error)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::InternalError, error.to_string())
    }
}
