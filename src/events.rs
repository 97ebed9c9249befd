// ABOUTME: Award events and the EventSink collaborator interface
// ABOUTME: Broadcast-based in-process sink for notification and activity-feed consumers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Maverick Fitness

//! Award events
//!
//! The coordinator publishes events strictly after its transaction commits,
//! so a slow or failing sink can never hold row locks or roll back awarded
//! state. Delivery is at-most-once: the engine does not retry notification
//! delivery, and a user without a registered subscriber simply misses the
//! event.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{ProfileSnapshot, RecordType};

/// Buffered events per subscriber before the oldest are dropped
const BROADCAST_CHANNEL_SIZE: usize = 64;

/// An event emitted after a successful award transaction
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AwardEvent {
    /// A stored personal record was beaten
    RecordBroken {
        /// Owning user
        user_id: Uuid,
        /// Exercise the record is held on
        exercise_id: Uuid,
        /// Metric the record tracks
        record_type: RecordType,
        /// Previous best, if one existed
        previous_value: Option<f64>,
        /// New best value
        new_value: f64,
    },
    /// A badge was awarded for the first time
    BadgeAwarded {
        /// Owning user
        user_id: Uuid,
        /// Earned badge id
        badge_id: String,
        /// Stats snapshot at the time of earning
        snapshot: ProfileSnapshot,
    },
}

impl AwardEvent {
    /// The user this event concerns
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        match self {
            Self::RecordBroken { user_id, .. } | Self::BadgeAwarded { user_id, .. } => *user_id,
        }
    }
}

/// Consumer of award events (notification/activity-feed subsystem)
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publish one event.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot accept the event. The coordinator
    /// logs such failures and continues; committed state is never affected.
    async fn publish(&self, event: AwardEvent) -> AppResult<()>;
}

/// Sink that discards all events, for hosts without consumers and for tests
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

#[async_trait]
impl EventSink for NullEventSink {
    async fn publish(&self, _event: AwardEvent) -> AppResult<()> {
        Ok(())
    }
}

/// In-process broadcast sink for per-user event subscribers.
///
/// Consumers register a receiver per user; events for users without a
/// registered receiver are dropped.
#[derive(Clone, Default)]
pub struct BroadcastEventSink {
    subscribers: Arc<RwLock<HashMap<Uuid, broadcast::Sender<AwardEvent>>>>,
}

impl BroadcastEventSink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber for a user's events
    pub async fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<AwardEvent> {
        let mut subscribers = self.subscribers.write().await;
        if let Some(sender) = subscribers.get(&user_id) {
            return sender.subscribe();
        }
        let (tx, rx) = broadcast::channel(BROADCAST_CHANNEL_SIZE);
        subscribers.insert(user_id, tx);
        tracing::debug!(user_id = %user_id, "award event subscriber registered");
        rx
    }

    /// Remove a user's subscriber channel
    pub async fn unsubscribe(&self, user_id: Uuid) {
        self.subscribers.write().await.remove(&user_id);
        tracing::debug!(user_id = %user_id, "award event subscriber removed");
    }
}

#[async_trait]
impl EventSink for BroadcastEventSink {
    async fn publish(&self, event: AwardEvent) -> AppResult<()> {
        let subscribers = self.subscribers.read().await;
        if let Some(sender) = subscribers.get(&event.user_id()) {
            sender
                .send(event)
                .map_err(|e| AppError::internal(format!("no live receivers: {e}")))?;
        }
        Ok(())
    }
}
