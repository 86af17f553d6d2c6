// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unit of work owned by the delivery queue.

use chrono::{DateTime, Utc};
use convey_core::{OriginContext, Record};

/// One persist-and-deliver cycle for a record, including its retries.
///
/// Created on enqueue and dropped on terminal success, terminal failure, or
/// when a newer capture of the same record supersedes it.
#[derive(Debug, Clone)]
pub struct DeliveryTask {
    pub id: String,
    pub record: Record,
    pub origin: Option<OriginContext>,
    pub enqueued_at: DateTime<Utc>,
    pub retry_count: u32,
    /// Capture generation for `record.id`; older generations are superseded.
    pub(crate) generation: u64,
}

impl DeliveryTask {
    pub(crate) fn new(record: Record, origin: Option<OriginContext>, generation: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            record,
            origin,
            enqueued_at: Utc::now(),
            retry_count: 0,
            generation,
        }
    }

    pub fn record_id(&self) -> &str {
        &self.record.id
    }

    /// The same task, counted as one more retry and re-stamped for the tail of the queue.
    pub(crate) fn into_retry(self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            enqueued_at: Utc::now(),
            ..self
        }
    }
}
