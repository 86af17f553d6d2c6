// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reliable delivery of processed conversations.
//!
//! The [`DeliveryQueue`] drains tasks on a single worker: each task is
//! processed, persisted locally, and delivered to the remote backend, with
//! exponential-backoff retries for delivery failures. [`SyncService`] wires
//! the queue to its collaborators and owns the background timers.

pub mod backoff;
pub mod observer;
pub mod queue;
pub mod remote;
pub mod scheduler;
pub mod service;
pub mod task;

pub use backoff::RetryPolicy;
pub use observer::BroadcastObserver;
pub use queue::DeliveryQueue;
pub use remote::HttpBackend;
pub use scheduler::SyncScheduler;
pub use service::SyncService;
pub use task::DeliveryTask;
