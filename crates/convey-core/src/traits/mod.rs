// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the delivery queue.
//!
//! Stores and backends extend the [`Adapter`] base trait and use
//! `#[async_trait]` so they can be held as `Arc<dyn ...>` trait objects.
//! Observers are synchronous and best-effort.

pub mod adapter;
pub mod backend;
pub mod observer;
pub mod store;

pub use adapter::Adapter;
pub use backend::RemoteBackend;
pub use observer::ObserverSink;
pub use store::LocalStore;
