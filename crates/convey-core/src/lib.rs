// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Convey ingestion pipeline.
//!
//! This crate provides the data model, the error taxonomy, and the
//! collaborator traits (local store, remote backend, observer sink) that the
//! processing pipeline and delivery queue are written against.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ConveyError;
pub use types::{
    AdapterType, ContentType, DeliveryOutcome, DeliveryStatus, HealthStatus, Message, Metadata,
    OriginContext, ProcessedRecord, Record, Role, StorageInfo, SyncEvent, SyncEventKind,
    SyncSettings, SyncState,
};

pub use traits::{Adapter, LocalStore, ObserverSink, RemoteBackend};
