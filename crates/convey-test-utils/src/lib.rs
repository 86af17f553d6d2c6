// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Convey integration tests.
//!
//! Provides in-memory collaborators so the delivery queue and service can be
//! exercised deterministically without SQLite or a network.
//!
//! # Components
//!
//! - [`MemoryStore`] - Local store with a status history and failure injection
//! - [`MockBackend`] - Remote backend with scripted outcomes and an attempt log
//! - [`RecordingObserver`] - Observer sink that keeps every event
//! - [`fixtures`] - Record and message builders

pub mod fixtures;
pub mod memory_store;
pub mod mock_backend;
pub mod recording_observer;

pub use memory_store::MemoryStore;
pub use mock_backend::{Attempt, MockBackend};
pub use recording_observer::RecordingObserver;
