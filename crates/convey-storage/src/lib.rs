// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite local store for the Convey ingestion pipeline.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single
//! connection thread via `tokio-rusqlite`, and typed queries for processed
//! records, delivery statuses, and stored sync settings.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::Database;
