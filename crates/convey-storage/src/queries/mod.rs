// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions, one module per table plus maintenance.

pub mod maintenance;
pub mod records;
pub mod settings;
pub mod statuses;
