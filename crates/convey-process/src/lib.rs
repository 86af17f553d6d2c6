// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content processing for captured conversations.
//!
//! Each capture source has a processor that cleans message text, applies
//! source-specific enhancements, and derives metadata, tags, and a summary.
//! Sources without a processor fall back to a stamp-only default.

pub mod pipeline;
pub mod processor;
pub mod registry;
pub mod text;

pub use pipeline::ProcessingPipeline;
pub use processor::{
    ChatGptProcessor, ClaudeProcessor, ContentProcessor, DefaultProcessor, Processor,
    TongyiProcessor, YiyanProcessor,
};
pub use registry::ProcessorRegistry;
