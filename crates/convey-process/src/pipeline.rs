// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Clean, enhance, then extract: the per-record processing pipeline.

use convey_core::types::{ProcessedRecord, Record};
use tracing::{debug, warn};

use crate::processor::ContentProcessor;
use crate::registry::ProcessorRegistry;

/// Runs the three processing phases for a record's source.
#[derive(Debug, Clone, Default)]
pub struct ProcessingPipeline {
    registry: ProcessorRegistry,
}

impl ProcessingPipeline {
    pub fn new(registry: ProcessorRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    /// Process one record. Never fails: unknown sources take the default path.
    pub fn process(&self, record: Record) -> ProcessedRecord {
        let processor = self.registry.resolve(&record.source);
        if processor.is_default() {
            warn!(
                record_id = %record.id,
                source = %record.source,
                "no processor for source, using default"
            );
        }

        let cleaned = processor.clean(record);
        let enhanced = processor.enhance(cleaned);
        let processed = processor.extract_metadata(enhanced);

        debug!(
            record_id = %processed.id(),
            tags = processed.tags.as_ref().map_or(0, Vec::len),
            "record processed"
        );
        processed
    }
}
