// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source-identifier lookup table for processors.

use std::collections::HashMap;

use crate::processor::{
    ChatGptProcessor, ClaudeProcessor, DefaultProcessor, Processor, TongyiProcessor,
    YiyanProcessor,
};

/// Fixed mapping from source identifier to processor.
///
/// Built once at construction; there is no runtime registration.
#[derive(Debug, Clone)]
pub struct ProcessorRegistry {
    processors: HashMap<&'static str, Processor>,
    fallback: Processor,
}

impl ProcessorRegistry {
    /// Registry with a processor for every built-in source.
    pub fn builtin() -> Self {
        Self::from_processors([
            Processor::ChatGpt(ChatGptProcessor),
            Processor::Claude(ClaudeProcessor),
            Processor::Yiyan(YiyanProcessor),
            Processor::Tongyi(TongyiProcessor),
        ])
    }

    /// Registry containing only the given processors.
    ///
    /// Processors without a source (the default variant) are ignored.
    pub fn from_processors(processors: impl IntoIterator<Item = Processor>) -> Self {
        let processors = processors
            .into_iter()
            .filter_map(|p| p.source().map(|source| (source, p)))
            .collect();
        Self {
            processors,
            fallback: Processor::Default(DefaultProcessor),
        }
    }

    /// Processor registered for `source`, or the stamp-only default.
    pub fn resolve(&self, source: &str) -> &Processor {
        self.processors.get(source).unwrap_or(&self.fallback)
    }

    pub fn is_registered(&self, source: &str) -> bool {
        self.processors.contains_key(source)
    }

    /// Registered source identifiers, sorted.
    pub fn sources(&self) -> Vec<&'static str> {
        let mut sources: Vec<_> = self.processors.keys().copied().collect();
        sources.sort_unstable();
        sources
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convey_core::types::BUILTIN_SOURCES;

    #[test]
    fn builtin_registers_every_source() {
        let registry = ProcessorRegistry::builtin();
        for source in BUILTIN_SOURCES {
            assert!(registry.is_registered(source), "{source} missing");
            assert_eq!(registry.resolve(source).source(), Some(source));
        }
        assert_eq!(registry.sources().len(), 4);
    }

    #[test]
    fn unknown_source_resolves_to_default() {
        let registry = ProcessorRegistry::builtin();
        assert!(registry.resolve("Gemini").is_default());
        assert!(registry.resolve("").is_default());
        assert!(registry.resolve("chatgpt").is_default());
    }

    #[test]
    fn partial_registry_falls_back_for_missing_sources() {
        let registry = ProcessorRegistry::from_processors([
            Processor::Claude(ClaudeProcessor),
            Processor::Default(DefaultProcessor),
        ]);
        assert_eq!(registry.sources(), vec!["Claude"]);
        assert!(registry.resolve("ChatGPT").is_default());
    }
}
