// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Processor variants and the capability trait they share.
//!
//! [`ContentProcessor`] carries the base behavior for all three phases as
//! default methods. Each source variant overrides only the phases it needs,
//! and [`Processor`] dispatches to the variants with a plain `match`.

use convey_core::types::{
    ContentType, Metadata, ProcessedRecord, Record, Role, SOURCE_CHATGPT, SOURCE_CLAUDE,
    SOURCE_TONGYI, SOURCE_YIYAN,
};
use serde_json::Value;

use crate::text;

/// The three processing phases, each overridable per source.
pub trait ContentProcessor {
    /// Normalize message text. Overrides must still apply the base cleanup.
    fn clean(&self, record: Record) -> Record {
        map_contents(record, |content| text::clean_content(content))
    }

    /// Source-specific content transformation. Identity by default.
    fn enhance(&self, record: Record) -> Record {
        record
    }

    /// Derive metadata, tags, and a summary.
    fn extract_metadata(&self, record: Record) -> ProcessedRecord {
        base_extract(record)
    }
}

/// Apply `f` to the content of every message.
pub fn map_contents(mut record: Record, f: impl Fn(&str) -> String) -> Record {
    for message in &mut record.messages {
        message.content = f(&message.content);
    }
    record
}

/// Base metadata extraction shared by every registered processor.
///
/// Entries from the record's own metadata are carried over; the derived keys
/// below replace any entry of the same name.
pub fn base_extract(mut record: Record) -> ProcessedRecord {
    let messages = &record.messages;
    let count = |role: Role| messages.iter().filter(|m| m.role == role).count();
    let has_type = |ty: ContentType| messages.iter().any(|m| m.content_type == ty);

    let derived = [
        ("messageCount", Value::from(messages.len())),
        ("userMessageCount", count(Role::User).into()),
        ("assistantMessageCount", count(Role::Assistant).into()),
        ("systemMessageCount", count(Role::System).into()),
        ("hasCode", has_type(ContentType::Code).into()),
        ("hasImages", has_type(ContentType::Image).into()),
        ("estimatedTokens", text::estimate_tokens(messages).into()),
    ];
    let tags = text::extract_tags(messages);
    let summary = text::summarize(messages, &record.title);

    let mut metadata = record.metadata.take().unwrap_or_default();
    for (key, value) in derived {
        metadata.insert(key.to_string(), value);
    }
    record.metadata = Some(metadata);

    ProcessedRecord {
        tags: Some(tags),
        summary: Some(summary),
        ..ProcessedRecord::stamped(record)
    }
}

fn extend_metadata(processed: &mut ProcessedRecord, key: &str, value: Value) {
    processed
        .record
        .metadata
        .get_or_insert_with(Metadata::new)
        .insert(key.to_string(), value);
}

/// Stamp-only processing used for sources without a registered processor.
///
/// Messages and metadata pass through untouched; no tags or summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProcessor;

impl ContentProcessor for DefaultProcessor {
    fn clean(&self, record: Record) -> Record {
        record
    }

    fn extract_metadata(&self, record: Record) -> ProcessedRecord {
        ProcessedRecord::stamped(record)
    }
}

/// ChatGPT: untagged opening code fences are labelled `plaintext`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatGptProcessor;

impl ContentProcessor for ChatGptProcessor {
    fn enhance(&self, mut record: Record) -> Record {
        for message in &mut record.messages {
            if message.content_type == ContentType::Code || message.content.contains("```") {
                message.content = text::tag_untyped_fences(&message.content);
            }
        }
        record
    }
}

/// Claude: flags conversations that mention artifacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaudeProcessor;

impl ContentProcessor for ClaudeProcessor {
    fn extract_metadata(&self, record: Record) -> ProcessedRecord {
        let has_artifacts = record
            .messages
            .iter()
            .any(|m| m.content.contains("artifact"));
        let mut processed = base_extract(record);
        extend_metadata(&mut processed, "hasArtifacts", has_artifacts.into());
        processed
    }
}

/// Full-width placeholder tokens and their ASCII-bracket forms.
const YIYAN_PLACEHOLDERS: &[(&str, &str)] = &[("【图片】", "[图片]"), ("【语音】", "[语音]")];

/// 文心一言: normalizes image and voice placeholders after the base cleanup.
#[derive(Debug, Clone, Copy, Default)]
pub struct YiyanProcessor;

impl ContentProcessor for YiyanProcessor {
    fn clean(&self, record: Record) -> Record {
        map_contents(record, |content| {
            YIYAN_PLACEHOLDERS
                .iter()
                .fold(text::clean_content(content), |acc, (from, to)| {
                    acc.replace(from, to)
                })
        })
    }
}

/// 通义千问: surfaces web-search and plugin usage from record metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct TongyiProcessor;

impl TongyiProcessor {
    fn has_feature(record: &Record, feature: &str) -> bool {
        record
            .metadata
            .as_ref()
            .and_then(|m| m.get("features"))
            .and_then(Value::as_array)
            .is_some_and(|features| features.iter().any(|f| f.as_str() == Some(feature)))
    }
}

impl ContentProcessor for TongyiProcessor {
    fn extract_metadata(&self, record: Record) -> ProcessedRecord {
        let web_search = Self::has_feature(&record, "web-search");
        let plugins = Self::has_feature(&record, "plugins");
        let mut processed = base_extract(record);
        extend_metadata(&mut processed, "hasWebSearch", web_search.into());
        extend_metadata(&mut processed, "hasPlugins", plugins.into());
        processed
    }
}

/// Every processor variant, dispatched statically.
#[derive(Debug, Clone, Copy)]
pub enum Processor {
    ChatGpt(ChatGptProcessor),
    Claude(ClaudeProcessor),
    Yiyan(YiyanProcessor),
    Tongyi(TongyiProcessor),
    Default(DefaultProcessor),
}

impl Processor {
    /// The source this processor is registered under, if any.
    pub fn source(&self) -> Option<&'static str> {
        match self {
            Processor::ChatGpt(_) => Some(SOURCE_CHATGPT),
            Processor::Claude(_) => Some(SOURCE_CLAUDE),
            Processor::Yiyan(_) => Some(SOURCE_YIYAN),
            Processor::Tongyi(_) => Some(SOURCE_TONGYI),
            Processor::Default(_) => None,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Processor::Default(_))
    }
}

impl ContentProcessor for Processor {
    fn clean(&self, record: Record) -> Record {
        match self {
            Processor::ChatGpt(p) => p.clean(record),
            Processor::Claude(p) => p.clean(record),
            Processor::Yiyan(p) => p.clean(record),
            Processor::Tongyi(p) => p.clean(record),
            Processor::Default(p) => p.clean(record),
        }
    }

    fn enhance(&self, record: Record) -> Record {
        match self {
            Processor::ChatGpt(p) => p.enhance(record),
            Processor::Claude(p) => p.enhance(record),
            Processor::Yiyan(p) => p.enhance(record),
            Processor::Tongyi(p) => p.enhance(record),
            Processor::Default(p) => p.enhance(record),
        }
    }

    fn extract_metadata(&self, record: Record) -> ProcessedRecord {
        match self {
            Processor::ChatGpt(p) => p.extract_metadata(record),
            Processor::Claude(p) => p.extract_metadata(record),
            Processor::Yiyan(p) => p.extract_metadata(record),
            Processor::Tongyi(p) => p.extract_metadata(record),
            Processor::Default(p) => p.extract_metadata(record),
        }
    }
}
