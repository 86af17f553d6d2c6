// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text helpers shared by every processor: content cleanup, tag extraction,
//! summaries, and token estimation.
//!
//! All lengths are counted in Unicode scalar values, not bytes.

use std::sync::LazyLock;

use convey_core::types::{Message, Role};
use regex::Regex;

/// Maximum summary length before the ellipsis is appended.
pub const SUMMARY_MAX_CHARS: usize = 200;

/// Marker substituted for fenced code blocks in summaries.
pub const CODE_BLOCK_PLACEHOLDER: &str = "[code block]";

/// Language tags of this length or longer are ignored.
const MAX_LANGUAGE_TAG_CHARS: usize = 20;

/// Topic keywords matched case-insensitively anywhere in message content.
const TOPIC_KEYWORDS: &[&str] = &["debug", "error", "help", "explain", "how to", "tutorial"];

/// A newline preceded by one or more carriage returns.
///
/// Matching only a single `\r` would leave `\r\r\n` as `\r\n` after one
/// pass, so a second clean would change the text again.
static CRLF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r+\n").expect("valid CRLF pattern"));

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid newline pattern"));

/// Opening fence followed by an ASCII word, e.g. "```python".
static FENCE_LANGUAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```([0-9A-Za-z_]+)").expect("valid fence pattern"));

/// A complete fenced block, shortest match, spanning newlines.
static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid block pattern"));

static NEWLINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n+").expect("valid newline run pattern"));

/// Base cleanup applied to every message body.
///
/// Converts CRLF to LF, collapses three or more consecutive newlines to two,
/// and trims surrounding whitespace. Applying it twice is the same as once.
pub fn clean_content(content: &str) -> String {
    let normalized = CRLF.replace_all(content, "\n");
    EXCESS_NEWLINES
        .replace_all(&normalized, "\n\n")
        .trim()
        .to_string()
}

/// Collect tags from fenced-code languages and topic keywords.
///
/// Tags are deduplicated and keep the order in which they were first found.
pub fn extract_tags(messages: &[Message]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let mut push = |tag: String| {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    };

    for message in messages {
        for caps in FENCE_LANGUAGE.captures_iter(&message.content) {
            let lang = caps[1].to_lowercase();
            if lang.chars().count() < MAX_LANGUAGE_TAG_CHARS {
                push(lang);
            }
        }

        let lowered = message.content.to_lowercase();
        for keyword in TOPIC_KEYWORDS {
            if lowered.contains(keyword) {
                push((*keyword).to_string());
            }
        }
    }

    tags
}

/// Summarize a conversation from its first user message.
///
/// Fenced blocks become [`CODE_BLOCK_PLACEHOLDER`] and newline runs become a
/// single space. Output longer than [`SUMMARY_MAX_CHARS`] is cut and suffixed
/// with `...`. Without a user message the title is returned unchanged.
pub fn summarize(messages: &[Message], title: &str) -> String {
    let Some(first) = messages.iter().find(|m| m.role == Role::User) else {
        return title.to_string();
    };

    let without_code = FENCED_BLOCK.replace_all(&first.content, CODE_BLOCK_PLACEHOLDER);
    let flattened = NEWLINE_RUNS.replace_all(&without_code, " ");

    if flattened.chars().count() > SUMMARY_MAX_CHARS {
        let mut summary: String = flattened.chars().take(SUMMARY_MAX_CHARS).collect();
        summary.push_str("...");
        summary
    } else {
        flattened.into_owned()
    }
}

/// Rough token estimate: one token per four characters, rounded up.
pub fn estimate_tokens(messages: &[Message]) -> u64 {
    let chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();
    chars.div_ceil(4) as u64
}

/// Give untagged opening fences an explicit `plaintext` language.
///
/// Only opening fences are touched; a bare closing fence stays bare. Fence
/// parity is tracked line by line, so the function is idempotent.
pub fn tag_untyped_fences(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 16);
    let mut in_block = false;

    for line in content.split_inclusive('\n') {
        let body = line.trim_end_matches(['\n', '\r']);
        match body.strip_prefix("```") {
            Some(lang) if !in_block => {
                in_block = true;
                if lang.trim().is_empty() {
                    out.push_str("```plaintext");
                    out.push_str(&line[body.len()..]);
                    continue;
                }
            }
            Some(_) => in_block = false,
            None => {}
        }
        out.push_str(line);
    }

    out
}
