// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for records and messages used across test suites.

use chrono::{DateTime, TimeZone, Utc};
use convey_core::{ContentType, Message, Record, Role};

/// Fixed timestamp so fixtures compare equal across runs.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0)
        .single()
        .unwrap_or_default()
}

/// A plain-text message.
pub fn message(id: &str, role: Role, content: &str) -> Message {
    Message {
        id: id.to_string(),
        role,
        content: content.to_string(),
        content_type: ContentType::Text,
        timestamp: fixed_time(),
        metadata: None,
    }
}

/// A record for `source` with the given messages.
pub fn record(id: &str, source: &str, messages: Vec<Message>) -> Record {
    Record {
        id: id.to_string(),
        source: source.to_string(),
        title: format!("Conversation {id}"),
        url: format!("https://chat.example.com/c/{id}"),
        created_at: fixed_time(),
        updated_at: fixed_time(),
        messages,
        metadata: None,
    }
}

/// A two-message ChatGPT record.
pub fn sample_record(id: &str) -> Record {
    record(
        id,
        "ChatGPT",
        vec![
            message(&format!("{id}-1"), Role::User, "how to reverse a list?"),
            message(
                &format!("{id}-2"),
                Role::Assistant,
                "```\nitems.reverse()\n```",
            ),
        ],
    )
}
