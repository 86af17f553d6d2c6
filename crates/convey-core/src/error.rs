// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Convey ingestion pipeline.

use thiserror::Error;

/// The primary error type shared by the pipeline, the delivery queue, and
/// every collaborator trait.
#[derive(Debug, Error)]
pub enum ConveyError {
    /// Configuration errors (invalid settings, bad header values, unusable endpoint).
    #[error("configuration error: {0}")]
    Config(String),

    /// Local store errors (database failure, serialization of stored payloads).
    ///
    /// The delivery queue treats these as fatal for the task in flight.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Remote delivery errors (transport failure or non-2xx response).
    ///
    /// The delivery queue retries these with exponential backoff.
    #[error("{message}")]
    Delivery {
        message: String,
        /// HTTP status code, when a response was received.
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The record is not eligible for processing (e.g. it has no messages).
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// The record's source is not in the enabled platform set.
    #[error("source `{0}` is not enabled")]
    SourceDisabled(String),

    /// Internal or unexpected errors (worker gone, channel closed).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConveyError {
    /// Wraps any error as a [`ConveyError::Storage`].
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// Builds a [`ConveyError::Delivery`] without an underlying source.
    pub fn delivery(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Delivery {
            message: message.into(),
            status,
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_error_displays_message_verbatim() {
        let err = ConveyError::delivery("backend sync failed: 503 - overloaded", Some(503));
        assert_eq!(err.to_string(), "backend sync failed: 503 - overloaded");
        assert!(matches!(err, ConveyError::Delivery { status: Some(503), .. }));
    }

    #[test]
    fn storage_error_wraps_source() {
        let err = ConveyError::storage(std::io::Error::other("disk full"));
        assert_eq!(err.to_string(), "storage error: disk full");
    }

    #[test]
    fn source_disabled_names_the_source() {
        let err = ConveyError::SourceDisabled("Gemini".into());
        assert_eq!(err.to_string(), "source `Gemini` is not enabled");
    }
}
