// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for the slide data model.
//!
//! File and process failures are reported through `anyhow` by the I/O
//! layer; this enum only covers mistakes in documents and in how the
//! collection is driven.

use crate::models::slide::SlideId;
use thiserror::Error;

/// Result type for data model operations.
pub type Result<T> = std::result::Result<T, ProjectError>;

#[derive(Debug, Error)]
pub enum ProjectError {
    /// The slide's `type` field is missing or not a known literal.
    #[error("unknown slide type: {}", found.as_deref().unwrap_or("<missing>"))]
    UnknownSlideType { found: Option<String> },

    /// A slide was populated from a document while already holding data.
    #[error("slide '{name}' already holds data and cannot be loaded again")]
    NonEmptyTarget { name: String },

    /// A handle that does not belong to the collection.
    #[error("slide {0} is not part of the collection")]
    NotFound(SlideId),

    /// The document does not have the expected JSON shape.
    #[error("invalid project document: {0}")]
    InvalidDocument(String),
}

impl From<serde_json::Error> for ProjectError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidDocument(e.to_string())
    }
}
