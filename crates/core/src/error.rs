// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for mm-core operations.

use thiserror::Error;

/// All possible errors that can occur in mm-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid topic id: '{0}'\n  hint: topic ids look like 'vote_update:<room-id>'")]
    InvalidTopic(String),

    #[error("invalid event kind: '{0}'\n  hint: valid kinds are: vote_update, match_found, room_update")]
    InvalidEventKind(String),

    #[error("invalid room status: '{0}'\n  hint: valid statuses are: ACTIVE, MATCHED")]
    InvalidStatus(String),

    #[error("malformed frame: {0}")]
    Validation(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for mm-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
