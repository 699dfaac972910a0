// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::query::QueryError;
use crate::vote::VoteError;

/// Errors surfaced by the `mm` command line.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config file not found: {0}\n  hint: run 'mm config init' to create one")]
    ConfigNotFound(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid config: {field}: {reason}\n  hint: {hint}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
        hint: &'static str,
    },

    #[error("config file already exists: {0}\n  hint: edit it directly or pass --config for another path")]
    ConfigExists(String),

    #[error("no config directory on this platform\n  hint: pass --config <path>")]
    NoConfigDir,

    #[error("no credential available\n  hint: set MOVIEMATCH_TOKEN or api.token in the config file")]
    MissingCredential,

    #[error("invalid topic kind '{0}'\n  hint: valid kinds are: vote_update, match_found, room_update")]
    InvalidKind(String),

    #[error("room {room_id} already matched on {movie_id}\n  hint: voting is closed once a room has a result")]
    AlreadyMatched { room_id: String, movie_id: String },

    #[error("vote already submitted: {user_id} for {movie_id} in room {room_id}")]
    DuplicateVote {
        room_id: String,
        movie_id: String,
        user_id: String,
    },

    #[error("query failed: {0}")]
    Query(#[from] QueryError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<VoteError> for Error {
    fn from(err: VoteError) -> Self {
        match err {
            VoteError::AlreadyMatched { room_id, movie_id } => {
                Error::AlreadyMatched { room_id, movie_id }
            }
            VoteError::DuplicateVote {
                room_id,
                movie_id,
                user_id,
            } => Error::DuplicateVote {
                room_id,
                movie_id,
                user_id,
            },
            VoteError::Query(e) => Error::Query(e),
        }
    }
}

impl From<mm_core::Error> for Error {
    fn from(err: mm_core::Error) -> Self {
        match err {
            mm_core::Error::InvalidEventKind(kind) => Error::InvalidKind(kind),
            mm_core::Error::Json(e) => Error::Json(e),
            other => Error::Config(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
