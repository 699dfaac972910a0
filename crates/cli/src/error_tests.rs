// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;

#[test]
fn test_already_matched_has_hint() {
    let err: Error = VoteError::AlreadyMatched {
        room_id: "r3".to_string(),
        movie_id: "m0".to_string(),
    }
    .into();
    let msg = err.to_string();
    assert!(msg.contains("room r3 already matched on m0"));
    assert!(msg.contains("hint:"));
}

#[test]
fn test_duplicate_vote_keeps_fields() {
    let err: Error = VoteError::DuplicateVote {
        room_id: "r1".to_string(),
        movie_id: "m1".to_string(),
        user_id: "u1".to_string(),
    }
    .into();
    assert!(matches!(err, Error::DuplicateVote { ref user_id, .. } if user_id == "u1"));
}

#[test]
fn test_query_error_is_wrapped_verbatim() {
    let err: Error = VoteError::Query(QueryError::Status {
        status: 503,
        body: "unavailable".to_string(),
    })
    .into();
    let msg = err.to_string();
    assert!(msg.starts_with("query failed:"));
    assert!(msg.contains("503"));
}

#[test]
fn test_invalid_kind_lists_valid_kinds() {
    let err: Error = mm_core::Error::InvalidEventKind("votes".to_string()).into();
    let msg = err.to_string();
    assert!(msg.contains("'votes'"));
    assert!(msg.contains("match_found"));
}

#[test]
fn test_missing_credential_mentions_env_var() {
    assert!(Error::MissingCredential
        .to_string()
        .contains("MOVIEMATCH_TOKEN"));
}

#[test]
fn test_config_not_found_suggests_init() {
    let err = Error::ConfigNotFound("/tmp/x.toml".to_string());
    assert!(err.to_string().contains("mm config init"));
}
