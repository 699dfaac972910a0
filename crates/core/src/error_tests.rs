// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    invalid_topic = { Error::InvalidTopic("bogus".into()), "bogus" },
    invalid_kind = { Error::InvalidEventKind("vote".into()), "vote_update" },
    invalid_status = { Error::InvalidStatus("DONE".into()), "MATCHED" },
    validation = { Error::Validation("missing onVoteUpdate".into()), "onVoteUpdate" },
)]
fn error_display_contains(err: Error, expected: &str) {
    assert!(err.to_string().contains(expected));
}

#[test]
fn error_from_json() {
    let json_err = serde_json::from_str::<()>("invalid").unwrap_err();
    let err: Error = json_err.into();
    assert!(matches!(err, Error::Json(_)));
}
