// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    vote = { Topic::vote_update("r1"), "vote_update:r1" },
    matched = { Topic::match_found("r2"), "match_found:r2" },
    room = { Topic::room_update("abc-123"), "room_update:abc-123" },
)]
fn wire_id_format(topic: Topic, expected: &str) {
    assert_eq!(topic.wire_id(), expected);
    assert_eq!(expected.parse::<Topic>().unwrap(), topic);
}

#[test]
fn room_id_may_contain_colons() {
    let topic: Topic = "room_update:tenant:42".parse().unwrap();
    assert_eq!(topic.kind, EventKind::RoomUpdate);
    assert_eq!(topic.room_id, "tenant:42");
}

#[parameterized(
    no_separator = { "vote_update" },
    empty_room = { "vote_update:" },
    unknown_kind = { "chat:r1" },
    empty = { "" },
)]
fn invalid_wire_ids(input: &str) {
    let err = input.parse::<Topic>().unwrap_err();
    assert!(matches!(err, Error::InvalidTopic(_)));
}

#[parameterized(
    snake = { "vote_update", EventKind::VoteUpdate },
    kebab = { "match-found", EventKind::MatchFound },
    short = { "room", EventKind::RoomUpdate },
    upper = { "VOTE_UPDATE", EventKind::VoteUpdate },
)]
fn event_kind_from_str(input: &str, expected: EventKind) {
    assert_eq!(input.parse::<EventKind>().unwrap(), expected);
}

#[test]
fn all_for_room_covers_every_kind() {
    let topics = Topic::all_for_room("r9");
    assert_eq!(topics.len(), 3);
    for kind in EventKind::ALL {
        assert!(topics.contains(&Topic::new(kind, "r9")));
    }
}

#[test]
fn field_names_are_distinct() {
    assert_eq!(EventKind::VoteUpdate.field_name(), "onVoteUpdate");
    assert_eq!(EventKind::MatchFound.field_name(), "onMatchFound");
    assert_eq!(EventKind::RoomUpdate.field_name(), "onRoomUpdate");
}
