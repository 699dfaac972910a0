// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;

use mm_core::{ServerFrame, Tally, Topic};

use super::*;
use crate::credentials::StaticCredential;
use crate::query::QueryLayer;
use crate::sync::test_helpers::{wait_until, MockGateway};
use crate::sync::SyncConfig;
use crate::test_support::{active_room, matched_room, MockQueryLayer};

fn clients(gateway: &MockGateway, query: &Arc<MockQueryLayer>) -> (SyncClient, Arc<VoteClient>) {
    let shared = Arc::clone(query) as Arc<dyn QueryLayer>;
    let sync = SyncClient::with_connector(
        SyncConfig::default(),
        Arc::new(StaticCredential::new("Bearer test")),
        Arc::clone(&shared),
        gateway.connector(),
    );
    (sync, Arc::new(VoteClient::new(shared)))
}

#[test]
fn test_format_state() {
    let mut state = RoomVoteState::new("r1");
    assert_eq!(format_state(&state), "r1 [ACTIVE]");

    state.total_members = Some(3);
    state.tallies.insert(
        "m1".into(),
        Tally {
            current_votes: 2,
            total_members: 3,
        },
    );
    assert_eq!(format_state(&state), "r1 [ACTIVE] members=3 m1 2/3");

    state.apply_match("m1");
    assert_eq!(format_state(&state), "Match! Room r1 chose m1");
}

#[tokio::test]
async fn test_watch_ends_on_match() {
    let gateway = MockGateway::new();
    let query = Arc::new(MockQueryLayer::new());
    query.set_room(active_room("r1", &["u1", "u2", "u3"]));
    let (sync, votes) = clients(&gateway, &query);

    let driver = async {
        let link = gateway.wait_for_links(1).await;
        wait_until(|| link.starts().len() == 3).await;
        link.push(ServerFrame::data(
            &Topic::vote_update("r1"),
            serde_json::json!({ "onVoteUpdate": {
                "roomId": "r1", "movieId": "m1", "currentVotes": 2, "totalMembers": 3,
            }}),
        ));
        link.push(ServerFrame::data(
            &Topic::match_found("r1"),
            serde_json::json!({ "onMatchFound": { "roomId": "r1", "movieId": "m1" }}),
        ));
    };

    let mut buf = Vec::new();
    let (result, ()) = tokio::join!(
        run_impl(
            &sync,
            &votes,
            &mut buf,
            "r1",
            false,
            OutputFormat::Text,
            std::future::pending::<()>(),
        ),
        driver
    );
    result.unwrap();

    let output = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.first(), Some(&"r1 [ACTIVE] members=3"));
    assert!(lines.contains(&"r1 [ACTIVE] members=3 m1 2/3"));
    assert_eq!(lines.last(), Some(&"Match! Room r1 chose m1"));
    assert!(sync.subscriptions().is_empty());
    sync.shutdown().await;
}

#[tokio::test]
async fn test_watch_on_matched_room_does_not_subscribe() {
    let gateway = MockGateway::new();
    let query = Arc::new(MockQueryLayer::new());
    query.set_room(matched_room("r1", "m4", &["u1"]));
    let (sync, votes) = clients(&gateway, &query);

    let mut buf = Vec::new();
    run_impl(
        &sync,
        &votes,
        &mut buf,
        "r1",
        false,
        OutputFormat::Text,
        std::future::pending::<()>(),
    )
    .await
    .unwrap();

    assert_eq!(String::from_utf8(buf).unwrap(), "Match! Room r1 chose m4\n");
    assert_eq!(gateway.connect_attempts(), 0);
}

#[tokio::test]
async fn test_watch_stop_prints_status() {
    let gateway = MockGateway::new();
    let query = Arc::new(MockQueryLayer::new());
    query.set_room(active_room("r1", &["u1"]));
    let (sync, votes) = clients(&gateway, &query);

    let mut buf = Vec::new();
    run_impl(
        &sync,
        &votes,
        &mut buf,
        "r1",
        true,
        OutputFormat::Json,
        std::future::ready(()),
    )
    .await
    .unwrap();

    let output = String::from_utf8(buf).unwrap();
    let mut lines = output.lines();
    let first: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
    assert_eq!(first["room_id"], "r1");
    let status: Vec<&str> = lines.collect();
    assert_eq!(status.len(), 3);
    assert!(status.iter().any(|l| l.starts_with("room_update:r1")));
    assert!(status.iter().all(|l| l.ends_with("attempts=0")));
    sync.shutdown().await;
}

#[tokio::test]
async fn test_watch_unknown_room_fails_before_subscribing() {
    let gateway = MockGateway::new();
    let query = Arc::new(MockQueryLayer::new());
    let (sync, votes) = clients(&gateway, &query);

    let result = run_impl(
        &sync,
        &votes,
        &mut Vec::new(),
        "missing",
        false,
        OutputFormat::Text,
        std::future::pending::<()>(),
    )
    .await;
    assert!(result.is_err());
    assert!(sync.subscriptions().is_empty());
}
