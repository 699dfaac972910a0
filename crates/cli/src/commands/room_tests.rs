// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::error::Error;
use crate::query::QueryError;
use crate::test_support::{active_room, matched_room, MockQueryLayer};

fn text(buf: Vec<u8>) -> String {
    String::from_utf8(buf).unwrap()
}

#[test]
fn test_format_room_line() {
    let mut room = active_room("r1", &["u1"]);
    assert_eq!(format_room_line(&room), "r1  [ACTIVE]  1 member");

    room.name = Some("Friday".into());
    assert_eq!(format_room_line(&room), "r1  Friday  [ACTIVE]  1 member");

    let matched = matched_room("r2", "m9", &["u1", "u2"]);
    assert_eq!(format_room_line(&matched), "r2  [MATCHED]  2 members  -> m9");
}

#[test]
fn test_format_room_details() {
    let room = matched_room("r1", "m1", &["u1", "u2"]);
    let details = format_room_details(&room);
    assert!(details.contains("Room: r1"));
    assert!(details.contains("Status: MATCHED"));
    assert!(details.contains("Match: m1"));
    assert!(details.contains("Members (2): u1, u2"));
}

#[test]
fn test_format_movie() {
    let mut movie = Movie {
        id: "m1".into(),
        title: "Heat".into(),
        year: Some(1995),
        overview: None,
        poster_url: None,
    };
    assert_eq!(format_movie(&movie), "Heat (1995)  m1");
    movie.year = None;
    movie.overview = Some("A heist.".into());
    assert_eq!(format_movie(&movie), "Heat  m1\n\nA heist.");
}

#[tokio::test]
async fn test_show_room_text_and_json() {
    let query = MockQueryLayer::new();
    query.set_room(active_room("r1", &["u1", "u2"]));

    let mut buf = Vec::new();
    show(&query, &mut buf, "r1", OutputFormat::Text).await.unwrap();
    assert!(text(buf).contains("Status: ACTIVE"));

    let mut buf = Vec::new();
    show(&query, &mut buf, "r1", OutputFormat::Json).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(value["id"], "r1");
    assert_eq!(value["status"], "ACTIVE");
    assert_eq!(value["totalMembers"], 2);
}

#[tokio::test]
async fn test_show_unknown_room_propagates() {
    let query = MockQueryLayer::new();
    let mut buf = Vec::new();
    let err = show(&query, &mut buf, "nope", OutputFormat::Text)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Query(QueryError::Validation(_))));
    assert!(buf.is_empty());
}

#[tokio::test]
async fn test_create_then_join_then_list() {
    let query = MockQueryLayer::new();

    let mut buf = Vec::new();
    create(&query, &mut buf, "friday", "u1", OutputFormat::Text)
        .await
        .unwrap();
    assert!(text(buf).starts_with("Created room room-friday"));

    let mut buf = Vec::new();
    join(&query, &mut buf, "room-friday", "u2", OutputFormat::Text)
        .await
        .unwrap();
    assert!(text(buf).contains("Members (2): u1, u2"));

    let mut buf = Vec::new();
    list(&query, &mut buf, "u2", OutputFormat::Text).await.unwrap();
    assert_eq!(text(buf), "room-friday  friday  [ACTIVE]  2 members\n");

    assert_eq!(
        query.calls(),
        vec![
            "createRoom:friday:u1",
            "joinRoom:room-friday:u2",
            "getUserRooms:u2",
        ]
    );
}

#[tokio::test]
async fn test_list_empty() {
    let query = MockQueryLayer::new();
    let mut buf = Vec::new();
    list(&query, &mut buf, "u1", OutputFormat::Text).await.unwrap();
    assert_eq!(text(buf), "No rooms found.\n");

    let mut buf = Vec::new();
    list(&query, &mut buf, "u1", OutputFormat::Json).await.unwrap();
    assert_eq!(text(buf).trim(), "[]");
}

#[tokio::test]
async fn test_movie_lookup() {
    let query = MockQueryLayer::new();
    let mut buf = Vec::new();
    movie(&query, &mut buf, "m7", OutputFormat::Text).await.unwrap();
    assert_eq!(text(buf), "Movie m7  m7\n");
}
