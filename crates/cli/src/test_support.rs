// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory query layer for tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use mm_core::{Movie, Room, RoomStatus, VoteResponse};

use crate::query::{QueryError, QueryFuture, QueryLayer, VoteInput};

/// Query layer answering from in-memory state and recording every call.
#[derive(Default)]
pub struct MockQueryLayer {
    rooms: Mutex<HashMap<String, Room>>,
    vote_response: Mutex<Option<VoteResponse>>,
    failing_votes: AtomicU32,
    failing_rooms: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl MockQueryLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_room(&self, room: Room) {
        self.rooms.lock().unwrap().insert(room.id.clone(), room);
    }

    /// Answer every vote with `response` instead of an echoed active tally.
    pub fn set_vote_response(&self, response: VoteResponse) {
        *self.vote_response.lock().unwrap() = Some(response);
    }

    /// Fail the next `n` votes with an HTTP error.
    pub fn fail_next_votes(&self, n: u32) {
        self.failing_votes.store(n, Ordering::SeqCst);
    }

    pub fn fail_get_room(&self, fail: bool) {
        self.failing_rooms.store(fail, Ordering::SeqCst);
    }

    /// Every call as `<operation>:<args>`, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls to `operation`.
    pub fn count(&self, operation: &str) -> usize {
        let prefix = format!("{}:", operation);
        self.calls()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn room(&self, room_id: &str) -> Result<Room, QueryError> {
        self.rooms
            .lock()
            .unwrap()
            .get(room_id)
            .cloned()
            .ok_or_else(|| QueryError::Validation(format!("getRoom returned no result for {}", room_id)))
    }
}

pub fn active_room(id: &str, members: &[&str]) -> Room {
    Room {
        id: id.to_string(),
        name: None,
        status: RoomStatus::Active,
        result_movie_id: None,
        member_ids: members.iter().map(|m| m.to_string()).collect(),
        total_members: members.len() as u32,
        created_at: None,
    }
}

pub fn matched_room(id: &str, movie_id: &str, members: &[&str]) -> Room {
    Room {
        status: RoomStatus::Matched,
        result_movie_id: Some(movie_id.to_string()),
        ..active_room(id, members)
    }
}

impl QueryLayer for MockQueryLayer {
    fn create_room<'a>(&'a self, name: &'a str, user_id: &'a str) -> QueryFuture<'a, Room> {
        Box::pin(async move {
            self.record(format!("createRoom:{}:{}", name, user_id));
            let mut room = active_room(&format!("room-{}", name), &[user_id]);
            room.name = Some(name.to_string());
            self.set_room(room.clone());
            Ok(room)
        })
    }

    fn join_room<'a>(&'a self, room_id: &'a str, user_id: &'a str) -> QueryFuture<'a, Room> {
        Box::pin(async move {
            self.record(format!("joinRoom:{}:{}", room_id, user_id));
            let mut room = self.room(room_id)?;
            if !room.member_ids.iter().any(|m| m == user_id) {
                room.member_ids.push(user_id.to_string());
                room.total_members += 1;
            }
            self.set_room(room.clone());
            Ok(room)
        })
    }

    fn get_room<'a>(&'a self, room_id: &'a str) -> QueryFuture<'a, Room> {
        Box::pin(async move {
            self.record(format!("getRoom:{}", room_id));
            if self.failing_rooms.load(Ordering::SeqCst) {
                return Err(QueryError::Http("mock getRoom failure".into()));
            }
            self.room(room_id)
        })
    }

    fn vote<'a>(&'a self, input: &'a VoteInput) -> QueryFuture<'a, VoteResponse> {
        Box::pin(async move {
            self.record(format!(
                "vote:{}:{}:{}",
                input.room_id, input.movie_id, input.user_id
            ));
            let failed = self
                .failing_votes
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failed {
                return Err(QueryError::Http("mock vote failure".into()));
            }
            let response = self.vote_response.lock().unwrap().clone();
            Ok(response.unwrap_or(VoteResponse {
                room_id: input.room_id.clone(),
                status: RoomStatus::Active,
                result_movie_id: None,
                current_votes: Some(1),
                total_members: Some(3),
            }))
        })
    }

    fn get_movie_details<'a>(&'a self, movie_id: &'a str) -> QueryFuture<'a, Movie> {
        Box::pin(async move {
            self.record(format!("getMovieDetails:{}", movie_id));
            Ok(Movie {
                id: movie_id.to_string(),
                title: format!("Movie {}", movie_id),
                year: None,
                overview: None,
                poster_url: None,
            })
        })
    }

    fn get_user_rooms<'a>(&'a self, user_id: &'a str) -> QueryFuture<'a, Vec<Room>> {
        Box::pin(async move {
            self.record(format!("getUserRooms:{}", user_id));
            let mut found: Vec<Room> = self
                .rooms
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.member_ids.iter().any(|m| m == user_id))
                .cloned()
                .collect();
            found.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(found)
        })
    }
}
