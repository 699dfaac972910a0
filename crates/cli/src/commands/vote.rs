// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use mm_core::RoomStatus;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::vote::{Reconciled, VoteClient};

use super::write_json;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoteReport<'a> {
    room_id: &'a str,
    movie_id: &'a str,
    user_id: &'a str,
    status: RoomStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    result_movie_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_votes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_members: Option<u32>,
}

/// Cast a vote, refusing early when the room already has a result.
pub async fn run(
    votes: &VoteClient,
    out: &mut impl Write,
    room_id: &str,
    movie_id: &str,
    user_id: &str,
    format: OutputFormat,
) -> Result<()> {
    votes.refresh_room(room_id).await?;
    let outcome = votes.submit_vote(room_id, movie_id, user_id).await?;
    let tally = outcome.state.tallies.get(movie_id).copied();

    match format {
        OutputFormat::Json => write_json(
            out,
            &VoteReport {
                room_id,
                movie_id,
                user_id,
                status: outcome.state.status,
                result_movie_id: outcome.state.result_movie_id.as_deref(),
                current_votes: tally.map(|t| t.current_votes),
                total_members: tally.map(|t| t.total_members),
            },
        ),
        OutputFormat::Text => {
            match (&outcome.transition, tally) {
                (Reconciled::Matched { movie_id: result }, _) => {
                    writeln!(out, "Voted for {} in {}", movie_id, room_id)?;
                    writeln!(out, "Match! Room {} chose {}", room_id, result)?;
                }
                (_, Some(tally)) => writeln!(
                    out,
                    "Voted for {} in {} ({}/{})",
                    movie_id, room_id, tally.current_votes, tally.total_members
                )?,
                (_, None) => writeln!(out, "Voted for {} in {}", movie_id, room_id)?,
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "vote_tests.rs"]
mod tests;
