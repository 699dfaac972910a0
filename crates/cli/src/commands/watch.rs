// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `mm watch`: follow a room until it matches or the user interrupts.

use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use mm_core::RoomVoteState;
use tokio::sync::mpsc;
use tracing::debug;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::sync::SyncClient;
use crate::vote::{Reconciled, VoteClient};

use super::Context;

pub async fn run(
    ctx: &Context,
    out: &mut impl Write,
    room_id: &str,
    status: bool,
    format: OutputFormat,
) -> Result<()> {
    let sync = ctx.sync_client();
    let votes = Arc::new(VoteClient::new(ctx.shared_query()));
    let result = run_impl(
        &sync,
        &votes,
        out,
        room_id,
        status,
        format,
        tokio::signal::ctrl_c(),
    )
    .await;
    sync.shutdown().await;
    result
}

/// Internal implementation that accepts the clients and a stop signal for testing.
pub(crate) async fn run_impl<S: Future>(
    sync: &SyncClient,
    votes: &Arc<VoteClient>,
    out: &mut impl Write,
    room_id: &str,
    status: bool,
    format: OutputFormat,
    stop: S,
) -> Result<()> {
    let initial = votes.refresh_room(room_id).await?;
    write_update(out, &initial.state, format)?;
    if initial.state.is_matched() {
        return Ok(());
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let watch = votes.watch_room(sync, room_id, move |state, transition| {
        let _ = tx.send((state.clone(), transition.clone()));
    });

    tokio::pin!(stop);
    let result = loop {
        tokio::select! {
            _ = &mut stop => {
                debug!(room = room_id, "watch interrupted");
                break Ok(());
            }
            update = rx.recv() => {
                let Some((state, transition)) = update else {
                    break Ok(());
                };
                if let Err(e) = write_update(out, &state, format) {
                    break Err(e);
                }
                if matches!(transition, Reconciled::Matched { .. }) {
                    break Ok(());
                }
            }
        }
    };
    if status {
        for info in sync.subscriptions() {
            writeln!(
                out,
                "{}  {}  attempts={}",
                info.topic, info.state, info.attempt_count
            )?;
        }
    }
    watch.cancel();
    result
}

fn write_update(out: &mut impl Write, state: &RoomVoteState, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(state)?)?,
        OutputFormat::Text => writeln!(out, "{}", format_state(state))?,
    }
    Ok(())
}

/// `r1 [ACTIVE] m1 2/3, m2 1/3` or `Match! Room r1 chose m1`.
pub(crate) fn format_state(state: &RoomVoteState) -> String {
    if let (true, Some(movie)) = (state.is_matched(), &state.result_movie_id) {
        return format!("Match! Room {} chose {}", state.room_id, movie);
    }
    let mut line = format!("{} [{}]", state.room_id, state.status);
    if let Some(total) = state.total_members {
        line.push_str(&format!(" members={}", total));
    }
    let tallies: Vec<String> = state
        .tallies
        .iter()
        .map(|(movie, t)| format!("{} {}/{}", movie, t.current_votes, t.total_members))
        .collect();
    if !tallies.is_empty() {
        line.push_str(&format!(" {}", tallies.join(", ")));
    }
    line
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
