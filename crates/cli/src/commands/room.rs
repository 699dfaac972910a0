// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Room and movie lookups: `room`, `rooms`, `create`, `join`, `movie`.

use std::io::Write;

use mm_core::{Movie, Room, RoomStatus};

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::query::QueryLayer;

use super::write_json;

pub async fn show(
    query: &dyn QueryLayer,
    out: &mut impl Write,
    room_id: &str,
    format: OutputFormat,
) -> Result<()> {
    let room = query.get_room(room_id).await?;
    write_room(out, &room, format)
}

pub async fn list(
    query: &dyn QueryLayer,
    out: &mut impl Write,
    user_id: &str,
    format: OutputFormat,
) -> Result<()> {
    let rooms = query.get_user_rooms(user_id).await?;
    match format {
        OutputFormat::Json => write_json(out, &rooms),
        OutputFormat::Text => {
            if rooms.is_empty() {
                writeln!(out, "No rooms found.")?;
            }
            for room in &rooms {
                writeln!(out, "{}", format_room_line(room))?;
            }
            Ok(())
        }
    }
}

pub async fn create(
    query: &dyn QueryLayer,
    out: &mut impl Write,
    name: &str,
    user_id: &str,
    format: OutputFormat,
) -> Result<()> {
    let room = query.create_room(name, user_id).await?;
    if format == OutputFormat::Text {
        writeln!(out, "Created room {}", room.id)?;
    }
    write_room(out, &room, format)
}

pub async fn join(
    query: &dyn QueryLayer,
    out: &mut impl Write,
    room_id: &str,
    user_id: &str,
    format: OutputFormat,
) -> Result<()> {
    let room = query.join_room(room_id, user_id).await?;
    if format == OutputFormat::Text {
        writeln!(out, "Joined room {}", room.id)?;
    }
    write_room(out, &room, format)
}

pub async fn movie(
    query: &dyn QueryLayer,
    out: &mut impl Write,
    movie_id: &str,
    format: OutputFormat,
) -> Result<()> {
    let movie = query.get_movie_details(movie_id).await?;
    match format {
        OutputFormat::Json => write_json(out, &movie),
        OutputFormat::Text => {
            writeln!(out, "{}", format_movie(&movie))?;
            Ok(())
        }
    }
}

fn write_room(out: &mut impl Write, room: &Room, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(out, room),
        OutputFormat::Text => {
            writeln!(out, "{}", format_room_details(room))?;
            Ok(())
        }
    }
}

/// One-line summary: `r1  Friday  [ACTIVE]  3 members`.
pub(crate) fn format_room_line(room: &Room) -> String {
    let mut line = room.id.clone();
    if let Some(name) = &room.name {
        line.push_str(&format!("  {}", name));
    }
    let noun = if room.total_members == 1 {
        "member"
    } else {
        "members"
    };
    line.push_str(&format!("  [{}]  {} {}", room.status, room.total_members, noun));
    if let (RoomStatus::Matched, Some(movie)) = (room.status, &room.result_movie_id) {
        line.push_str(&format!("  -> {}", movie));
    }
    line
}

pub(crate) fn format_room_details(room: &Room) -> String {
    let mut lines = vec![format!("Room: {}", room.id)];
    if let Some(name) = &room.name {
        lines.push(format!("Name: {}", name));
    }
    lines.push(format!("Status: {}", room.status));
    if let Some(movie) = &room.result_movie_id {
        lines.push(format!("Match: {}", movie));
    }
    lines.push(format!(
        "Members ({}): {}",
        room.total_members,
        room.member_ids.join(", ")
    ));
    if let Some(created) = room.created_at {
        lines.push(format!("Created: {}", created.format("%Y-%m-%d %H:%M")));
    }
    lines.join("\n")
}

pub(crate) fn format_movie(movie: &Movie) -> String {
    let mut line = match movie.year {
        Some(year) => format!("{} ({})  {}", movie.title, year, movie.id),
        None => format!("{}  {}", movie.title, movie.id),
    };
    if let Some(overview) = &movie.overview {
        line.push_str(&format!("\n\n{}", overview));
    }
    line
}

#[cfg(test)]
#[path = "room_tests.rs"]
mod tests;
