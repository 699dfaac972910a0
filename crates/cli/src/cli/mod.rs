// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

const HELP_TEMPLATE: &str = "{about-with-newline}
{usage-heading} {usage}

{before-help}Options:
{options}{after-help}";

const COMMANDS_HELP: &str = "\
Rooms:
  create      Create a room
  join        Join a room
  room        Show a room
  rooms       List a user's rooms
  movie       Show movie details

Realtime:
  watch       Stream live room updates until a match
  vote        Vote for a movie

Setup:
  config      Manage configuration";

const QUICKSTART_HELP: &str = "\
Get started:
  mm config init                      Write a default config file
  mm create --name Friday --user u1   Create a room
  mm watch <room>                     Follow votes live
  mm vote <room> <movie> --user u1    Cast a vote";

#[derive(Parser, Debug)]
#[command(name = "mm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Realtime client for MovieMatch rooms")]
#[command(
    long_about = "Realtime client for MovieMatch rooms.\n\n\
    Follows vote and match events over the realtime gateway, reconnecting with \
    backoff and polling when the gateway stays unreachable."
)]
#[command(help_template = HELP_TEMPLATE)]
#[command(before_help = COMMANDS_HELP)]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Path to the config file
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream live updates for a room until it matches
    #[command(after_help = "Examples:\n  \
        mm watch r1                 Print updates until the room matches\n  \
        mm watch r1 --status        Also print subscription states on exit")]
    Watch {
        /// Room ID
        #[arg(value_parser = non_empty_string)]
        room: String,

        /// Print subscription states when the watch ends
        #[arg(long)]
        status: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Vote for a movie in a room
    Vote {
        /// Room ID
        #[arg(value_parser = non_empty_string)]
        room: String,

        /// Movie ID
        #[arg(value_parser = non_empty_string)]
        movie: String,

        /// Voting user
        #[arg(long, short, value_parser = non_empty_string)]
        user: String,

        /// Output format
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Show a room
    Room {
        /// Room ID
        #[arg(value_parser = non_empty_string)]
        room: String,

        /// Output format
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// List the rooms a user belongs to
    Rooms {
        #[arg(long, short, value_parser = non_empty_string)]
        user: String,

        /// Output format
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Create a room
    Create {
        /// Room name
        #[arg(long, short, value_parser = non_empty_string)]
        name: String,

        /// Owner
        #[arg(long, short, value_parser = non_empty_string)]
        user: String,

        /// Output format
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Join a room
    Join {
        /// Room ID
        #[arg(value_parser = non_empty_string)]
        room: String,

        #[arg(long, short, value_parser = non_empty_string)]
        user: String,

        /// Output format
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Show movie details
    Movie {
        /// Movie ID
        #[arg(value_parser = non_empty_string)]
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
