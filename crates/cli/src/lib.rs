// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! mmsync - Realtime sync and vote/match client for MovieMatch rooms.
//!
//! This crate provides the library behind the `mm` CLI: a subscription
//! client that keeps per-room topics alive over the realtime gateway, and a
//! vote client that enforces stop-on-match locally.
//!
//! # Main Components
//!
//! - [`SyncClient`] - Topic subscriptions with reconnection and polling fallback
//! - [`VoteClient`] - Vote submission and match reconciliation
//! - [`QueryLayer`] - Request/response operations against the GraphQL API
//! - [`Config`] - TOML configuration
//!
//! # Subscribing
//!
//! ```rust,ignore
//! use mmsync::{SyncClient, SyncConfig, StaticCredential};
//! use mm_core::Topic;
//!
//! let sync = SyncClient::new(SyncConfig::default(), credentials, query);
//! let handle = sync.subscribe(Topic::vote_update("r1"), |event| {
//!     println!("{:?}", event.payload);
//! });
//! // Later
//! handle.cancel();
//! ```

mod cli;
mod commands;

pub mod config;
pub mod credentials;
pub mod error;
pub mod query;
pub mod sync;
pub mod vote;

#[cfg(test)]
mod test_support;

pub use cli::{Cli, Command, ConfigCommand, OutputFormat};
pub use config::Config;
pub use credentials::{CredentialProvider, EnvCredential, SharedCredential, StaticCredential};
pub use error::{Error, Result};
pub use query::{GraphqlQueryLayer, QueryError, QueryLayer};
pub use sync::{SubscriptionHandle, SubscriptionState, SyncClient, SyncConfig};
pub use vote::{VoteClient, VoteError};

use commands::Context;

/// Execute a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let explicit = cli.config.as_deref();
    let mut stdout = std::io::stdout();
    match cli.command {
        Command::Config(cmd) => commands::config::run(cmd, explicit, &mut stdout),
        command => {
            let ctx = Context::new(Config::resolve(explicit)?)?;
            run_remote(&ctx, command, &mut stdout).await
        }
    }
}

/// Commands that talk to the API or the realtime gateway.
async fn run_remote(ctx: &Context, command: Command, out: &mut impl std::io::Write) -> Result<()> {
    match command {
        Command::Watch {
            room,
            status,
            output,
        } => commands::watch::run(ctx, out, &room, status, output).await,
        Command::Vote {
            room,
            movie,
            user,
            output,
        } => {
            let votes = VoteClient::new(ctx.shared_query());
            commands::vote::run(&votes, out, &room, &movie, &user, output).await
        }
        Command::Room { room, output } => {
            commands::room::show(ctx.query(), out, &room, output).await
        }
        Command::Rooms { user, output } => {
            commands::room::list(ctx.query(), out, &user, output).await
        }
        Command::Create { name, user, output } => {
            commands::room::create(ctx.query(), out, &name, &user, output).await
        }
        Command::Join { room, user, output } => {
            commands::room::join(ctx.query(), out, &room, &user, output).await
        }
        Command::Movie { id, output } => commands::room::movie(ctx.query(), out, &id, output).await,
        Command::Config(cmd) => commands::config::run(cmd, None, out),
    }
}
