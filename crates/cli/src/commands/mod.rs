// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod config;
pub mod room;
pub mod vote;
pub mod watch;

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::credentials::{CredentialProvider, StaticCredential};
use crate::error::{Error, Result};
use crate::query::{GraphqlQueryLayer, QueryLayer};
use crate::sync::SyncClient;

/// What commands that talk to the server need.
pub struct Context {
    pub config: Config,
    credentials: Arc<dyn CredentialProvider>,
    query: Arc<dyn QueryLayer>,
}

impl Context {
    /// Validate `config` and build the query layer from it.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let token = config.token().ok_or(Error::MissingCredential)?;
        let credentials: Arc<dyn CredentialProvider> = Arc::new(StaticCredential::new(token));
        let query = GraphqlQueryLayer::new(
            config.api.url.clone(),
            Arc::clone(&credentials),
            config.request_timeout(),
        )?;
        Ok(Context {
            config,
            credentials,
            query: Arc::new(query),
        })
    }

    pub fn query(&self) -> &dyn QueryLayer {
        self.query.as_ref()
    }

    pub fn shared_query(&self) -> Arc<dyn QueryLayer> {
        Arc::clone(&self.query)
    }

    /// A sync client connected to the configured gateway.
    pub fn sync_client(&self) -> SyncClient {
        SyncClient::new(
            self.config.sync_config(),
            Arc::clone(&self.credentials),
            Arc::clone(&self.query),
        )
    }
}

/// Write `value` as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
