// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Owner of the shared gateway connection.
//!
//! The connection is opened lazily by the first topic that needs it.
//! Opening happens under the pool lock, so topics arriving during a
//! handshake wait for it instead of opening their own. The connection is
//! closed when its last topic is released.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use mm_core::{GraphqlRequest, Topic};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::connection::{Connection, ConnectionConfig, ConnectionError, FrameSink};
use super::transport::Connector;
use crate::credentials::CredentialProvider;

pub struct ConnectionPool {
    config: ConnectionConfig,
    connector: Connector,
    credentials: Arc<dyn CredentialProvider>,
    sink: Arc<dyn FrameSink>,
    current: Mutex<Option<Arc<Connection>>>,
    next_id: AtomicU64,
}

impl ConnectionPool {
    pub fn new(
        config: ConnectionConfig,
        connector: Connector,
        credentials: Arc<dyn CredentialProvider>,
        sink: Arc<dyn FrameSink>,
    ) -> Self {
        ConnectionPool {
            config,
            connector,
            credentials,
            sink,
            current: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Start `topic` on the shared connection, opening one if needed.
    pub async fn start_topic(
        &self,
        topic: &Topic,
        request: &GraphqlRequest,
        cancel: &CancellationToken,
    ) -> Result<Arc<Connection>, ConnectionError> {
        let mut current = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ConnectionError::Cancelled),
            guard = self.current.lock() => guard,
        };

        let conn = match current.as_ref().filter(|c| c.is_open()) {
            Some(conn) => Arc::clone(conn),
            None => {
                let credential = self
                    .credentials
                    .current()
                    .ok_or(ConnectionError::MissingCredential)?;
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let transport = (self.connector)();
                let conn = Connection::open(
                    id,
                    transport,
                    &self.config,
                    credential,
                    Arc::clone(&self.sink),
                    cancel,
                )
                .await?;
                if cancel.is_cancelled() {
                    debug!(connection = id, "cancelled after handshake; closing connection");
                    conn.close();
                    return Err(ConnectionError::Cancelled);
                }
                info!(event = "connect", connection = id, url = %self.config.url, "gateway connection open");
                *current = Some(Arc::clone(&conn));
                conn
            }
        };

        if cancel.is_cancelled() {
            return Err(ConnectionError::Cancelled);
        }
        conn.start_topic(topic, request)?;
        debug!(topic = %topic, connection = conn.id(), "start frame queued");
        Ok(conn)
    }

    /// Stop `topic` on `conn`; closes the connection when no topics remain.
    pub async fn release(&self, conn: &Arc<Connection>, topic: &Topic) {
        let mut current = self.current.lock().await;
        conn.stop_topic(topic);
        if conn.topic_count() == 0 {
            debug!(connection = conn.id(), "last topic released; closing connection");
            conn.close();
            if current.as_ref().is_some_and(|c| Arc::ptr_eq(c, conn)) {
                *current = None;
            }
        }
    }

    /// Id of the open shared connection, if any and not mid-handshake.
    pub fn connection_id(&self) -> Option<u64> {
        self.current
            .try_lock()
            .ok()
            .and_then(|c| c.as_ref().filter(|c| c.is_open()).map(|c| c.id()))
    }

    /// Close the shared connection regardless of remaining topics.
    pub async fn close_all(&self) {
        if let Some(conn) = self.current.lock().await.take() {
            conn.close();
        }
    }
}
