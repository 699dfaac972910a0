// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sources of the bearer credential sent with handshakes and queries.
//!
//! Credentials are read at handshake and request time; they are never
//! parsed or refreshed here.

use parking_lot::RwLock;

/// Environment variable consulted by [`EnvCredential::default`].
pub const TOKEN_ENV: &str = "MOVIEMATCH_TOKEN";

/// Supplies the current credential.
pub trait CredentialProvider: Send + Sync {
    /// The credential to present now, if any.
    fn current(&self) -> Option<String>;
}

/// A fixed credential.
#[derive(Debug, Clone)]
pub struct StaticCredential(String);

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        StaticCredential(token.into())
    }
}

impl CredentialProvider for StaticCredential {
    fn current(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Reads the credential from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        EnvCredential { var: var.into() }
    }
}

impl Default for EnvCredential {
    fn default() -> Self {
        EnvCredential::new(TOKEN_ENV)
    }
}

impl CredentialProvider for EnvCredential {
    fn current(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|v| !v.is_empty())
    }
}

/// A credential the host application replaces after sign-in or refresh.
#[derive(Debug, Default)]
pub struct SharedCredential {
    token: RwLock<Option<String>>,
}

impl SharedCredential {
    pub fn new(token: Option<String>) -> Self {
        SharedCredential {
            token: RwLock::new(token),
        }
    }

    pub fn set(&self, token: Option<String>) {
        *self.token.write() = token;
    }
}

impl CredentialProvider for SharedCredential {
    fn current(&self) -> Option<String> {
        self.token.read().clone()
    }
}
