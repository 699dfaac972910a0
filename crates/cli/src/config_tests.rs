// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use super::*;
use tempfile::TempDir;
use yare::parameterized;

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.gateway.handshake_timeout_ms, 10_000);
    assert_eq!(config.gateway.keepalive_timeout_ms, 300_000);
    assert_eq!(config.reconnect.max_attempts, 5);
    assert_eq!(config.reconnect.base_delay_ms, 1_000);
    assert_eq!(config.reconnect.max_delay_ms, 30_000);
    assert_eq!(config.poll.room_interval_ms, 5_000);
    assert_eq!(config.poll.match_interval_ms, 3_000);
    assert!(config.api.token.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_save_and_load_roundtrip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.gateway.url = "wss://example.test/realtime".to_string();
    config.api.token = Some("secret".to_string());
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_file_uses_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(&path, "[reconnect]\nmax_attempts = 2\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.reconnect.max_attempts, 2);
    assert_eq!(config.reconnect.base_delay_ms, 1_000);
    assert_eq!(config.gateway, GatewayConfig::default());
}

#[test]
fn test_load_missing_file() {
    let temp = TempDir::new().unwrap();
    let err = Config::load(&temp.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, Error::ConfigNotFound(_)));
}

#[test]
fn test_resolve_explicit_missing_is_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.toml");
    assert!(Config::resolve(Some(&path)).is_err());
}

#[test]
fn test_load_malformed_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(&path, "gateway = [").unwrap();

    match Config::load(&path) {
        Err(Error::Config(msg)) => assert!(msg.contains("failed to parse config")),
        other => panic!("unexpected: {:?}", other),
    }
}

#[parameterized(
    http_gateway = { |c: &mut Config| c.gateway.url = "http://x".into(), "gateway.url" },
    ws_api = { |c: &mut Config| c.api.url = "ws://x".into(), "api.url" },
    zero_attempts = { |c: &mut Config| c.reconnect.max_attempts = 0, "reconnect.max_attempts" },
    base_over_max = { |c: &mut Config| c.reconnect.base_delay_ms = 60_000, "reconnect.base_delay_ms" },
    zero_room_poll = { |c: &mut Config| c.poll.room_interval_ms = 0, "poll.room_interval_ms" },
    zero_match_poll = { |c: &mut Config| c.poll.match_interval_ms = 0, "poll.match_interval_ms" },
    zero_handshake = { |c: &mut Config| c.gateway.handshake_timeout_ms = 0, "gateway.handshake_timeout_ms" },
)]
fn test_validate_rejects(mutate: fn(&mut Config), expected: &str) {
    let mut config = Config::default();
    mutate(&mut config);
    match config.validate() {
        Err(Error::InvalidConfig { field, .. }) => assert_eq!(field, expected),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_validate_accepts_secure_urls() {
    let mut config = Config::default();
    config.gateway.url = "wss://example.test/realtime".into();
    config.api.url = "https://example.test/graphql".into();
    assert!(config.validate().is_ok());
}

#[parameterized(
    env_wins = { Some("env"), Some("file"), Some("env") },
    file_fallback = { None, Some("file"), Some("file") },
    empty_env_ignored = { Some(""), Some("file"), Some("file") },
    none = { None, None, None },
    empty_file_ignored = { None, Some(""), None },
)]
fn test_token_precedence(env: Option<&str>, file: Option<&str>, expected: Option<&str>) {
    let mut config = Config::default();
    config.api.token = file.map(String::from);
    assert_eq!(
        config.token_with(env.map(String::from)),
        expected.map(String::from)
    );
}

#[test]
fn test_sync_config_conversion() {
    let mut config = Config::default();
    config.reconnect.max_attempts = 3;
    config.reconnect.base_delay_ms = 500;
    config.poll.vote_interval_ms = 7_000;

    let sync = config.sync_config();
    assert_eq!(sync.connection.url, config.gateway.url);
    assert_eq!(sync.connection.handshake_timeout, Duration::from_secs(10));
    assert_eq!(sync.max_attempts, 3);
    assert_eq!(sync.backoff.delay(0), Duration::from_millis(500));
    assert_eq!(sync.backoff.delay(1), Duration::from_millis(1_000));
    assert_eq!(sync.poll.vote, Duration::from_secs(7));
    assert_eq!(sync.poll.match_found, Duration::from_secs(3));
}

#[test]
fn test_default_path_location() {
    if let Ok(path) = default_path() {
        assert!(path.ends_with("moviematch/config.toml"));
    }
}
