// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Test helpers are shared across test binaries; not every binary uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// The `mm` binary with a clean credential environment.
pub fn mm() -> Command {
    let mut cmd = cargo_bin_cmd!("mm");
    cmd.env_remove("MOVIEMATCH_TOKEN").env_remove("RUST_LOG");
    cmd
}

/// A temp dir holding a config file with `content`.
pub fn config_file(content: &str) -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    (temp, path)
}
