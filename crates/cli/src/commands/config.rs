// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::path::Path;

use crate::cli::ConfigCommand;
use crate::config::{default_path, Config};
use crate::error::{Error, Result};

const REDACTED: &str = "<redacted>";

/// Execute a config subcommand.
pub fn run(cmd: ConfigCommand, explicit: Option<&Path>, out: &mut impl Write) -> Result<()> {
    match cmd {
        ConfigCommand::Show => run_show(explicit, out),
        ConfigCommand::Init { force } => {
            let path = match explicit {
                Some(path) => path.to_path_buf(),
                None => default_path()?,
            };
            run_init(&path, force, out)
        }
    }
}

/// Print the effective configuration as TOML with the token redacted.
fn run_show(explicit: Option<&Path>, out: &mut impl Write) -> Result<()> {
    let mut config = Config::resolve(explicit)?;
    if config.api.token.is_some() {
        config.api.token = Some(REDACTED.to_string());
    }
    let content = toml::to_string_pretty(&config)
        .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
    write!(out, "{}", content)?;
    Ok(())
}

fn run_init(path: &Path, force: bool, out: &mut impl Write) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::ConfigExists(path.display().to_string()));
    }
    Config::default().save(path)?;
    writeln!(out, "Wrote {}", path.display())?;
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
