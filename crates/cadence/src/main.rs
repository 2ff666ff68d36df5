// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cadence - a per-session music playback core.
//!
//! The binary validates and prints configuration. Playback itself runs
//! inside an embedding application through [`cadence::PlaybackService`].

use std::path::PathBuf;

use cadence::CadenceConfig;
use clap::{Parser, Subcommand};

/// Cadence - a per-session music playback core.
#[derive(Parser, Debug)]
#[command(name = "cadence", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the configuration and report every problem found.
    Check,
    /// Print the effective configuration as TOML.
    Config,
}

fn load(path: Option<&PathBuf>) -> CadenceConfig {
    let loaded = match path {
        Some(path) => cadence_config::load_and_validate_path(path),
        None => cadence_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            cadence_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let config = load(cli.config.as_ref());
    cadence::init_tracing(&config.player.log_level);

    match cli.command {
        Some(Commands::Check) => {
            tracing::debug!("configuration validated");
            println!("cadence: configuration OK");
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("cadence: cannot render configuration: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("cadence: use --help for available commands");
        }
    }
}
